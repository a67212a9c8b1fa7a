use crate::app::pages::{
    AnalyticsView, DashboardView, ParkingView, PenaltiesView, ReservationsView, StationsView,
};
use crate::core::busyness::{format_percentage, StationUsage};
use crate::core::stats::{availability_percent, format_currency, parse_amount};
use crate::utils::error::Result;
use chrono::{DateTime, Local, Utc};
use std::fmt::Write as _;
use std::path::Path;

const BAR_WIDTH: usize = 40;
const NA: &str = "N/A";

fn local_time(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| NA.to_string())
}

fn text(value: Option<&str>) -> &str {
    value.unwrap_or(NA)
}

fn bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn render_dashboard(view: &DashboardView) -> String {
    let s = &view.summary;
    let mut out = String::new();
    let _ = writeln!(out, "== Dashboard ==");
    let _ = writeln!(out, "Total Charging Stations : {}", s.station_count);
    let _ = writeln!(out, "Total Parking Lots      : {}", s.parking_lot_count);
    let _ = writeln!(
        out,
        "Active Reservations     : {} (of {})",
        s.active_reservation_count, s.reservation_count
    );
    let _ = writeln!(out, "Total Penalties         : {}", s.penalty_count);
    let _ = writeln!(
        out,
        "Charging Ports          : {} / {} available, occupancy {:.1}%",
        s.capacity.available, s.capacity.total, s.occupancy_rate
    );
    let _ = writeln!(
        out,
        "Penalty Amounts         : total {}, paid {}, unpaid {}",
        format_currency(s.penalties.total),
        format_currency(s.penalties.paid),
        format_currency(s.penalties.unpaid)
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "-- Recent Activity --");
    if view.recent.is_empty() {
        let _ = writeln!(out, "No recent activity");
    }
    for entry in &view.recent {
        let _ = writeln!(out, "{:<40} {}", entry.message(), local_time(entry.created_at));
    }
    out
}

pub fn render_stations(view: &StationsView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Charging Stations ==");
    if view.stations.is_empty() {
        let _ = writeln!(out, "No stations found");
        return out;
    }
    for station in &view.stations {
        let _ = writeln!(
            out,
            "[{}] {} ({}) - {}",
            station.id,
            text(station.name.as_deref()),
            text(station.location.as_deref()),
            text(station.status.as_deref())
        );
        let _ = writeln!(
            out,
            "     {} / {} ports available",
            station.available_ports.unwrap_or(0),
            station.total_ports.unwrap_or(0)
        );
    }
    let _ = writeln!(
        out,
        "Total: {} / {} ports available, occupancy {:.1}%",
        view.capacity.available, view.capacity.total, view.occupancy_rate
    );
    out
}

pub fn render_parking(view: &ParkingView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Parking Lots ==");
    if view.lots.is_empty() {
        let _ = writeln!(out, "No parking lots found");
        return out;
    }
    for lot in &view.lots {
        let total = lot.total_spaces.unwrap_or(0);
        let available = lot.available_spaces.unwrap_or(0);
        let _ = writeln!(
            out,
            "[{}] {} ({}) - {}/hr",
            lot.id,
            text(lot.name.as_deref()),
            text(lot.location.as_deref()),
            format_currency(lot.hourly_rate.unwrap_or(0.0))
        );
        let _ = writeln!(
            out,
            "     {} / {} spaces available {}",
            available,
            total,
            bar(availability_percent(total, available), 20)
        );
    }
    let _ = writeln!(
        out,
        "Total: {} / {} spaces available",
        view.spaces.available, view.spaces.total
    );
    out
}

pub fn render_reservations(view: &ReservationsView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Reservations ==");
    if !view.search.is_empty() {
        let _ = writeln!(out, "Search: \"{}\"", view.search);
    }
    let rows = view.visible();
    if rows.is_empty() {
        let _ = writeln!(out, "No reservations found");
        return out;
    }
    let _ = writeln!(
        out,
        "{:<6} {:<16} {:<16} {:<6} {:<17} {:<17} {:<10} {:<8}",
        "ID", "User", "Station", "Slot", "Start Time", "End Time", "Status", "Payment"
    );
    for row in rows {
        let r = &row.reservation;
        let _ = writeln!(
            out,
            "{:<6} {:<16} {:<16} {:<6} {:<17} {:<17} {:<10} {:<8}",
            r.id,
            text(row.user_name.as_deref()),
            text(row.station_name.as_deref()),
            text(r.slot_number.as_deref()),
            local_time(r.start_time),
            local_time(r.end_time),
            text(r.status.as_deref()),
            text(r.payment_status.as_deref())
        );
    }
    out
}

pub fn render_penalties(view: &PenaltiesView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Penalties ==");
    let _ = writeln!(
        out,
        "Total {} | Paid {} | Unpaid {} ({} open)",
        format_currency(view.summary.total),
        format_currency(view.summary.paid),
        format_currency(view.summary.unpaid),
        view.unpaid_count
    );
    if view.penalties.is_empty() {
        let _ = writeln!(out, "No penalties found");
        return out;
    }
    for penalty in &view.penalties {
        let _ = writeln!(
            out,
            "[{}] {:<10} {:<8} reservation {} ({}) - {} [{}]",
            penalty.id,
            format_currency(parse_amount(penalty.amount.as_deref())),
            text(penalty.status.as_deref()),
            penalty
                .reservation_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| NA.to_string()),
            text(penalty.user_name()),
            text(penalty.reason.as_deref()),
            local_time(penalty.created_at)
        );
    }
    out
}

pub fn render_analytics(view: &AnalyticsView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "== Station Busyness (Last {} Days, source: {:?}) ==",
        view.window_days, view.source
    );
    if view.rows.is_empty() {
        let _ = writeln!(out, "No station usage data");
        return out;
    }
    let name_width = view
        .rows
        .iter()
        .map(|r| r.station_name.chars().count())
        .max()
        .unwrap_or(0)
        .max(12);
    for row in &view.rows {
        let _ = writeln!(
            out,
            "{:<width$} {} {}",
            row.station_name,
            bar(row.busyness_percentage_last_30_days, BAR_WIDTH),
            format_percentage(row.busyness_percentage_last_30_days),
            width = name_width
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<width$} {:>16} {:>16} {:>10}",
        "Station Name",
        "Total Usage (h)",
        "Last Window (h)",
        "Busyness",
        width = name_width
    );
    for row in &view.rows {
        let _ = writeln!(
            out,
            "{:<width$} {:>16.2} {:>16.2} {:>10}",
            row.station_name,
            row.total_usage_hours,
            row.usage_hours_last_30_days,
            format_percentage(row.busyness_percentage_last_30_days),
            width = name_width
        );
    }
    out
}

/// 將分析表格匯出為 CSV
pub fn write_analytics_csv<P: AsRef<Path>>(path: P, rows: &[StationUsage]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::AnalyticsSource;
    use crate::core::dashboard::{DashboardSummary, Snapshot};
    use crate::core::search::ReservationRow;
    use crate::domain::model::{NameRef, Reservation};

    fn usage(name: &str, busyness: f64) -> StationUsage {
        StationUsage {
            station_id: 1,
            station_name: name.to_string(),
            total_usage_hours: 12.0,
            usage_hours_last_30_days: 6.0,
            busyness_percentage_last_30_days: busyness,
        }
    }

    #[test]
    fn test_bar_width_is_constant() {
        assert_eq!(bar(0.0, 10).chars().count(), 10);
        assert_eq!(bar(250.0, 10), "█".repeat(10));
        assert_eq!(bar(50.0, 10), format!("{}{}", "█".repeat(5), "░".repeat(5)));
    }

    #[test]
    fn test_render_empty_dashboard() {
        let view = DashboardView {
            summary: DashboardSummary::from_snapshot(&Snapshot::default()),
            recent: vec![],
        };
        let rendered = render_dashboard(&view);
        assert!(rendered.contains("Total Charging Stations : 0"));
        assert!(rendered.contains("No recent activity"));
    }

    #[test]
    fn test_render_reservations_applies_search() {
        let reservation = |id, user: &str, status: &str| Reservation {
            id,
            user_id: None,
            station_id: None,
            slot_number: Some("A1".to_string()),
            start_time: None,
            end_time: None,
            status: Some(status.to_string()),
            payment_status: Some("pending".to_string()),
            created_at: None,
            users: Some(NameRef {
                name: Some(user.to_string()),
            }),
            charging_stations: None,
        };
        let view = ReservationsView {
            rows: ReservationRow::decorate(
                vec![reservation(1, "Alice", "active"), reservation(2, "Bob", "completed")],
                &[],
                &[],
            ),
            search: "bob".to_string(),
        };

        let rendered = render_reservations(&view);
        assert!(rendered.contains("Bob"));
        assert!(!rendered.contains("Alice"));
    }

    #[test]
    fn test_render_analytics_shows_percentages() {
        let view = AnalyticsView {
            rows: vec![usage("North", 42.5)],
            source: AnalyticsSource::Local,
            window_days: 30,
        };
        let rendered = render_analytics(&view);
        assert!(rendered.contains("Last 30 Days"));
        assert!(rendered.contains("42.50%"));
    }

    #[test]
    fn test_write_analytics_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.csv");
        write_analytics_csv(&path, &[usage("North", 10.0)]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("station_id,station_name,total_usage_hours,usage_hours_last_30_days,busyness_percentage_last_30_days")
        );
        assert_eq!(lines.next(), Some("1,North,12.0,6.0,10.0"));
    }
}
