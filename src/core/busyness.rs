use crate::core::stats::round_to;
use crate::domain::model::{Reservation, ReservationStatus, RowId, Station};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// One row of the station analytics table, in the shape `get_station_analytics` returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationUsage {
    pub station_id: RowId,
    #[serde(default)]
    pub station_name: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_usage_hours: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub usage_hours_last_30_days: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub busyness_percentage_last_30_days: f64,
}

/// 計算每個充電站的使用時數與繁忙度
///
/// busyness% = 視窗內預約時數 / (充電埠數 × 天數 × 24) × 100，限制在 [0, 100]。
/// 已取消的預約不計入；缺少起訖時間或起訖顛倒的預約不計入。
pub fn compute_station_usage(
    stations: &[Station],
    reservations: &[Reservation],
    now: DateTime<Utc>,
    window_days: u32,
) -> Vec<StationUsage> {
    let window_start = now - Duration::days(i64::from(window_days));

    let mut totals: HashMap<RowId, (f64, f64)> = HashMap::new();
    for reservation in reservations {
        if reservation.status.as_deref() == Some(ReservationStatus::Cancelled.as_str()) {
            continue;
        }
        let (Some(station_id), Some(start), Some(end)) =
            (reservation.station_id, reservation.start_time, reservation.end_time)
        else {
            continue;
        };
        if end <= start {
            continue;
        }

        let entry = totals.entry(station_id).or_insert((0.0, 0.0));
        entry.0 += hours_between(start, end);
        entry.1 += overlap_hours(start, end, window_start, now);
    }

    stations
        .iter()
        .map(|station| {
            let (total_hours, window_hours) = totals.get(&station.id).copied().unwrap_or_default();
            let ports = station.total_ports.unwrap_or(0);
            StationUsage {
                station_id: station.id,
                station_name: station.name.clone().unwrap_or_default(),
                total_usage_hours: round_to(total_hours, 2),
                usage_hours_last_30_days: round_to(window_hours, 2),
                busyness_percentage_last_30_days: busyness_percentage(
                    window_hours,
                    ports,
                    window_days,
                ),
            }
        })
        .collect()
}

pub fn busyness_percentage(usage_hours: f64, ports: u32, window_days: u32) -> f64 {
    let capacity_hours = f64::from(ports) * f64::from(window_days) * 24.0;
    if capacity_hours <= 0.0 || !usage_hours.is_finite() {
        return 0.0;
    }
    round_to((usage_hours / capacity_hours * 100.0).clamp(0.0, 100.0), 2)
}

fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}

fn overlap_hours(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> f64 {
    let from = start.max(window_start);
    let to = end.min(window_end);
    if to <= from {
        0.0
    } else {
        hours_between(from, to)
    }
}

/// 依繁忙度由高到低排序，同分時依站名排序
pub fn sort_by_busyness(rows: &mut [StationUsage]) {
    rows.sort_by(|a, b| {
        b.busyness_percentage_last_30_days
            .partial_cmp(&a.busyness_percentage_last_30_days)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.station_name.cmp(&b.station_name))
    });
}

pub fn format_percentage(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}%", value)
    } else {
        "0.00%".to_string()
    }
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn station(id: RowId, name: &str, ports: Option<u32>) -> Station {
        Station {
            id,
            name: Some(name.to_string()),
            location: None,
            total_ports: ports,
            available_ports: ports,
            status: Some("active".to_string()),
        }
    }

    fn reservation(
        station_id: RowId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: &str,
    ) -> Reservation {
        Reservation {
            id: 1,
            user_id: Some(1),
            station_id: Some(station_id),
            slot_number: None,
            start_time: Some(start),
            end_time: Some(end),
            status: Some(status.to_string()),
            payment_status: None,
            created_at: None,
            users: None,
            charging_stations: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_busyness_for_one_port() {
        let stations = vec![station(1, "North", Some(1))];
        let start = now() - Duration::days(2);
        let reservations = vec![reservation(1, start, start + Duration::hours(72), "completed")];

        let usage = compute_station_usage(&stations, &reservations, now(), 30);

        // 72 小時中只有 48 小時落在 now 之前
        assert_eq!(usage[0].total_usage_hours, 72.0);
        assert_eq!(usage[0].usage_hours_last_30_days, 48.0);
        assert_eq!(usage[0].busyness_percentage_last_30_days, 6.67);
    }

    #[test]
    fn test_old_reservations_only_count_towards_total() {
        let stations = vec![station(1, "North", Some(2))];
        let start = now() - Duration::days(60);
        let reservations = vec![reservation(1, start, start + Duration::hours(10), "completed")];

        let usage = compute_station_usage(&stations, &reservations, now(), 30);
        assert_eq!(usage[0].total_usage_hours, 10.0);
        assert_eq!(usage[0].usage_hours_last_30_days, 0.0);
        assert_eq!(usage[0].busyness_percentage_last_30_days, 0.0);
    }

    #[test]
    fn test_busyness_is_clipped_and_zero_without_ports() {
        assert_eq!(busyness_percentage(10_000.0, 1, 30), 100.0);
        assert_eq!(busyness_percentage(5.0, 0, 30), 0.0);

        let stations = vec![station(1, "Empty", None)];
        let start = now() - Duration::days(1);
        let reservations = vec![reservation(1, start, now(), "active")];
        let usage = compute_station_usage(&stations, &reservations, now(), 30);
        assert_eq!(usage[0].busyness_percentage_last_30_days, 0.0);
        assert_eq!(usage[0].usage_hours_last_30_days, 24.0);
    }

    #[test]
    fn test_cancelled_and_inverted_reservations_are_ignored() {
        let stations = vec![station(1, "North", Some(1))];
        let start = now() - Duration::days(1);
        let reservations = vec![
            reservation(1, start, now(), "cancelled"),
            reservation(1, now(), start, "active"),
        ];
        let usage = compute_station_usage(&stations, &reservations, now(), 30);
        assert_eq!(usage[0].total_usage_hours, 0.0);
    }

    #[test]
    fn test_sort_and_format() {
        let mut rows = vec![
            StationUsage {
                station_id: 1,
                station_name: "B".to_string(),
                total_usage_hours: 0.0,
                usage_hours_last_30_days: 0.0,
                busyness_percentage_last_30_days: 10.0,
            },
            StationUsage {
                station_id: 2,
                station_name: "A".to_string(),
                total_usage_hours: 0.0,
                usage_hours_last_30_days: 0.0,
                busyness_percentage_last_30_days: 10.0,
            },
            StationUsage {
                station_id: 3,
                station_name: "C".to_string(),
                total_usage_hours: 0.0,
                usage_hours_last_30_days: 0.0,
                busyness_percentage_last_30_days: 55.5,
            },
        ];
        sort_by_busyness(&mut rows);

        let order: Vec<RowId> = rows.iter().map(|r| r.station_id).collect();
        assert_eq!(order, vec![3, 2, 1]);
        assert_eq!(format_percentage(rows[0].busyness_percentage_last_30_days), "55.50%");
    }

    #[test]
    fn test_rpc_rows_accept_numeric_strings() {
        let row: StationUsage = serde_json::from_value(serde_json::json!({
            "station_id": 4,
            "station_name": "Harbor",
            "total_usage_hours": "12.5",
            "usage_hours_last_30_days": 3,
            "busyness_percentage_last_30_days": null
        }))
        .unwrap();

        assert_eq!(row.total_usage_hours, 12.5);
        assert_eq!(row.usage_hours_last_30_days, 3.0);
        assert_eq!(row.busyness_percentage_last_30_days, 0.0);
    }
}
