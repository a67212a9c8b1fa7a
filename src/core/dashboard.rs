use crate::core::stats::{capacity_totals, count_by_status, CapacityTotals, PenaltySummary};
use crate::domain::model::{ParkingLot, Penalty, Reservation, ReservationStatus, Station};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;

pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// The tables one dashboard render works from.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub stations: Vec<Station>,
    pub parking_lots: Vec<ParkingLot>,
    pub reservations: Vec<Reservation>,
    pub penalties: Vec<Penalty>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub station_count: usize,
    pub parking_lot_count: usize,
    pub reservation_count: usize,
    pub active_reservation_count: usize,
    pub penalty_count: usize,
    pub capacity: CapacityTotals,
    pub occupancy_rate: f64,
    pub penalties: PenaltySummary,
}

impl DashboardSummary {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let capacity = capacity_totals(&snapshot.stations);
        Self {
            station_count: snapshot.stations.len(),
            parking_lot_count: snapshot.parking_lots.len(),
            reservation_count: snapshot.reservations.len(),
            active_reservation_count: count_by_status(
                &snapshot.reservations,
                ReservationStatus::Active.as_str(),
            ),
            penalty_count: snapshot.penalties.len(),
            capacity,
            occupancy_rate: capacity.occupancy_rate(),
            penalties: PenaltySummary::from_penalties(&snapshot.penalties),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub reservation_id: i64,
    pub user_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ActivityEntry {
    pub fn message(&self) -> String {
        format!(
            "{} made a reservation.",
            self.user_name.as_deref().unwrap_or("N/A")
        )
    }
}

/// 最新的 `limit` 筆預約，依建立時間由新到舊；沒有時間戳記的排在最後
pub fn recent_activity(reservations: &[Reservation], limit: usize) -> Vec<ActivityEntry> {
    let mut ordered: Vec<&Reservation> = reservations.iter().collect();
    // Option 排序時 None 最小，Reverse 之後就排到最後
    ordered.sort_by_key(|r| Reverse(r.created_at));
    ordered
        .into_iter()
        .take(limit)
        .map(|r| ActivityEntry {
            reservation_id: r.id,
            user_name: r.embedded_user_name().map(str::to_string),
            created_at: r.created_at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::NameRef;
    use chrono::{Duration, TimeZone};

    fn reservation(id: i64, created_at: Option<DateTime<Utc>>, status: &str) -> Reservation {
        Reservation {
            id,
            user_id: None,
            station_id: None,
            slot_number: None,
            start_time: None,
            end_time: None,
            status: Some(status.to_string()),
            payment_status: None,
            created_at,
            users: Some(NameRef {
                name: Some(format!("user{}", id)),
            }),
            charging_stations: None,
        }
    }

    #[test]
    fn test_recent_activity_newest_first_and_limited() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let reservations: Vec<Reservation> = (1..=7)
            .map(|i| reservation(i, Some(base + Duration::hours(i)), "active"))
            .chain(std::iter::once(reservation(99, None, "active")))
            .collect();

        let recent = recent_activity(&reservations, RECENT_ACTIVITY_LIMIT);
        let ids: Vec<i64> = recent.iter().map(|e| e.reservation_id).collect();

        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
        assert_eq!(recent[0].message(), "user7 made a reservation.");
    }

    #[test]
    fn test_undated_reservations_sort_last() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let reservations = vec![reservation(1, None, "active"), reservation(2, Some(base), "active")];
        let ids: Vec<i64> = recent_activity(&reservations, 5)
            .iter()
            .map(|e| e.reservation_id)
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_summary_from_empty_snapshot() {
        let summary = DashboardSummary::from_snapshot(&Snapshot::default());
        assert_eq!(summary.station_count, 0);
        assert_eq!(summary.occupancy_rate, 0.0);
        assert_eq!(summary.penalties.total, 0.0);
    }

    #[test]
    fn test_summary_counts_active_reservations() {
        let snapshot = Snapshot {
            reservations: vec![
                reservation(1, None, "active"),
                reservation(2, None, "completed"),
                reservation(3, None, "active"),
            ],
            ..Snapshot::default()
        };
        let summary = DashboardSummary::from_snapshot(&snapshot);
        assert_eq!(summary.reservation_count, 3);
        assert_eq!(summary.active_reservation_count, 2);
    }
}
