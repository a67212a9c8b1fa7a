use crate::domain::model::{Reservation, RowId, Station, User};
use serde::Serialize;
use std::collections::HashMap;

/// A reservation decorated with the names the reservations table displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationRow {
    pub reservation: Reservation,
    pub user_name: Option<String>,
    pub station_name: Option<String>,
}

impl ReservationRow {
    /// 優先使用查詢內嵌的名稱，沒有的話再從使用者／充電站清單查找
    pub fn decorate(
        reservations: Vec<Reservation>,
        users: &[User],
        stations: &[Station],
    ) -> Vec<ReservationRow> {
        let user_names: HashMap<RowId, &str> = users
            .iter()
            .filter_map(|u| u.name.as_deref().map(|name| (u.id, name)))
            .collect();
        let station_names: HashMap<RowId, &str> = stations
            .iter()
            .filter_map(|s| s.name.as_deref().map(|name| (s.id, name)))
            .collect();

        reservations
            .into_iter()
            .map(|reservation| {
                let user_name = reservation
                    .embedded_user_name()
                    .or_else(|| {
                        reservation
                            .user_id
                            .and_then(|id| user_names.get(&id).copied())
                    })
                    .map(str::to_string);
                let station_name = reservation
                    .embedded_station_name()
                    .or_else(|| {
                        reservation
                            .station_id
                            .and_then(|id| station_names.get(&id).copied())
                    })
                    .map(str::to_string);
                ReservationRow {
                    reservation,
                    user_name,
                    station_name,
                }
            })
            .collect()
    }

    fn matches(&self, needle: &str) -> bool {
        [
            self.user_name.as_deref(),
            self.station_name.as_deref(),
            self.reservation.status.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Case-insensitive substring search over user name, station name and status.
/// An empty search keeps every row, in order.
pub fn filter_reservations<'a>(rows: &'a [ReservationRow], search: &str) -> Vec<&'a ReservationRow> {
    let needle = search.to_lowercase();
    if needle.is_empty() {
        return rows.iter().collect();
    }
    rows.iter().filter(|row| row.matches(&needle)).collect()
}
