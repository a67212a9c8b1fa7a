use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// 資料表主鍵。所有資料表統一使用 bigint `id` 欄位
pub type RowId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    ChargingStations,
    ParkingLots,
    Reservations,
    Penalties,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::ChargingStations => "charging_stations",
            Table::ParkingLots => "parking_lots",
            Table::Reservations => "reservations",
            Table::Penalties => "penalties",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RowId,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: RowId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub total_ports: Option<u32>,
    #[serde(default)]
    pub available_ports: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingLot {
    pub id: RowId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub total_spaces: Option<u32>,
    #[serde(default)]
    pub available_spaces: Option<u32>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
}

/// PostgREST 內嵌關聯只帶回 `name` 欄位，例如 `users(name)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: RowId,
    #[serde(default)]
    pub user_id: Option<RowId>,
    #[serde(default)]
    pub station_id: Option<RowId>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub slot_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub users: Option<NameRef>,
    #[serde(default, skip_serializing)]
    pub charging_stations: Option<NameRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyReservationRef {
    #[serde(default)]
    pub id: Option<RowId>,
    #[serde(default)]
    pub users: Option<NameRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    pub id: RowId,
    #[serde(default)]
    pub reservation_id: Option<RowId>,
    #[serde(default)]
    pub reason: Option<String>,
    /// 原樣保留金額字串，解析交給 `core::stats::parse_amount`
    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub reservations: Option<PenaltyReservationRef>,
}

impl Reservation {
    pub fn embedded_user_name(&self) -> Option<&str> {
        self.users.as_ref().and_then(|u| u.name.as_deref())
    }

    pub fn embedded_station_name(&self) -> Option<&str> {
        self.charging_stations
            .as_ref()
            .and_then(|s| s.name.as_deref())
    }
}

impl Penalty {
    pub fn user_name(&self) -> Option<&str> {
        self.reservations
            .as_ref()
            .and_then(|r| r.users.as_ref())
            .and_then(|u| u.name.as_deref())
    }
}

macro_rules! status_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "unknown {} '{}', expected one of: {}",
                        stringify!($name),
                        other,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

status_enum!(StationStatus {
    Active => "active",
    Inactive => "inactive",
    Maintenance => "maintenance",
});

status_enum!(ReservationStatus {
    Active => "active",
    Completed => "completed",
    Cancelled => "cancelled",
});

status_enum!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
});

status_enum!(PenaltyStatus {
    Unpaid => "unpaid",
    Paid => "paid",
});

impl PenaltyStatus {
    pub fn toggled(self) -> Self {
        match self {
            PenaltyStatus::Paid => PenaltyStatus::Unpaid,
            PenaltyStatus::Unpaid => PenaltyStatus::Paid,
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// 接受 RFC 3339 (timestamptz) 與無時區的 timestamp，後者視為 UTC
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    let Some(raw) = value else {
        return Ok(None);
    };
    Ok(parse_timestamp(&raw))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
