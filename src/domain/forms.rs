//! Editable view-models for the create/edit dialogs.
//!
//! A form is an immutable value: every `with_*` call returns a new form, and a finished form
//! is turned into a [`Submission`] that the page hands to the data store.

use crate::domain::model::{
    ParkingLot, PaymentStatus, Penalty, PenaltyStatus, Reservation, ReservationStatus, RowId,
    Station, StationStatus, Table,
};
use crate::utils::error::{AdminError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, Validate};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// 送出表單：沒有 id 就新增，有 id 就更新
#[derive(Debug, Clone, PartialEq)]
pub enum Submission<F> {
    Create(F),
    Update { id: RowId, form: F },
}

impl<F> Submission<F> {
    pub fn new(editing: Option<RowId>, form: F) -> Self {
        match editing {
            Some(id) => Submission::Update { id, form },
            None => Submission::Create(form),
        }
    }

    pub fn form(&self) -> &F {
        match self {
            Submission::Create(form) | Submission::Update { form, .. } => form,
        }
    }
}

pub trait Form: Validate + Serialize {
    const TABLE: Table;

    fn to_row(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationForm {
    pub name: String,
    pub location: String,
    pub total_ports: u32,
    pub available_ports: u32,
    pub status: StationStatus,
}

impl Default for StationForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            location: String::new(),
            total_ports: 0,
            available_ports: 0,
            status: StationStatus::Active,
        }
    }
}

impl StationForm {
    pub fn from_station(station: &Station) -> Self {
        Self {
            name: station.name.clone().unwrap_or_default(),
            location: station.location.clone().unwrap_or_default(),
            total_ports: station.total_ports.unwrap_or(0),
            available_ports: station.available_ports.unwrap_or(0),
            status: station
                .status
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(StationStatus::Active),
        }
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    pub fn with_location(self, location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..self
        }
    }

    pub fn with_ports(self, total_ports: u32, available_ports: u32) -> Self {
        Self {
            total_ports,
            available_ports,
            ..self
        }
    }

    pub fn with_status(self, status: StationStatus) -> Self {
        Self { status, ..self }
    }
}

impl Validate for StationForm {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("name", &self.name)?;
        validate_non_empty_string("location", &self.location)?;
        validate_range("available_ports", self.available_ports, 0, self.total_ports)
    }
}

impl Form for StationForm {
    const TABLE: Table = Table::ChargingStations;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParkingLotForm {
    pub name: String,
    pub location: String,
    pub total_spaces: u32,
    pub available_spaces: u32,
    pub hourly_rate: f64,
}

impl ParkingLotForm {
    pub fn from_lot(lot: &ParkingLot) -> Self {
        Self {
            name: lot.name.clone().unwrap_or_default(),
            location: lot.location.clone().unwrap_or_default(),
            total_spaces: lot.total_spaces.unwrap_or(0),
            available_spaces: lot.available_spaces.unwrap_or(0),
            hourly_rate: lot.hourly_rate.unwrap_or(0.0),
        }
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    pub fn with_location(self, location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..self
        }
    }

    pub fn with_spaces(self, total_spaces: u32, available_spaces: u32) -> Self {
        Self {
            total_spaces,
            available_spaces,
            ..self
        }
    }

    pub fn with_hourly_rate(self, hourly_rate: f64) -> Self {
        Self {
            hourly_rate,
            ..self
        }
    }
}

impl Validate for ParkingLotForm {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("name", &self.name)?;
        validate_non_empty_string("location", &self.location)?;
        validate_range("available_spaces", self.available_spaces, 0, self.total_spaces)?;
        if !self.hourly_rate.is_finite() || self.hourly_rate < 0.0 {
            return Err(AdminError::validation(
                "hourly_rate",
                "must be a non-negative amount",
            ));
        }
        Ok(())
    }
}

impl Form for ParkingLotForm {
    const TABLE: Table = Table::ParkingLots;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationForm {
    pub user_id: Option<RowId>,
    pub station_id: Option<RowId>,
    pub slot_number: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: ReservationStatus,
    pub payment_status: PaymentStatus,
}

impl Default for ReservationForm {
    fn default() -> Self {
        Self {
            user_id: None,
            station_id: None,
            slot_number: String::new(),
            start_time: None,
            end_time: None,
            status: ReservationStatus::Active,
            payment_status: PaymentStatus::Pending,
        }
    }
}

impl ReservationForm {
    pub fn from_reservation(reservation: &Reservation) -> Self {
        let defaults = Self::default();
        Self {
            user_id: reservation.user_id,
            station_id: reservation.station_id,
            slot_number: reservation.slot_number.clone().unwrap_or_default(),
            start_time: reservation.start_time,
            end_time: reservation.end_time,
            status: reservation
                .status
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.status),
            payment_status: reservation
                .payment_status
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.payment_status),
        }
    }

    pub fn with_parties(self, user_id: RowId, station_id: RowId) -> Self {
        Self {
            user_id: Some(user_id),
            station_id: Some(station_id),
            ..self
        }
    }

    pub fn with_slot(self, slot_number: impl Into<String>) -> Self {
        Self {
            slot_number: slot_number.into(),
            ..self
        }
    }

    pub fn with_interval(self, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            start_time: Some(start_time),
            end_time: Some(end_time),
            ..self
        }
    }

    pub fn with_status(self, status: ReservationStatus) -> Self {
        Self { status, ..self }
    }

    pub fn with_payment_status(self, payment_status: PaymentStatus) -> Self {
        Self {
            payment_status,
            ..self
        }
    }
}

impl Validate for ReservationForm {
    fn validate(&self) -> Result<()> {
        if self.user_id.is_none() {
            return Err(AdminError::validation("user_id", "a user must be selected"));
        }
        if self.station_id.is_none() {
            return Err(AdminError::validation("station_id", "a station must be selected"));
        }
        validate_non_empty_string("slot_number", &self.slot_number)?;
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if start < end => Ok(()),
            (Some(_), Some(_)) => Err(AdminError::validation(
                "end_time",
                "end time must be after start time",
            )),
            (None, _) => Err(AdminError::validation("start_time", "start time is required")),
            (_, None) => Err(AdminError::validation("end_time", "end time is required")),
        }
    }
}

impl Form for ReservationForm {
    const TABLE: Table = Table::Reservations;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PenaltyForm {
    pub reservation_id: Option<RowId>,
    pub reason: String,
    /// 以字串保存，與資料庫 numeric 欄位往返時不損失精度
    pub amount: String,
    pub status: PenaltyStatus,
}

impl Default for PenaltyForm {
    fn default() -> Self {
        Self {
            reservation_id: None,
            reason: String::new(),
            amount: "0".to_string(),
            status: PenaltyStatus::Unpaid,
        }
    }
}

impl PenaltyForm {
    pub fn from_penalty(penalty: &Penalty) -> Self {
        Self {
            reservation_id: penalty.reservation_id,
            reason: penalty.reason.clone().unwrap_or_default(),
            amount: penalty.amount.clone().unwrap_or_else(|| "0".to_string()),
            status: penalty
                .status
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(PenaltyStatus::Unpaid),
        }
    }

    pub fn with_reservation(self, reservation_id: RowId) -> Self {
        Self {
            reservation_id: Some(reservation_id),
            ..self
        }
    }

    pub fn with_reason(self, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            ..self
        }
    }

    pub fn with_amount(self, amount: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            ..self
        }
    }

    pub fn with_status(self, status: PenaltyStatus) -> Self {
        Self { status, ..self }
    }
}

impl Validate for PenaltyForm {
    fn validate(&self) -> Result<()> {
        if self.reservation_id.is_none() {
            return Err(AdminError::validation(
                "reservation_id",
                "a reservation must be selected",
            ));
        }
        validate_non_empty_string("reason", &self.reason)?;
        match self.amount.trim().parse::<f64>() {
            Ok(amount) if amount.is_finite() && amount >= 0.0 => Ok(()),
            _ => Err(AdminError::validation(
                "amount",
                format!("'{}' is not a non-negative decimal amount", self.amount),
            )),
        }
    }
}

impl Form for PenaltyForm {
    const TABLE: Table = Table::Penalties;
}

/// 切換罰款狀態 (paid <-> unpaid)；未知狀態視為 unpaid
pub fn next_penalty_status(penalty: &Penalty) -> PenaltyStatus {
    penalty
        .status
        .as_deref()
        .and_then(|s| s.parse::<PenaltyStatus>().ok())
        .unwrap_or(PenaltyStatus::Unpaid)
        .toggled()
}
