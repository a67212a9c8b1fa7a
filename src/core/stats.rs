//! Sums, counts and ratios over table snapshots.
//!
//! Every function here is total: empty input, absent fields and zero denominators all
//! produce a value instead of an error.

use crate::domain::model::{ParkingLot, Penalty, PenaltyStatus, Reservation, Station};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CapacityTotals {
    pub total: u64,
    pub available: u64,
}

impl CapacityTotals {
    pub fn occupancy_rate(&self) -> f64 {
        occupancy_rate(self.total, self.available)
    }
}

pub fn capacity_totals(stations: &[Station]) -> CapacityTotals {
    stations
        .iter()
        .fold(CapacityTotals::default(), |acc, station| CapacityTotals {
            total: acc.total + u64::from(station.total_ports.unwrap_or(0)),
            available: acc.available + u64::from(station.available_ports.unwrap_or(0)),
        })
}

pub fn parking_totals(lots: &[ParkingLot]) -> CapacityTotals {
    lots.iter()
        .fold(CapacityTotals::default(), |acc, lot| CapacityTotals {
            total: acc.total + u64::from(lot.total_spaces.unwrap_or(0)),
            available: acc.available + u64::from(lot.available_spaces.unwrap_or(0)),
        })
}

/// 使用中容量百分比，取到小數點後一位；總容量為 0 時回傳 0
pub fn occupancy_rate(total: u64, available: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let in_use = total.saturating_sub(available) as f64;
    round_to(in_use / total as f64 * 100.0, 1)
}

/// 停車場卡片上的剩餘比例，限制在 [0, 100]
pub fn availability_percent(total: u32, available: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (f64::from(available) / f64::from(total) * 100.0).clamp(0.0, 100.0)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub trait HasStatus {
    fn status(&self) -> Option<&str>;
}

impl HasStatus for Reservation {
    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

impl HasStatus for Penalty {
    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

impl HasStatus for Station {
    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

/// Exact, case-sensitive match on the status column. Rows without a status never match.
pub fn count_by_status<T: HasStatus>(rows: &[T], status: &str) -> usize {
    rows.iter()
        .filter(|row| row.status() == Some(status))
        .count()
}

/// 解析金額字串；空值、非數字或非有限值一律視為 0
pub fn parse_amount(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|amount| amount.is_finite())
        .unwrap_or(0.0)
}

pub fn total_amount(penalties: &[Penalty]) -> f64 {
    penalties
        .iter()
        .map(|p| parse_amount(p.amount.as_deref()))
        .sum()
}

pub fn total_amount_by_status(penalties: &[Penalty], status: &str) -> f64 {
    penalties
        .iter()
        .filter(|p| p.status() == Some(status))
        .map(|p| parse_amount(p.amount.as_deref()))
        .sum()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PenaltySummary {
    pub total: f64,
    pub paid: f64,
    pub unpaid: f64,
}

impl PenaltySummary {
    pub fn from_penalties(penalties: &[Penalty]) -> Self {
        Self {
            total: total_amount(penalties),
            paid: total_amount_by_status(penalties, PenaltyStatus::Paid.as_str()),
            unpaid: total_amount_by_status(penalties, PenaltyStatus::Unpaid.as_str()),
        }
    }
}

pub fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}
