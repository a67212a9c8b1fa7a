//! Aggregation engine: pure functions from table snapshots to display values.

pub mod busyness;
pub mod dashboard;
pub mod search;
pub mod stats;

pub use busyness::{compute_station_usage, sort_by_busyness, StationUsage};
pub use dashboard::{recent_activity, DashboardSummary, Snapshot};
pub use search::{filter_reservations, ReservationRow};
pub use stats::{
    capacity_totals, count_by_status, occupancy_rate, total_amount_by_status, CapacityTotals,
    PenaltySummary,
};
