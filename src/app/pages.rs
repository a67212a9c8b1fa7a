//! Page loaders: fetch the rows a screen needs and run the aggregation engine over them.

use crate::config::toml_config::{AdminConfig, AnalyticsSource};
use crate::core::busyness::{
    compute_station_usage, sort_by_busyness, StationUsage, DEFAULT_WINDOW_DAYS,
};
use crate::core::dashboard::{
    recent_activity, ActivityEntry, DashboardSummary, Snapshot, RECENT_ACTIVITY_LIMIT,
};
use crate::core::search::{filter_reservations, ReservationRow};
use crate::core::stats::{
    capacity_totals, count_by_status, parking_totals, CapacityTotals, PenaltySummary,
};
use crate::domain::model::{ParkingLot, Penalty, PenaltyStatus, Reservation, Station, Table, User};
use crate::domain::ports::{fetch_all, fetch_paged, DataStore, Direction, Query, PAGE_SIZE};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};

pub const STATION_ANALYTICS_RPC: &str = "get_station_analytics";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Page {
    Dashboard,
    Stations,
    Parking,
    Reservations,
    Penalties,
    Analytics,
}

impl Page {
    /// 頁面需要監看的資料表
    pub fn tables(&self) -> &'static [Table] {
        match self {
            Page::Dashboard => &[
                Table::ChargingStations,
                Table::ParkingLots,
                Table::Reservations,
                Table::Penalties,
            ],
            Page::Stations => &[Table::ChargingStations],
            Page::Parking => &[Table::ParkingLots],
            Page::Reservations => &[Table::Reservations],
            Page::Penalties => &[Table::Penalties],
            Page::Analytics => &[Table::ChargingStations, Table::Reservations],
        }
    }
}

/// Settings a page load depends on besides the store itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOptions {
    pub analytics_source: AnalyticsSource,
    pub window_days: u32,
    pub search: String,
}

impl PageOptions {
    pub fn from_config(config: &AdminConfig) -> Self {
        Self {
            analytics_source: config.analytics_source(),
            window_days: config.window_days(),
            search: String::new(),
        }
    }

    pub fn with_search(self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..self
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardView {
    pub summary: DashboardSummary,
    pub recent: Vec<ActivityEntry>,
}

#[derive(Debug, Clone)]
pub struct StationsView {
    pub stations: Vec<Station>,
    pub capacity: CapacityTotals,
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone)]
pub struct ParkingView {
    pub lots: Vec<ParkingLot>,
    pub spaces: CapacityTotals,
}

#[derive(Debug, Clone)]
pub struct ReservationsView {
    pub rows: Vec<ReservationRow>,
    pub search: String,
}

impl ReservationsView {
    pub fn visible(&self) -> Vec<&ReservationRow> {
        filter_reservations(&self.rows, &self.search)
    }
}

#[derive(Debug, Clone)]
pub struct PenaltiesView {
    pub penalties: Vec<Penalty>,
    pub summary: PenaltySummary,
    pub unpaid_count: usize,
}

#[derive(Debug, Clone)]
pub struct AnalyticsView {
    pub rows: Vec<StationUsage>,
    pub source: AnalyticsSource,
    /// 實際計算所用的天數；RPC 來源固定為伺服器端的 30 天
    pub window_days: u32,
}

fn stations_query() -> Query {
    Query::default().order_by("id", Direction::Ascending)
}

fn reservations_query() -> Query {
    Query::select("*,users(name),charging_stations(name)").order_by("id", Direction::Descending)
}

pub async fn load_dashboard<S: DataStore + ?Sized>(store: &S) -> Result<DashboardView> {
    let all = Query::default();
    let reservations_by_date =
        Query::select("*,users(name)").order_by("created_at", Direction::Descending);
    let (stations, parking_lots, reservations, penalties) = tokio::try_join!(
        fetch_all::<Station, S>(store, Table::ChargingStations, &all),
        fetch_all::<ParkingLot, S>(store, Table::ParkingLots, &all),
        fetch_all::<Reservation, S>(store, Table::Reservations, &reservations_by_date),
        fetch_all::<Penalty, S>(store, Table::Penalties, &all),
    )?;

    let snapshot = Snapshot {
        stations,
        parking_lots,
        reservations,
        penalties,
    };
    tracing::debug!(
        "Dashboard snapshot: {} stations, {} lots, {} reservations, {} penalties",
        snapshot.stations.len(),
        snapshot.parking_lots.len(),
        snapshot.reservations.len(),
        snapshot.penalties.len()
    );

    Ok(DashboardView {
        summary: DashboardSummary::from_snapshot(&snapshot),
        recent: recent_activity(&snapshot.reservations, RECENT_ACTIVITY_LIMIT),
    })
}

pub async fn load_stations<S: DataStore + ?Sized>(store: &S) -> Result<StationsView> {
    let stations: Vec<Station> = fetch_all(store, Table::ChargingStations, &stations_query()).await?;
    let capacity = capacity_totals(&stations);
    Ok(StationsView {
        occupancy_rate: capacity.occupancy_rate(),
        capacity,
        stations,
    })
}

pub async fn load_parking<S: DataStore + ?Sized>(store: &S) -> Result<ParkingView> {
    let query = Query::default().order_by("id", Direction::Ascending);
    let lots: Vec<ParkingLot> = fetch_all(store, Table::ParkingLots, &query).await?;
    Ok(ParkingView {
        spaces: parking_totals(&lots),
        lots,
    })
}

pub async fn load_reservations<S: DataStore + ?Sized>(
    store: &S,
    search: &str,
) -> Result<ReservationsView> {
    let reservations_query = reservations_query();
    let names = Query::select("id,name");
    let (reservations, users, stations) = tokio::try_join!(
        fetch_all::<Reservation, S>(store, Table::Reservations, &reservations_query),
        fetch_all::<User, S>(store, Table::Users, &names),
        fetch_all::<Station, S>(store, Table::ChargingStations, &names),
    )?;

    Ok(ReservationsView {
        rows: ReservationRow::decorate(reservations, &users, &stations),
        search: search.to_string(),
    })
}

pub async fn load_penalties<S: DataStore + ?Sized>(store: &S) -> Result<PenaltiesView> {
    let query = Query::select("*,reservations(id,users(name))")
        .order_by("created_at", Direction::Descending);
    let penalties: Vec<Penalty> = fetch_all(store, Table::Penalties, &query).await?;
    Ok(PenaltiesView {
        summary: PenaltySummary::from_penalties(&penalties),
        unpaid_count: count_by_status(&penalties, PenaltyStatus::Unpaid.as_str()),
        penalties,
    })
}

pub async fn load_analytics<S: DataStore + ?Sized>(
    store: &S,
    source: AnalyticsSource,
    window_days: u32,
    now: DateTime<Utc>,
) -> Result<AnalyticsView> {
    let (mut rows, window_days) = match source {
        AnalyticsSource::Rpc => {
            let value = store
                .rpc(STATION_ANALYTICS_RPC, serde_json::json!({}))
                .await?;
            // 函式沒有資料時可能回傳 null
            let rows = if value.is_null() {
                Vec::new()
            } else {
                serde_json::from_value::<Vec<StationUsage>>(value)?
            };
            // 伺服器端固定使用 30 天視窗
            (rows, DEFAULT_WINDOW_DAYS)
        }
        AnalyticsSource::Local => {
            let stations_query = stations_query();
            let reservations_query = Query::default().order_by("id", Direction::Ascending);
            let (stations, reservations) = tokio::try_join!(
                fetch_paged::<Station, S>(store, Table::ChargingStations, &stations_query, PAGE_SIZE),
                fetch_paged::<Reservation, S>(
                    store,
                    Table::Reservations,
                    &reservations_query,
                    PAGE_SIZE
                ),
            )?;
            let rows = compute_station_usage(&stations, &reservations, now, window_days);
            (rows, window_days)
        }
    };
    sort_by_busyness(&mut rows);

    Ok(AnalyticsView {
        rows,
        source,
        window_days,
    })
}

/// 載入並繪製整個頁面，供單次輸出與 watch 模式共用
pub async fn render_page<S: DataStore + ?Sized>(
    store: &S,
    page: Page,
    options: &PageOptions,
) -> Result<String> {
    use crate::app::render;

    let rendered = match page {
        Page::Dashboard => render::render_dashboard(&load_dashboard(store).await?),
        Page::Stations => render::render_stations(&load_stations(store).await?),
        Page::Parking => render::render_parking(&load_parking(store).await?),
        Page::Reservations => {
            render::render_reservations(&load_reservations(store, &options.search).await?)
        }
        Page::Penalties => render::render_penalties(&load_penalties(store).await?),
        Page::Analytics => {
            let view =
                load_analytics(store, options.analytics_source, options.window_days, Utc::now())
                    .await?;
            render::render_analytics(&view)
        }
    };
    Ok(rendered)
}
