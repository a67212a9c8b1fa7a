//! Command dispatch for the CLI binary.

use crate::adapters::{PollingWatcher, RestStore};
use crate::app::actions::{delete_row, find_row, submit, toggle_penalty};
use crate::app::pages::{load_analytics, render_page, Page, PageOptions};
use crate::app::render::{render_analytics, write_analytics_csv};
use crate::app::watch::watch_page;
use crate::config::cli::{
    Command, ParkingAction, ParkingArgs, PenaltyAction, PenaltyArgs, ReservationAction,
    ReservationArgs, StationAction, StationArgs,
};
use crate::config::toml_config::AdminConfig;
use crate::domain::forms::{
    Form, ParkingLotForm, PenaltyForm, ReservationForm, StationForm, Submission,
};
use crate::domain::model::{
    parse_timestamp, ParkingLot, Penalty, Reservation, RowId, Station, Table,
};
use crate::domain::ports::DataStore;
use crate::utils::error::{AdminError, Result};
use crate::utils::validation::validate_path;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// 執行一個子命令，輸出寫到 stdout
pub async fn run(command: Command, config: &AdminConfig) -> Result<()> {
    let store = Arc::new(RestStore::new(&config.store)?);
    let options = PageOptions::from_config(config);

    match command {
        Command::Dashboard => show(store.as_ref(), Page::Dashboard, &options).await,
        Command::Stations { action } => stations(store.as_ref(), action, &options).await,
        Command::Parking { action } => parking(store.as_ref(), action, &options).await,
        Command::Reservations { action } => reservations(store.as_ref(), action, options).await,
        Command::Penalties { action } => penalties(store.as_ref(), action, &options).await,
        Command::Analytics { csv, .. } => {
            let view = load_analytics(
                store.as_ref(),
                options.analytics_source,
                options.window_days,
                Utc::now(),
            )
            .await?;
            print!("{}", render_analytics(&view));
            if let Some(path) = csv {
                validate_path("csv", &path.to_string_lossy())?;
                write_analytics_csv(&path, &view.rows)?;
                tracing::info!("📁 Analytics exported to {}", path.display());
            }
            Ok(())
        }
        Command::Watch { page, search } => {
            let watcher = PollingWatcher::new(Arc::clone(&store), config.poll_interval());
            let options = options.with_search(search);
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!("Unable to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            };
            let renders = watch_page(store.as_ref(), &watcher, page, &options, shutdown, |frame| {
                // 清除畫面後重新繪製
                print!("\x1B[2J\x1B[H{}", frame);
            })
            .await?;
            tracing::info!("✅ Watch finished after {} renders", renders);
            Ok(())
        }
    }
}

async fn show<S: DataStore + ?Sized>(store: &S, page: Page, options: &PageOptions) -> Result<()> {
    print!("{}", render_page(store, page, options).await?);
    Ok(())
}

async fn save<F: Form, S: DataStore + ?Sized>(store: &S, id: Option<RowId>, form: F) -> Result<()> {
    submit(store, Submission::new(id, form)).await?;
    match id {
        Some(id) => println!("✅ Updated {} #{}", F::TABLE, id),
        None => println!("✅ Added a row to {}", F::TABLE),
    }
    Ok(())
}

async fn remove<S: DataStore + ?Sized>(store: &S, table: Table, id: RowId) -> Result<()> {
    delete_row(store, table, id).await?;
    println!("🗑️ Deleted {} #{}", table, id);
    Ok(())
}

fn apply_station_args(form: StationForm, args: StationArgs) -> StationForm {
    let mut form = form;
    if let Some(name) = args.name {
        form = form.with_name(name);
    }
    if let Some(location) = args.location {
        form = form.with_location(location);
    }
    if args.total_ports.is_some() || args.available_ports.is_some() {
        let total = args.total_ports.unwrap_or(form.total_ports);
        let available = args.available_ports.unwrap_or(form.available_ports);
        form = form.with_ports(total, available);
    }
    if let Some(status) = args.status {
        form = form.with_status(status);
    }
    form
}

async fn stations<S: DataStore + ?Sized>(
    store: &S,
    action: StationAction,
    options: &PageOptions,
) -> Result<()> {
    match action {
        StationAction::List => show(store, Page::Stations, options).await,
        StationAction::Add(args) => save(store, None, apply_station_args(StationForm::default(), args)).await,
        StationAction::Update { id, fields } => {
            let current: Station = find_row(store, Table::ChargingStations, id).await?;
            let form = apply_station_args(StationForm::from_station(&current), fields);
            save(store, Some(id), form).await
        }
        StationAction::Delete { id } => remove(store, Table::ChargingStations, id).await,
    }
}

fn apply_parking_args(form: ParkingLotForm, args: ParkingArgs) -> ParkingLotForm {
    let mut form = form;
    if let Some(name) = args.name {
        form = form.with_name(name);
    }
    if let Some(location) = args.location {
        form = form.with_location(location);
    }
    if args.total_spaces.is_some() || args.available_spaces.is_some() {
        let total = args.total_spaces.unwrap_or(form.total_spaces);
        let available = args.available_spaces.unwrap_or(form.available_spaces);
        form = form.with_spaces(total, available);
    }
    if let Some(rate) = args.hourly_rate {
        form = form.with_hourly_rate(rate);
    }
    form
}

async fn parking<S: DataStore + ?Sized>(
    store: &S,
    action: ParkingAction,
    options: &PageOptions,
) -> Result<()> {
    match action {
        ParkingAction::List => show(store, Page::Parking, options).await,
        ParkingAction::Add(args) => {
            save(store, None, apply_parking_args(ParkingLotForm::default(), args)).await
        }
        ParkingAction::Update { id, fields } => {
            let current: ParkingLot = find_row(store, Table::ParkingLots, id).await?;
            let form = apply_parking_args(ParkingLotForm::from_lot(&current), fields);
            save(store, Some(id), form).await
        }
        ParkingAction::Delete { id } => remove(store, Table::ParkingLots, id).await,
    }
}

fn parse_time_arg(field: &str, value: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(value).ok_or_else(|| {
        AdminError::validation(field, format!("'{}' is not a valid timestamp", value))
    })
}

fn apply_reservation_args(form: ReservationForm, args: ReservationArgs) -> Result<ReservationForm> {
    let mut form = form;
    if args.user_id.is_some() || args.station_id.is_some() {
        match (
            args.user_id.or(form.user_id),
            args.station_id.or(form.station_id),
        ) {
            (Some(user_id), Some(station_id)) => form = form.with_parties(user_id, station_id),
            (Some(user_id), None) => form.user_id = Some(user_id),
            (None, Some(station_id)) => form.station_id = Some(station_id),
            (None, None) => {}
        }
    }
    if let Some(slot) = args.slot {
        form = form.with_slot(slot);
    }
    let start = args
        .start
        .as_deref()
        .map(|s| parse_time_arg("start_time", s))
        .transpose()?;
    let end = args
        .end
        .as_deref()
        .map(|s| parse_time_arg("end_time", s))
        .transpose()?;
    if start.is_some() || end.is_some() {
        match (start.or(form.start_time), end.or(form.end_time)) {
            (Some(start), Some(end)) => form = form.with_interval(start, end),
            (start, end) => {
                form.start_time = start;
                form.end_time = end;
            }
        }
    }
    if let Some(status) = args.status {
        form = form.with_status(status);
    }
    if let Some(payment_status) = args.payment_status {
        form = form.with_payment_status(payment_status);
    }
    Ok(form)
}

async fn reservations<S: DataStore + ?Sized>(
    store: &S,
    action: ReservationAction,
    options: PageOptions,
) -> Result<()> {
    match action {
        ReservationAction::List { search } => {
            show(store, Page::Reservations, &options.with_search(search)).await
        }
        ReservationAction::Add(args) => {
            let form = apply_reservation_args(ReservationForm::default(), args)?;
            save(store, None, form).await
        }
        ReservationAction::Update { id, fields } => {
            let current: Reservation = find_row(store, Table::Reservations, id).await?;
            let form = apply_reservation_args(ReservationForm::from_reservation(&current), fields)?;
            save(store, Some(id), form).await
        }
        ReservationAction::Delete { id } => remove(store, Table::Reservations, id).await,
    }
}

fn apply_penalty_args(form: PenaltyForm, args: PenaltyArgs) -> PenaltyForm {
    let mut form = form;
    if let Some(reservation_id) = args.reservation_id {
        form = form.with_reservation(reservation_id);
    }
    if let Some(reason) = args.reason {
        form = form.with_reason(reason);
    }
    if let Some(amount) = args.amount {
        form = form.with_amount(amount);
    }
    if let Some(status) = args.status {
        form = form.with_status(status);
    }
    form
}

async fn penalties<S: DataStore + ?Sized>(
    store: &S,
    action: PenaltyAction,
    options: &PageOptions,
) -> Result<()> {
    match action {
        PenaltyAction::List => show(store, Page::Penalties, options).await,
        PenaltyAction::Add(args) => {
            save(store, None, apply_penalty_args(PenaltyForm::default(), args)).await
        }
        PenaltyAction::Update { id, fields } => {
            let current: Penalty = find_row(store, Table::Penalties, id).await?;
            let form = apply_penalty_args(PenaltyForm::from_penalty(&current), fields);
            save(store, Some(id), form).await
        }
        PenaltyAction::Toggle { id } => {
            let status = toggle_penalty(store, id).await?;
            println!("✅ Penalty #{} marked as {}", id, status);
            Ok(())
        }
        PenaltyAction::Delete { id } => remove(store, Table::Penalties, id).await,
    }
}
