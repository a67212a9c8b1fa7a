mod common;

use chargepark_admin::app::actions::{delete_row, submit, toggle_penalty};
use chargepark_admin::domain::forms::{PenaltyForm, StationForm, Submission};
use chargepark_admin::domain::model::{PenaltyStatus, StationStatus, Table};
use chargepark_admin::AdminError;
use common::store_for;
use httpmock::prelude::*;
use serde_json::json;

#[tokio::test]
async fn test_new_station_is_inserted() {
    let server = MockServer::start();
    let insert = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/v1/charging_stations")
            .json_body(json!([{
                "name": "North",
                "location": "Main St",
                "total_ports": 4,
                "available_ports": 4,
                "status": "active"
            }]));
        then.status(201);
    });

    let store = store_for(server.base_url());
    let form = StationForm::default()
        .with_name("North")
        .with_location("Main St")
        .with_ports(4, 4);
    submit(&store, Submission::new(None, form)).await.unwrap();

    insert.assert();
}

#[tokio::test]
async fn test_edit_patches_existing_row() {
    let server = MockServer::start();
    let patch = server.mock(|when, then| {
        when.method("PATCH")
            .path("/rest/v1/charging_stations")
            .query_param("id", "eq.3")
            .json_body_partial(r#"{"status": "maintenance"}"#);
        then.status(200).json_body(json!([{"id": 3}]));
    });

    let store = store_for(server.base_url());
    let form = StationForm::default()
        .with_name("North")
        .with_location("Main St")
        .with_ports(4, 0)
        .with_status(StationStatus::Maintenance);
    submit(&store, Submission::new(Some(3), form)).await.unwrap();

    patch.assert();
}

#[tokio::test]
async fn test_invalid_form_never_reaches_store() {
    let server = MockServer::start();
    let any = server.mock(|when, then| {
        when.path_contains("/rest/v1/");
        then.status(201);
    });

    let store = store_for(server.base_url());
    let form = PenaltyForm::default()
        .with_reservation(1)
        .with_reason("Overstay")
        .with_amount("-5");
    let err = submit(&store, Submission::new(None, form)).await.unwrap_err();

    assert!(matches!(err, AdminError::ValidationError { ref field, .. } if field == "amount"));
    any.assert_hits(0);
}

#[tokio::test]
async fn test_toggle_penalty_flips_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/penalties");
        then.status(200).json_body(json!([
            {"id": 1, "amount": "10", "status": "paid"},
            {"id": 2, "amount": "5", "status": "unpaid"}
        ]));
    });
    let patch = server.mock(|when, then| {
        when.method("PATCH")
            .path("/rest/v1/penalties")
            .query_param("id", "eq.2")
            .json_body(json!({"status": "paid"}));
        then.status(200).json_body(json!([{"id": 2, "status": "paid"}]));
    });

    let store = store_for(server.base_url());
    let status = toggle_penalty(&store, 2).await.unwrap();

    patch.assert();
    assert_eq!(status, PenaltyStatus::Paid);
}

#[tokio::test]
async fn test_toggle_finds_row_beyond_first_page() {
    let server = MockServer::start();
    // 只有帶 id 篩選的查詢會得到這一筆；未篩選的請求不會命中任何 mock
    let filtered = server.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/penalties")
            .query_param("id", "eq.1500")
            .query_param("limit", "1");
        then.status(200)
            .json_body(json!([{"id": 1500, "amount": "20", "status": "unpaid"}]));
    });
    let patch = server.mock(|when, then| {
        when.method("PATCH")
            .path("/rest/v1/penalties")
            .query_param("id", "eq.1500");
        then.status(200).json_body(json!([{"id": 1500, "status": "paid"}]));
    });

    let store = store_for(server.base_url());
    let status = toggle_penalty(&store, 1500).await.unwrap();

    filtered.assert();
    patch.assert();
    assert_eq!(status, PenaltyStatus::Paid);
}

#[tokio::test]
async fn test_toggle_of_unknown_penalty_is_not_found() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/penalties");
        then.status(200).json_body(json!([]));
    });

    let store = store_for(server.base_url());
    let err = toggle_penalty(&store, 99).await.unwrap_err();
    assert!(matches!(err, AdminError::NotFound { id: 99, .. }));
}

#[tokio::test]
async fn test_delete_missing_row_is_not_found() {
    let server = MockServer::start();
    let delete = server.mock(|when, then| {
        when.method(DELETE)
            .path("/rest/v1/parking_lots")
            .query_param("id", "eq.5");
        then.status(200).json_body(json!([]));
    });

    let store = store_for(server.base_url());
    let err = delete_row(&store, Table::ParkingLots, 5).await.unwrap_err();

    delete.assert();
    assert!(matches!(err, AdminError::NotFound { id: 5, .. }));
}
