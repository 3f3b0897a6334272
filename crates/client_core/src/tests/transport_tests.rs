use super::*;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde_json::json;
use shared::{domain::ResultLimit, error::ErrorCode};
use std::{collections::HashMap, sync::Arc};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    list_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    detail_ids: Arc<Mutex<Vec<String>>>,
}

async fn list_employees(
    State(state): State<ServerState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    let last_name = params.get("lastName").cloned().unwrap_or_default();
    state.list_queries.lock().await.push(params);
    match last_name.as_str() {
        "proxied" => (StatusCode::OK, "<html>gateway login</html>".to_string()),
        "empty" => (StatusCode::OK, String::new()),
        _ => (
            StatusCode::OK,
            json!([{ "id": 1, "lastName": "Smith", "firstName": "Ann" }]).to_string(),
        ),
    }
}

async fn employee_detail(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> (StatusCode, String) {
    state.detail_ids.lock().await.push(id.clone());
    match id.as_str() {
        "broken" => (StatusCode::OK, "<html>not json</html>".to_string()),
        "missing" => (StatusCode::NOT_FOUND, "no such employee".to_string()),
        _ => (
            StatusCode::OK,
            json!({ "id": id, "jobTitle": "Engineer", "department": "R&D" }).to_string(),
        ),
    }
}

async fn spawn_directory_server(prefix: &str) -> Result<(String, ServerState)> {
    let state = ServerState::default();
    let routes = Router::new()
        .route("/employees", get(list_employees))
        .route("/employees/:id", get(employee_detail));
    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(prefix, routes)
    }
    .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}{prefix}"), state))
}

fn service_for(server_url: String) -> HttpDirectoryService {
    HttpDirectoryService::new(&ClientSettings {
        server_url,
        ..ClientSettings::default()
    })
    .expect("service")
}

#[tokio::test]
async fn list_request_carries_all_filter_fields_as_query_parameters() {
    let (server_url, state) = spawn_directory_server("").await.expect("server");
    let service = service_for(server_url);

    let filter = FilterCriteria {
        limit: ResultLimit::L50,
        last_name: "Smith".into(),
        first_name: String::new(),
    };
    let body = service.list_employees(&filter).await.expect("list");

    assert_eq!(body[0]["lastName"], "Smith");
    let queries = state.list_queries.lock().await;
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].get("limit").map(String::as_str), Some("50"));
    assert_eq!(queries[0].get("lastName").map(String::as_str), Some("Smith"));
    assert_eq!(queries[0].get("firstName").map(String::as_str), Some(""));
}

#[tokio::test]
async fn detail_request_is_addressed_under_base_path() {
    let (server_url, state) = spawn_directory_server("/api").await.expect("server");
    let service = service_for(format!("{server_url}/"));

    let body = service
        .employee_detail(&EmployeeId::from(7))
        .await
        .expect("detail");

    assert_eq!(body["jobTitle"], "Engineer");
    assert_eq!(state.detail_ids.lock().await.as_slice(), ["7".to_string()]);
}

#[tokio::test]
async fn non_success_status_is_a_transport_failure() {
    let (server_url, _state) = spawn_directory_server("").await.expect("server");
    let service = service_for(server_url);

    let err = service
        .employee_detail(&EmployeeId::from("missing"))
        .await
        .expect_err("404 must fail");

    assert!(err.downcast_ref::<ApiException>().is_none());
    assert!(format!("{err:#}").contains("404"));
}

#[tokio::test]
async fn non_json_list_body_reads_as_null() {
    let (server_url, _state) = spawn_directory_server("").await.expect("server");
    let service = service_for(server_url);

    for last_name in ["proxied", "empty"] {
        let filter = FilterCriteria {
            last_name: last_name.into(),
            ..FilterCriteria::default()
        };
        let body = service
            .list_employees(&filter)
            .await
            .expect("2xx list response is not a failure");
        assert_eq!(body, Value::Null, "body for {last_name}");
    }
}

#[tokio::test]
async fn non_json_detail_body_is_a_malformed_payload() {
    let (server_url, _state) = spawn_directory_server("").await.expect("server");
    let service = service_for(server_url);

    let err = service
        .employee_detail(&EmployeeId::from("broken"))
        .await
        .expect_err("html must fail");

    let api = err.downcast_ref::<ApiException>().expect("api exception");
    assert_eq!(api.code, ErrorCode::MalformedPayload);
}

#[tokio::test]
async fn unavailable_service_fails_every_call() {
    let service = UnavailableDirectoryService;
    assert!(service
        .list_employees(&FilterCriteria::default())
        .await
        .is_err());
    assert!(service.employee_detail(&EmployeeId::from(1)).await.is_err());
}

#[test]
fn rejects_non_http_server_url() {
    let result = HttpDirectoryService::new(&ClientSettings {
        server_url: "file:///tmp/directory".into(),
        ..ClientSettings::default()
    });
    assert!(result.is_err());
}
