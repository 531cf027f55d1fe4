//! Router tests with tower's `oneshot`; no listener needed.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{Recorded, RecordingExecutor, recording_gateway, single_column};
use procedure_gateway::http::create_router;
use procedure_gateway::prelude::*;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let req = builder
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_does_not_touch_the_database() {
    let (gateway, executor, _dir) = recording_gateway(RecordingExecutor::new()).await;
    let app = create_router(gateway);

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn bootstrap_routes_return_their_messages() {
    let (gateway, executor, _dir) = recording_gateway(RecordingExecutor::new()).await;
    let app = create_router(gateway);

    let (status, body) = send(&app, "GET", "/init", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Database reset to test values"));

    let (status, body) = send(&app, "GET", "/clear", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Database cleared"));

    assert_eq!(executor.batches().len(), 4);
}

#[tokio::test]
async fn projection_routes_return_rows() {
    let rows = single_column("tail_num", &["n106js", "n110jn"]);
    let (gateway, executor, _dir) =
        recording_gateway(RecordingExecutor::new().with_rows(rows)).await;
    let app = create_router(gateway);

    let (status, body) = send(&app, "GET", "/get/airplane/tail_num", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"tail_num": "n106js"}, {"tail_num": "n110jn"}]));

    let (status, _) = send(&app, "GET", "/get/airplane", None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        executor.calls(),
        vec![
            Recorded::Statement("select tail_num from airplane".to_string(), vec![]),
            Recorded::Statement("select * from airplane".to_string(), vec![]),
        ]
    );
}

#[tokio::test]
async fn unknown_relation_is_a_malformed_request() {
    let (gateway, executor, _dir) = recording_gateway(RecordingExecutor::new()).await;
    let app = create_router(gateway);

    let (status, body) = send(&app, "GET", "/get/passwords", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "malformed_request");
    assert!(body["error"]["message"].as_str().unwrap().contains("passwords"));
    assert!(body["error"].get("sqlMessage").is_none());
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn procedure_route_binds_object_values_in_order() {
    let (gateway, executor, _dir) = recording_gateway(RecordingExecutor::new()).await;
    let app = create_router(gateway);

    let body = r#"{"airportID":"ATL","airport_name":"Hartsfield","city":"Atlanta","state":"GA","locationID":null}"#;
    let (status, response) = send(&app, "POST", "/add_airport", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!([]));

    assert_eq!(
        executor.calls(),
        vec![Recorded::Statement(
            "call add_airport(?,?,?,?,?)".to_string(),
            vec![
                RowValues::Text("ATL".into()),
                RowValues::Text("Hartsfield".into()),
                RowValues::Text("Atlanta".into()),
                RowValues::Text("GA".into()),
                RowValues::Null,
            ],
        )]
    );
}

#[tokio::test]
async fn procedure_route_accepts_arrays_and_empty_bodies() {
    let (gateway, executor, _dir) = recording_gateway(RecordingExecutor::new()).await;
    let app = create_router(gateway);

    let (status, _) = send(&app, "POST", "/assign_pilot", Some(r#"["flight_1","p1"]"#)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", "/simulation_cycle", None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(executor.calls().len(), 2);
}

#[tokio::test]
async fn bad_bodies_and_unknown_procedures_are_rejected() {
    let (gateway, executor, _dir) = recording_gateway(RecordingExecutor::new()).await;
    let app = create_router(gateway);

    for (uri, body) in [
        ("/add_airport", "{not json"),
        ("/add_airport", r#""ATL""#),
        ("/add_airport", r#"["ATL"]"#),
        ("/drop_everything", "[]"),
    ] {
        let (status, response) = send(&app, "POST", uri, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {body}");
        assert_eq!(response["error"]["kind"], "malformed_request", "{uri} {body}");
    }
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn driver_errors_carry_sql_message() {
    let (gateway, _executor, _dir) =
        recording_gateway(RecordingExecutor::new().failing_at(0)).await;
    let app = create_router(gateway);

    let (status, body) = send(&app, "POST", "/assign_pilot", Some(r#"["flight_1","p1"]"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "database_error");
    assert_eq!(body["error"]["sqlMessage"], "simulated failure on call 0");
}

#[tokio::test]
async fn missing_script_is_a_400() {
    let (gateway, _executor, dir) = recording_gateway(RecordingExecutor::new()).await;
    std::fs::remove_file(dir.path().join(ScriptSet::default().seed_data)).unwrap();
    let app = create_router(gateway);

    let (status, body) = send(&app, "GET", "/init", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "script_not_found");
}

#[tokio::test]
async fn unknown_routes_get_a_404_envelope() {
    let (gateway, _executor, _dir) = recording_gateway(RecordingExecutor::new()).await;
    let app = create_router(gateway);

    let (status, body) = send(&app, "GET", "/get/airplane/tail_num/extra", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "not_found");
}

#[tokio::test]
async fn cors_allows_other_origins() {
    let (gateway, _executor, _dir) = recording_gateway(RecordingExecutor::new()).await;
    let app = create_router(gateway);

    let req = Request::builder()
        .uri("/health")
        .header("origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
