use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use expense_api::build_app;
use expense_core::FormBounds;
use expense_estimator::EstimatorConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

fn data_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data")
}

fn sample_config() -> EstimatorConfig {
    let data = data_root();
    EstimatorConfig {
        flights_csv: data.join("flights.csv"),
        hotels_csv: data.join("hotels.csv"),
        preprocessor_path: data.join("preprocessor.json"),
        model_path: data.join("model.json"),
        enforce_bounds: true,
        bounds: FormBounds::default(),
    }
}

fn recife_to_florianopolis() -> Value {
    json!({
        "hotelNightlyPrice": 100,
        "flightPrice": 500,
        "origin": "Recife",
        "destination": "Florianopolis",
        "days": 3,
        "flightClassLabel": "Business",
        "distanceKm": 400,
        "stayPlace": "Florianopolis"
    })
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_estimate(app: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/estimate")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_loaded_model() {
    let (status, payload) = get_json(build_app(&sample_config()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["model_available"], true);
    assert!(payload.get("model_error").is_none());
    assert!(payload["catalog_issues"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn form_lists_sorted_cities_behind_sentinels() {
    let (status, payload) = get_json(build_app(&sample_config()), "/v1/form").await;
    assert_eq!(status, StatusCode::OK);

    let origins: Vec<&str> = payload["origins"]
        .as_array()
        .unwrap()
        .iter()
        .map(|value| value.as_str().unwrap())
        .collect();
    assert_eq!(origins[0], "Select a location");
    assert!(origins.contains(&"Recife"));
    assert!(origins[1..].windows(2).all(|pair| pair[0] < pair[1]));

    assert_eq!(payload["stayPlaces"][0], "Select a place");
    assert_eq!(
        payload["flightClasses"],
        json!(["Select a flight type", "Economy", "Business", "First Class"])
    );
}

#[tokio::test]
async fn estimate_runs_the_linear_model() {
    let (status, payload) =
        post_estimate(build_app(&sample_config()), recife_to_florianopolis()).await;

    assert_eq!(status, StatusCode::OK, "{payload}");
    assert_eq!(payload["status"], "estimate");
    // 1650 intercept, -500 flight, -15 distance, -225 hotel total
    let estimate = payload["estimate"].as_f64().unwrap();
    assert!((estimate - 910.0).abs() < 0.01, "{estimate}");
    assert_eq!(
        payload["display"],
        "Estimated Total Travel Expense: $ 910.00"
    );
}

#[tokio::test]
async fn unset_dropdowns_are_rejected() {
    let mut body = recife_to_florianopolis();
    body["destination"] = json!("Select a location");
    body["stayPlace"] = json!("Select a place");

    let (status, payload) = post_estimate(build_app(&sample_config()), body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(payload["status"], "incomplete");
    assert_eq!(
        payload["incompleteFields"],
        json!(["destination", "stayPlace"])
    );
    assert_eq!(
        payload["message"],
        "Please select valid From, To, and Place of Stay locations."
    );
}

#[tokio::test]
async fn unseen_city_is_a_prediction_failure() {
    let mut body = recife_to_florianopolis();
    body["destination"] = json!("Manaus");

    let (status, payload) = post_estimate(build_app(&sample_config()), body).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(payload["status"], "error");
    let message = payload["message"].as_str().unwrap();
    assert!(message.starts_with("Prediction failed:"), "{message}");
    assert!(message.contains("Manaus"), "{message}");
}

#[tokio::test]
async fn missing_artifacts_degrade_instead_of_crashing() {
    let config = EstimatorConfig {
        flights_csv: "/missing/flights.csv".into(),
        hotels_csv: "/missing/hotels.csv".into(),
        preprocessor_path: "/missing/preprocessor.json".into(),
        model_path: "/missing/model.json".into(),
        ..sample_config()
    };

    let (status, health) = get_json(build_app(&config), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["model_available"], false);
    assert_eq!(health["catalog_issues"].as_array().unwrap().len(), 2);
    assert!(health["model_error"]
        .as_str()
        .unwrap()
        .contains("/missing/preprocessor.json"));

    let (_, form) = get_json(build_app(&config), "/v1/form").await;
    assert_eq!(form["origins"], json!(["Select a location"]));

    let (status, payload) = post_estimate(build_app(&config), recife_to_florianopolis()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(payload["status"], "error");
}

#[tokio::test]
async fn undecodable_fields_get_an_error_payload() {
    for (field, value) in [("hotelNightlyPrice", json!(-5)), ("days", json!(2.5))] {
        let mut body = recife_to_florianopolis();
        body[field] = value;

        let (status, payload) = post_estimate(build_app(&sample_config()), body).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{field}");
        assert_eq!(payload["status"], "error");
        let message = payload["message"].as_str().unwrap();
        assert!(message.starts_with("Invalid submission:"), "{message}");
        assert!(message.contains(field), "{message}");
    }
}

#[tokio::test]
async fn broken_json_gets_an_error_payload() {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/estimate")
        .header("content-type", "application/json")
        .body(Body::from("{\"origin\": "))
        .unwrap();

    let response = build_app(&sample_config()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let payload: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(payload["status"], "error");
}
