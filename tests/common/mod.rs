//! Local mock of the geolocation, country and place-search services.

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

pub const API_KEY: &str = "test-key";

fn geo_body(ip: &str, city: &str, region: &str, country: &str, lat: f64, lng: f64, tz: &str) -> Value {
    json!({
        "ip": ip,
        "location": {
            "country": country,
            "region": region,
            "city": city,
            "lat": lat,
            "lng": lng,
            "postalCode": "",
            "timezone": tz,
            "geonameId": 0
        },
        "isp": "Mock ISP"
    })
}

async fn geolocation(Query(params): Query<HashMap<String, String>>) -> Response {
    if params.get("apiKey").map(String::as_str) != Some(API_KEY) {
        return (StatusCode::FORBIDDEN, "bad key").into_response();
    }
    if let (Some(lat), Some(lng)) = (params.get("latitude"), params.get("longitude")) {
        let lat: f64 = lat.parse().unwrap_or(0.0);
        let lng: f64 = lng.parse().unwrap_or(0.0);
        return Json(geo_body("192.0.2.80", "Paris", "Île-de-France", "FR", lat, lng, "Europe/Paris")).into_response();
    }
    match params.get("ipAddress").map(String::as_str) {
        None => Json(geo_body("203.0.113.7", "Stockholm", "Stockholm", "SE", 59.3293, 18.0686, "Europe/Stockholm"))
            .into_response(),
        Some("8.8.8.8") => Json(geo_body(
            "8.8.8.8",
            "Mountain View",
            "California",
            "US",
            37.4,
            -122.07,
            "America/Los_Angeles",
        ))
        .into_response(),
        Some("192.0.2.1") => Json(geo_body("192.0.2.1", "Nowhere", "Nowhere", "ZZ", 0.0, 0.0, "UTC")).into_response(),
        Some("192.0.2.2") => Json(json!({"ip": "192.0.2.2", "isp": "No Location Inc"})).into_response(),
        Some("192.0.2.3") => (StatusCode::OK, "<html>not json</html>").into_response(),
        Some("198.51.100.1") => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(geo_body("198.51.100.1", "Late", "Late", "US", 1.0, 1.0, "UTC")).into_response()
        }
        Some(_) => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
    }
}

async fn country(Path(code): Path<String>) -> Response {
    match code.as_str() {
        "US" => Json(json!([
            {
                "name": {"common": "United States", "official": "United States of America"},
                "flags": {"png": "https://flagcdn.com/w320/us.png", "svg": "https://flagcdn.com/us.svg"},
                "population": 331000000u64,
                "capital": ["Washington, D.C."],
                "languages": {"eng": "English"}
            },
            {
                "name": {"common": "United States Minor Outlying Islands"},
                "flags": {"svg": "https://flagcdn.com/um.svg"},
                "population": 300,
                "capital": ["Washington DC"],
                "languages": {"eng": "English"}
            }
        ]))
        .into_response(),
        "FR" => Json(json!([{
            "name": {"common": "France"},
            "flags": {"svg": "https://flagcdn.com/fr.svg"},
            "population": 67391582,
            "capital": ["Paris"],
            "languages": {"fra": "French"}
        }]))
        .into_response(),
        "SE" => Json(json!([{
            "name": {"common": "Sweden"},
            "flags": {"svg": "https://flagcdn.com/se.svg"},
            "population": 10353442,
            "capital": ["Stockholm"],
            "languages": {"swe": "Swedish"}
        }]))
        .into_response(),
        "ZZ" => Json(json!([{
            "name": {"common": "Nowhere"},
            "flags": {"svg": "https://flagcdn.com/zz.svg"},
            "population": 0,
            "languages": {}
        }]))
        .into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"status": 404, "message": "Not Found"}))).into_response(),
    }
}

async fn place_search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    match params.get("q").map(String::as_str) {
        Some("Paris") => Json(json!([
            {"lat": "48.8588897", "lon": "2.3200410", "display_name": "Paris, Île-de-France, France"},
            {"lat": "33.6617962", "lon": "-95.5555130", "display_name": "Paris, Lamar County, Texas, United States"}
        ])),
        _ => Json(json!([])),
    }
}

/// Start the mock on an ephemeral port; returns its base URL.
pub async fn spawn_upstream() -> String {
    let app = Router::new()
        .route("/geo", get(geolocation))
        .route("/alpha/{code}", get(country))
        .route("/search", get(place_search));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
