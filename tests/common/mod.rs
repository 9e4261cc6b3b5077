//! Shared helpers for the HTTP integration tests.
//!
//! Each test gets its own in-memory database and drives the full router
//! through `tower::ServiceExt::oneshot`, so no TCP listener is involved.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use movie_catalog::{apply_schema, app, catalog, open_pool, AppState, Catalog, Settings};
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;
use tower_http::normalize_path::NormalizePath;

pub type TestApp = NormalizePath<Router>;

/// Fresh in-memory database with the schema applied, wrapped in the production router.
pub async fn build_test_app() -> TestApp {
    let pool = open_pool("sqlite::memory:", 1).await.unwrap();
    build_test_app_with(pool, &Settings::default()).await
}

/// Production router over the given pool and settings, schema applied.
pub async fn build_test_app_with(pool: SqlitePool, settings: &Settings) -> TestApp {
    let catalog = Arc::new(Catalog::resolve(catalog::entities()).unwrap());
    apply_schema(&pool, &catalog).await.unwrap();
    app(AppState { pool, catalog }, settings)
}

/// File-backed pool in a temp dir. Keep the returned dir alive for the test's duration.
pub async fn file_pool(max_connections: u32) -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("movies.db").display());
    let pool = open_pool(&url, max_connections).await.unwrap();
    (dir, pool)
}

pub async fn send(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: &TestApp, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: &TestApp, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: &TestApp, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// POST and return the id from the Location header (`/movies/7` -> 7).
pub async fn create(app: &TestApp, collection: &str, body: Value) -> i64 {
    let response = post_json(app, collection, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
    location.rsplit('/').next().unwrap().parse().unwrap()
}
