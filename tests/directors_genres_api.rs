//! HTTP-level tests for /directors and /genres, which share one shape.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, create, delete, get, post_json, put_json};
use serde_json::json;

const NAMED: [(&str, &str); 2] = [("/directors", "Director"), ("/genres", "Genre")];

#[tokio::test]
async fn crud_round_trip() {
    let app = build_test_app().await;
    for (collection, label) in NAMED {
        let response = post_json(&app, &format!("{collection}/"), json!({"name": "First"})).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await, json!(format!("{label} created")));

        let response = get(&app, &format!("{collection}/1")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"id": 1, "name": "First"}));

        let response = put_json(&app, &format!("{collection}/1"), json!({"name": "Renamed"})).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let json = body_json(get(&app, &format!("{collection}/1/")).await).await;
        assert_eq!(json["name"], "Renamed");

        let response = delete(&app, &format!("{collection}/1")).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(body_json(get(&app, collection).await).await, json!([]));
    }
}

#[tokio::test]
async fn missing_row_is_404_for_every_entity() {
    let app = build_test_app().await;
    for (collection, label) in NAMED {
        let response = get(&app, &format!("{collection}/999")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!(format!("{label} not found")));

        let response = put_json(&app, &format!("{collection}/999"), json!({"name": "x"})).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!("Not update"));

        let response = delete(&app, &format!("{collection}/999")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!(format!("{label} not found")));
    }
}

#[tokio::test]
async fn list_ignores_query_filters() {
    let app = build_test_app().await;
    create(&app, "/directors", json!({"name": "Nolan"})).await;
    create(&app, "/directors", json!({"name": "Scott"})).await;
    let json = body_json(get(&app, "/directors/?name=Nolan").await).await;
    assert_eq!(json.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn deleting_referenced_genre_is_a_conflict() {
    let app = build_test_app().await;
    let genre = create(&app, "/genres", json!({"name": "Noir"})).await;
    let movie = create(&app, "/movies", json!({"title": "Chinatown", "genre_id": genre})).await;

    let response = delete(&app, &format!("/genres/{genre}")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"]["code"], "conflict");

    // The movie still resolves its genre.
    let response = get(&app, &format!("/movies/{movie}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["genre"], json!({"name": "Noir"}));

    // Once unreferenced, the genre can go.
    let response = put_json(&app, &format!("/movies/{movie}"), json!({"genre_id": null})).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = delete(&app, &format!("/genres/{genre}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn ids_are_not_reused_after_delete() {
    let app = build_test_app().await;
    let first = create(&app, "/genres", json!({"name": "Western"})).await;
    delete(&app, &format!("/genres/{first}")).await;
    let second = create(&app, "/genres", json!({"name": "Horror"})).await;
    assert!(second > first);
}

#[tokio::test]
async fn unknown_field_is_rejected() {
    let app = build_test_app().await;
    let response = post_json(&app, "/genres/", json!({"name": "Jazz", "era": "1920s"})).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_resource_is_404() {
    let app = build_test_app().await;
    let response = get(&app, "/actors/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "not_found");
}
