//! CrudService against an in-memory database, below the HTTP layer.

use assert_matches::assert_matches;
use movie_catalog::{apply_schema, catalog, open_pool, AppError, Catalog, CrudService, UpdateOutcome};
use serde_json::{json, Map, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::task::JoinSet;

async fn setup() -> (SqlitePool, Catalog) {
    let catalog = Catalog::resolve(catalog::entities()).unwrap();
    let pool = open_pool("sqlite::memory:", 1).await.unwrap();
    apply_schema(&pool, &catalog).await.unwrap();
    (pool, catalog)
}

fn body(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap()
}

#[tokio::test]
async fn update_distinguishes_missing_unchanged_and_updated() {
    let (pool, catalog) = setup().await;
    let directors = catalog.entity_by_path("directors").unwrap();
    let id = CrudService::create(&pool, &catalog, directors, &body(json!({"name": "Nolan"})))
        .await
        .unwrap();

    let outcome = CrudService::update(&pool, &catalog, directors, id + 1, &body(json!({"name": "x"})))
        .await
        .unwrap();
    assert_eq!(outcome, UpdateOutcome::Missing);

    let outcome = CrudService::update(&pool, &catalog, directors, id, &body(json!({"name": "Nolan"})))
        .await
        .unwrap();
    assert_eq!(outcome, UpdateOutcome::Unchanged);

    let outcome = CrudService::update(&pool, &catalog, directors, id, &Map::new())
        .await
        .unwrap();
    assert_eq!(outcome, UpdateOutcome::Unchanged);

    let outcome = CrudService::update(&pool, &catalog, directors, id, &body(json!({"name": "C. Nolan"})))
        .await
        .unwrap();
    assert_eq!(outcome, UpdateOutcome::Updated);
}

#[tokio::test]
async fn integer_rating_counts_as_unchanged_float() {
    let (pool, catalog) = setup().await;
    let movies = catalog.entity_by_path("movies").unwrap();
    let id = CrudService::create(&pool, &catalog, movies, &body(json!({"rating": 9.0})))
        .await
        .unwrap();
    let outcome = CrudService::update(&pool, &catalog, movies, id, &body(json!({"rating": 9})))
        .await
        .unwrap();
    assert_eq!(outcome, UpdateOutcome::Unchanged);
}

#[tokio::test]
async fn empty_body_creates_all_null_row() {
    let (pool, catalog) = setup().await;
    let movies = catalog.entity_by_path("movies").unwrap();
    let id = CrudService::create(&pool, &catalog, movies, &Map::new()).await.unwrap();
    let row = CrudService::read(&pool, &catalog, movies, id).await.unwrap().unwrap();
    assert_eq!(row["title"], Value::Null);
    assert_eq!(row["director"], json!({"name": null}));
}

#[tokio::test]
async fn delete_is_restricted_while_referenced() {
    let (pool, catalog) = setup().await;
    let directors = catalog.entity_by_path("directors").unwrap();
    let movies = catalog.entity_by_path("movies").unwrap();
    let director = CrudService::create(&pool, &catalog, directors, &body(json!({"name": "Scott"})))
        .await
        .unwrap();
    CrudService::create(&pool, &catalog, movies, &body(json!({"director_id": director})))
        .await
        .unwrap();

    let err = CrudService::delete(&pool, &catalog, directors, director).await.unwrap_err();
    assert_matches!(err, AppError::Conflict(_));
    assert!(CrudService::read(&pool, &catalog, directors, director).await.unwrap().is_some());

    assert!(!CrudService::delete(&pool, &catalog, directors, director + 100).await.unwrap());
}

#[tokio::test]
async fn list_filters_are_exact_match() {
    let (pool, catalog) = setup().await;
    let genres = catalog.entity_by_path("genres").unwrap();
    let movies = catalog.entity_by_path("movies").unwrap();
    let genre = CrudService::create(&pool, &catalog, genres, &body(json!({"name": "Drama"})))
        .await
        .unwrap();
    for genre_id in [json!(genre), Value::Null] {
        CrudService::create(&pool, &catalog, movies, &body(json!({"genre_id": genre_id})))
            .await
            .unwrap();
    }

    let rows = CrudService::list(&pool, &catalog, movies, &[("genre_id".into(), json!(genre))])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["genre"], json!({"name": "Drama"}));

    let rows = CrudService::list(&pool, &catalog, movies, &[]).await.unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_on_a_file_database_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("movies.db").display());
    let pool = open_pool(&url, 5).await.unwrap();
    let catalog = Arc::new(Catalog::resolve(catalog::entities()).unwrap());
    apply_schema(&pool, &catalog).await.unwrap();

    let directors = catalog.entity_by_path("directors").unwrap();
    let mut ids = Vec::new();
    for i in 0..10 {
        let id = CrudService::create(&pool, &catalog, directors, &body(json!({"name": format!("d{i}")})))
            .await
            .unwrap();
        ids.push(id);
    }

    let mut tasks = JoinSet::new();
    for round in 0..10 {
        for &id in &ids {
            let (pool, catalog) = (pool.clone(), catalog.clone());
            tasks.spawn(async move {
                let directors = catalog.entity_by_path("directors").unwrap();
                let name = json!({"name": format!("d{id}-{round}")});
                CrudService::update(&pool, &catalog, directors, id, &body(name)).await?;
                Ok::<(), AppError>(())
            });
        }
    }
    for _ in 0..20 {
        let (pool, catalog) = (pool.clone(), catalog.clone());
        let director = ids[0];
        tasks.spawn(async move {
            let movies = catalog.entity_by_path("movies").unwrap();
            let id = CrudService::create(&pool, &catalog, movies, &body(json!({"director_id": director}))).await?;
            assert!(CrudService::delete(&pool, &catalog, movies, id).await?);
            Ok::<(), AppError>(())
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap().unwrap();
    }

    let movies = catalog.entity_by_path("movies").unwrap();
    assert!(CrudService::list(&pool, &catalog, movies, &[]).await.unwrap().is_empty());
    assert_eq!(CrudService::list(&pool, &catalog, directors, &[]).await.unwrap().len(), 10);
}

#[tokio::test]
async fn undecodable_cell_is_an_error_not_null() {
    let (pool, catalog) = setup().await;
    let movies = catalog.entity_by_path("movies").unwrap();
    // INTEGER affinity keeps non-numeric text as TEXT.
    let id = sqlx::query("INSERT INTO movies (year) VALUES ('nineteen')")
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();

    let err = CrudService::read(&pool, &catalog, movies, id).await.unwrap_err();
    assert_matches!(err, AppError::Db(sqlx::Error::ColumnDecode { .. }));
    let err = CrudService::list(&pool, &catalog, movies, &[]).await.unwrap_err();
    assert_matches!(err, AppError::Db(sqlx::Error::ColumnDecode { .. }));
}
