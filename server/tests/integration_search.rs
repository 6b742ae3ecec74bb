use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::tempdir;
use tfidx::persist::{save_index, IndexPaths};
use tfidx::tokenizer::{Cleaner, CleanerOptions};
use tfidx::{DiskIndex, DiskIndexConfig, InvertedIndex};
use tower::ServiceExt;

fn cleaner() -> Cleaner {
    Cleaner::portuguese(CleanerOptions { stem: false, ..Default::default() })
}

fn build_tiny_index(dir: &std::path::Path) {
    let config = DiskIndexConfig { buffer_capacity: 2, ..Default::default() };
    let mut idx = DiskIndex::create(dir, config).unwrap();
    idx.index("rust", 1, 3).unwrap();
    idx.index("rust", 2, 1).unwrap();
    idx.index("python", 2, 2).unwrap();
    idx.index("java", 3, 1).unwrap();
    idx.finalize().unwrap();
    save_index(&IndexPaths::new(dir), &idx.into()).unwrap();
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn doc_ids(json: &Value) -> Vec<u64> {
    json["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["doc_id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = server::build_app(dir.path(), cleaner()).unwrap();

    let (status, json) = call(app, "/search?q=rust&k=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc_ids(&json), vec![1, 2]);
    assert_eq!(json["total_hits"], 2);
    let first = json["results"][0]["score"].as_f64().unwrap();
    let second = json["results"][1]["score"].as_f64().unwrap();
    assert!(first > second);
}

#[tokio::test]
async fn boolean_models_have_no_scores() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = server::build_app(dir.path(), cleaner()).unwrap();

    let (status, json) = call(app.clone(), "/search?q=rust%20python&model=and").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc_ids(&json), vec![2]);
    assert!(json["results"][0].get("score").is_none());

    let (_, json) = call(app, "/search?q=rust%20java%20cobol&model=or").await;
    assert_eq!(doc_ids(&json), vec![1, 2, 3]);
}

#[tokio::test]
async fn health_is_ok() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = server::build_app(dir.path(), cleaner()).unwrap();
    let req = Request::get("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
