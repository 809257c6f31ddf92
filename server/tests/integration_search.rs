use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use docscope_core::{IndexOptions, IndexPaths, IndexWriter};
use docscope_server::{router, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use tower::ServiceExt;

fn build_tiny_index(dir: &Path) {
    let mut writer = IndexWriter::create(IndexPaths::new(dir), IndexOptions::default()).unwrap();
    writer.add_document("doc0.txt", "Rust is great. rust systems programming.").unwrap();
    writer.add_document("doc1.txt", "rust learning rust.").unwrap();
    writer.add_document("doc2.txt", "Gardening with tomatoes and tomato plants.").unwrap();
    writer.commit().unwrap();
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    call(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = router(AppState::new(dir.path(), None, None));

    let (status, json) = get(app, "/search?q=rust&limit=2").await;
    assert_eq!(status, StatusCode::OK);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(json["total_hits"], 2);
    let mut names: Vec<&str> = arr.iter().map(|h| h["name"].as_str().unwrap()).collect();
    names.sort();
    assert_eq!(names, vec!["doc0.txt", "doc1.txt"]);
    assert!(arr[0]["score"].as_f64().unwrap() >= arr[1]["score"].as_f64().unwrap());
    assert!(arr.iter().all(|h| h["snippet"].as_str().unwrap().contains("rust</em>")));
}

#[tokio::test]
async fn rank_counts_literal_occurrences() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = router(AppState::new(dir.path(), None, None));

    let (status, json) = get(app, "/rank?q=rust").await;
    assert_eq!(status, StatusCode::OK);
    let arr = json.as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert!(arr.iter().all(|r| r["count"] == 2));
}

#[tokio::test]
async fn cluster_endpoints_answer() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let state = AppState::new(dir.path(), None, None);

    let (status, json) = get(router(state.clone()), "/clusters/vector?q=rust%20tomato&k=5").await;
    assert_eq!(status, StatusCode::OK);
    let total: usize = json.as_array().unwrap().iter().map(|c| c["documents"].as_array().unwrap().len()).sum();
    assert_eq!(total, 3);

    let (status, json) = get(router(state), "/clusters/term?q=rust").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["term"], "rust");
    let mut docs: Vec<&str> = json[0]["documents"].as_array().unwrap().iter().map(|d| d.as_str().unwrap()).collect();
    docs.sort();
    assert_eq!(docs, vec!["doc0.txt", "doc1.txt"]);
}

#[tokio::test]
async fn bad_requests_and_missing_index() {
    let dir = tempdir().unwrap();
    let state = AppState::new(dir.path(), None, None);
    let (status, _) = get(router(state), "/search?q=rust").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    build_tiny_index(dir.path());
    let state = AppState::new(dir.path(), None, None);
    let (status, json) = get(router(state.clone()), "/search?q=%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("empty"));

    let (status, _) = get(router(state.clone()), "/clusters/vector?q=rust&k=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(router(state), "/doc/nothing.txt").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn doc_returns_stored_text() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let (status, json) = get(router(AppState::new(dir.path(), None, None)), "/doc/doc1.txt").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["text"], "rust learning rust.");
}

#[tokio::test]
async fn rebuild_requires_token_and_replaces_index() {
    let corpus = tempdir().unwrap();
    fs::write(corpus.path().join("fresh.txt"), "brand new content").unwrap();
    let index = tempdir().unwrap();
    build_tiny_index(index.path());
    let state = AppState::new(index.path(), Some(corpus.path().to_path_buf()), Some("secret".into()));

    let req = Request::post("/index/rebuild").header("X-ADMIN-TOKEN", "nope").body(Body::empty()).unwrap();
    let (status, _) = call(router(state.clone()), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::post("/index/rebuild").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, json) = call(router(state.clone()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["indexed"], 1);

    let (_, json) = get(router(state.clone()), "/search?q=rust").await;
    assert_eq!(json["total_hits"], 0);
    let (_, json) = get(router(state), "/search?q=brand").await;
    assert_eq!(json["results"][0]["name"], "fresh.txt");
}

#[tokio::test]
async fn rebuild_from_missing_corpus_keeps_the_index() {
    let index = tempdir().unwrap();
    build_tiny_index(index.path());
    let gone = index.path().join("no_such_corpus");
    let state = AppState::new(index.path(), Some(gone), Some("secret".into()));

    let req = Request::post("/index/rebuild").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, _) = call(router(state.clone()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = get(router(state), "/search?q=rust").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 2);
}

#[tokio::test]
async fn queries_wait_for_a_rebuild_off_the_async_threads() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let state = AppState::new(dir.path(), None, None);

    let rebuilding = state.index_lock.write();
    let pending = tokio::spawn(get(router(state.clone()), "/search?q=rust"));
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(!pending.is_finished());
    drop(rebuilding);

    let (status, _) = pending.await.unwrap();
    assert_eq!(status, StatusCode::OK);
}
