use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use docscope_core::{
    ensure_corpus_dir, index_directory, Error as CoreError, IndexOptions, IndexPaths, IndexWriter, PlainTextExtractor,
    Session,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}
fn default_limit() -> usize { 10 }

#[derive(Deserialize)]
pub struct ClusterParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 3 }

#[derive(Deserialize)]
pub struct TextParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: u32,
    pub score: f32,
    pub name: String,
    pub snippet: Option<String>,
}

#[derive(Serialize)]
pub struct ClusterView {
    pub cluster: usize,
    pub documents: Vec<String>,
}

#[derive(Serialize)]
pub struct TermClusterView {
    pub term: String,
    pub similarity: f64,
    pub documents: Vec<String>,
}

#[derive(Serialize)]
pub struct RankView {
    pub name: String,
    pub count: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub index_root: PathBuf,
    pub corpus_root: Option<PathBuf>,
    pub index_options: IndexOptions,
    pub admin_token: Option<String>,
    /// Queries hold it shared, a rebuild holds it exclusively.
    pub index_lock: Arc<RwLock<()>>,
}

impl AppState {
    pub fn new(index_root: impl Into<PathBuf>, corpus_root: Option<PathBuf>, admin_token: Option<String>) -> Self {
        Self {
            index_root: index_root.into(),
            corpus_root,
            index_options: IndexOptions::default(),
            admin_token,
            index_lock: Arc::new(RwLock::new(())),
        }
    }

    fn session(&self) -> Result<Session, ApiError> {
        Ok(Session::open(&self.index_root)?)
    }
}

/// Maps core errors to HTTP statuses with a JSON body.
pub struct ApiError(StatusCode, String);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            CoreError::InvalidArgument(_) | CoreError::QueryParse { .. } => StatusCode::BAD_REQUEST,
            CoreError::IndexOpen { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        ApiError(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

pub fn build_app(index_dir: String, corpus_dir: Option<String>) -> Result<Router> {
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let app_state = AppState::new(&index_dir, corpus_dir.map(PathBuf::from), admin_token);
    if Session::open(&app_state.index_root).is_err() {
        tracing::warn!(index = %index_dir, "no index yet, queries fail until a rebuild");
    }

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Ok(router(app_state).layer(cors).layer(TraceLayer::new_for_http()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/clusters/vector", get(vector_cluster_handler))
        .route("/clusters/term", get(term_cluster_handler))
        .route("/rank", get(rank_handler))
        .route("/doc/:name", get(doc_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(state)
}

/// Query work runs on the blocking pool under the shared index lock.
async fn with_session<T, F>(state: AppState, work: F) -> Result<T, ApiError>
where
    F: FnOnce(Session) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let _guard = state.index_lock.read();
        work(state.session()?)
    })
    .await
    .map_err(|e| ApiError(StatusCode::INTERNAL_SERVER_ERROR, format!("query task failed: {e}")))?
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let query = params.q.clone();
    let (total_hits, results) = with_session(state, move |session| {
        let reader = session.reader()?;
        let top = session.search_reader(&reader, &params.q, params.limit)?;

        // Capture raw query terms for highlighting
        let raw_terms: Vec<String> = params.q.split_whitespace().map(|s| s.to_string()).collect();
        let mut results: Vec<SearchHit> = Vec::with_capacity(top.hits.len());
        for hit in top.hits {
            let doc = reader.document(hit.doc_id)?;
            let snippet = snippet_from_text(&doc.content, &raw_terms);
            results.push(SearchHit { doc_id: hit.doc_id, score: hit.score, name: hit.name, snippet });
        }
        Ok((top.total_hits, results))
    })
    .await?;

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query, took_s: elapsed.as_secs_f64(), total_hits, results }))
}

pub async fn vector_cluster_handler(
    State(state): State<AppState>,
    Query(params): Query<ClusterParams>,
) -> Result<Json<Vec<ClusterView>>, ApiError> {
    let clusters = with_session(state, move |session| Ok(session.cluster_by_vector(&params.q, params.k)?)).await?;
    let views = clusters
        .iter()
        .filter(|c| !c.is_empty())
        .enumerate()
        .map(|(i, c)| ClusterView {
            cluster: i + 1,
            documents: c.file_names().into_iter().map(String::from).collect(),
        })
        .collect();
    Ok(Json(views))
}

pub async fn term_cluster_handler(
    State(state): State<AppState>,
    Query(params): Query<TextParams>,
) -> Result<Json<Vec<TermClusterView>>, ApiError> {
    let clusters = with_session(state, move |session| Ok(session.cluster_by_term(&params.q)?)).await?;
    let views = clusters
        .into_iter()
        .map(|c| TermClusterView {
            term: c.representative_term,
            similarity: c.similarity,
            documents: c.documents.into_iter().map(|d| d.name).collect(),
        })
        .collect();
    Ok(Json(views))
}

pub async fn rank_handler(
    State(state): State<AppState>,
    Query(params): Query<TextParams>,
) -> Result<Json<Vec<RankView>>, ApiError> {
    let ranked = with_session(state, move |session| Ok(session.rank_by_frequency(&params.q)?)).await?;
    let views = ranked.into_iter().map(|r| RankView { name: r.document.name, count: r.count }).collect();
    Ok(Json(views))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let found = with_session(state, {
        let name = name.clone();
        move |session| Ok(session.document(&name)?)
    })
    .await?;
    match found {
        Some(doc) => Ok(Json(serde_json::json!({ "doc_id": doc.id, "name": doc.name, "text": doc.content }))),
        None => Err(ApiError(StatusCode::NOT_FOUND, format!("no document named {name}"))),
    }
}

/// Rebuild the index from the configured corpus directory. Runs on the
/// blocking pool while holding the index lock exclusively.
async fn rebuild_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let corpus = state
        .corpus_root
        .clone()
        .ok_or_else(|| ApiError(StatusCode::CONFLICT, "no corpus directory configured".into()))?;
    ensure_corpus_dir(&corpus)?;

    let job_state = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let _guard = job_state.index_lock.write();
        let mut writer = IndexWriter::create(IndexPaths::new(&job_state.index_root), job_state.index_options)?;
        let summary = index_directory(&corpus, &mut writer, &PlainTextExtractor)?;
        let stats = writer.commit()?;
        Ok::<_, CoreError>((summary, stats))
    })
    .await
    .map_err(|e| ApiError(StatusCode::INTERNAL_SERVER_ERROR, format!("rebuild task failed: {e}")))?;

    let (summary, stats) = outcome?;
    tracing::info!(indexed = summary.indexed, skipped = summary.skipped.len(), "index rebuilt");
    Ok(Json(serde_json::json!({
        "indexed": summary.indexed,
        "skipped": summary.skipped,
        "num_terms": stats.num_terms,
    })))
}

fn snippet_from_text(text: &str, raw_terms: &[String]) -> Option<String> {
    if text.is_empty() { return None; }
    // find first match (case-insensitive) of any raw term
    let first_idx = raw_terms
        .iter()
        .filter(|t| !t.trim().is_empty())
        .find_map(|term| find_case_insensitive(text, term));
    let snippet = match first_idx {
        Some(idx) => {
            let start = floor_char_boundary(text, idx.saturating_sub(100));
            let end = floor_char_boundary(text, (idx + 200).min(text.len()));
            text[start..end].to_string()
        }
        None => text.chars().take(200).collect(),
    };
    Some(highlight_terms(&snippet, raw_terms))
}

/// Byte offset of the first case-insensitive match, in `haystack` coordinates.
fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let pat = regex::RegexBuilder::new(&regex::escape(needle)).case_insensitive(true).build().ok()?;
    pat.find(haystack).map(|m| m.start())
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn highlight_terms(snippet: &str, terms: &[String]) -> String {
    let mut s = snippet.to_string();
    for t in terms {
        if t.trim().is_empty() { continue; }
        let Ok(pat) = regex::RegexBuilder::new(&regex::escape(t)).case_insensitive(true).build() else { continue };
        s = pat.replace_all(&s, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).to_string();
    }
    s
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(ApiError(StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError(StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_highlights_terms_case_insensitively() {
        let s = snippet_from_text("Learning Rust is fun", &["rust".to_string()]).unwrap();
        assert_eq!(s, "Learning <em>Rust</em> is fun");
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let text = format!("{}target", "é".repeat(80));
        let s = snippet_from_text(&text, &["target".to_string()]).unwrap();
        assert!(s.ends_with("<em>target</em>"));
    }
}
