use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sitesearch_core::{SearchHit, SearchIndex};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Clone)]
pub struct AppState {
    // Read-only after load, so concurrent handlers share it without locking.
    pub index: Arc<SearchIndex>,
}

pub fn build_app(index_path: String) -> Result<Router> {
    // Load and validate the payload once at startup
    let index = SearchIndex::load_file(&index_path)?;
    tracing::info!(
        num_docs = index.num_docs(),
        num_terms = index.num_terms(),
        num_sections = index.num_sections(),
        "index loaded"
    );
    let app_state = AppState { index: Arc::new(index) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(app_state)
        .layer(cors);
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let hits = state.index.search(&params.q);
    let total_hits = hits.len();
    let k = params.k.max(1).min(100);
    let results: Vec<SearchHit> = hits.into_iter().take(k).collect();
    let took_s = start.elapsed().as_secs_f64();
    tracing::debug!(query = %params.q, total_hits, took_s, "search served");
    Json(SearchResponse { query: params.q, took_s, total_hits, results })
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<u32>,
) -> Json<serde_json::Value> {
    if let Some(meta) = state.index.doc(doc_id) {
        let sections = state.index.doc_sections(doc_id).cloned().unwrap_or_default();
        return Json(serde_json::json!({
            "doc_id": doc_id,
            "docname": meta.docname,
            "title": meta.title,
            "filename": meta.filename,
            "sections": sections,
        }));
    }
    Json(serde_json::json!({ "error": "not found" }))
}
