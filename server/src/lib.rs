use anyhow::Result;
use axum::{extract::{Query as QueryParams, State}, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tfidx::config::{DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
use tfidx::persist::{load_index, IndexPaths};
use tfidx::tokenizer::Cleaner;
use tfidx::{search, AnyIndex, BooleanModel, InvertedIndex, Operator, PrecomputedStats, Query, RankingModel, VectorModel};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    And,
    Or,
    #[default]
    Vector,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub model: ModelKind,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { DEFAULT_SEARCH_LIMIT }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub model: ModelKind,
    pub took_ms: u128,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Read-only state shared by every request. The index is finalized, so
/// concurrent searches need no locking.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<AnyIndex>,
    pub stats: Arc<PrecomputedStats>,
    pub cleaner: Arc<Cleaner>,
}

pub fn build_app<P: AsRef<Path>>(index_dir: P, cleaner: Cleaner) -> Result<Router> {
    // Load index and norms once at startup
    let index = load_index(&IndexPaths::new(index_dir))?;
    let stats = PrecomputedStats::compute(&index)?;
    tracing::info!(num_docs = index.document_count(), num_terms = index.vocabulary().len(), "index ready");
    let app_state = AppState { index: Arc::new(index), stats: Arc::new(stats), cleaner: Arc::new(cleaner) };

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
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let query = Query::parse(&params.q, &state.cleaner);

    let model: Box<dyn RankingModel + Send> = match params.model {
        ModelKind::And => Box::new(BooleanModel::new(Operator::And)),
        ModelKind::Or => Box::new(BooleanModel::new(Operator::Or)),
        ModelKind::Vector => Box::new(VectorModel::new(state.stats.clone())),
    };
    let ranking = search(state.index.as_ref(), &query, model.as_ref()).map_err(|e| {
        tracing::error!(error = %e, "search failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let k = params.k.clamp(1, MAX_SEARCH_LIMIT);
    let total_hits = ranking.documents.len();
    let results = ranking
        .documents
        .iter()
        .take(k)
        .map(|&doc_id| SearchHit {
            doc_id,
            score: ranking.scores.as_ref().and_then(|s| s.get(&doc_id).copied()),
        })
        .collect();

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.q,
        model: params.model,
        took_ms: elapsed.as_millis(),
        took_s: elapsed.as_secs_f64(),
        total_hits,
        results,
    }))
}
