use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::AnimeRecord,
    routes::AppState,
};

const DEFAULT_SEARCH_LIMIT: usize = 20;
const MAX_SEARCH_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
    limit: Option<usize>,
}

/// Handler for catalog title search endpoint
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<AnimeRecord>>> {
    if params.q.trim().is_empty() {
        return Err(AppError::InvalidInput("Query must not be empty".to_string()));
    }

    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let titles = state
        .recommender
        .catalog()
        .search(&params.q, limit)
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(titles))
}

/// Handler for single catalog entry lookup
pub async fn get_title(
    State(state): State<Arc<AppState>>,
    Path(anime_id): Path<u64>,
) -> AppResult<Json<AnimeRecord>> {
    state
        .recommender
        .catalog()
        .lookup(anime_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Anime {} is not in the catalog", anime_id)))
}
