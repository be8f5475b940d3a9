use axum::{extract::State, Extension, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{RecommendationRequest, RecommendationResponse},
    routes::AppState,
    services::recommendations,
};

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub count: usize,
    pub user_ids: Vec<u64>,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(
        request_id = %request_id,
        user_id = request.user_id,
        top_n = request.top_n,
        min_score = request.min_score,
        "Processing recommendation request"
    );

    let response = recommendations::get_recommendations(&state.recommender, request).await?;

    tracing::info!(
        request_id = %request_id,
        source = ?response.source,
        items = response.items.len(),
        "Recommendation request completed"
    );

    Ok(Json(response))
}

/// Lists the users the model can personalize for
pub async fn list_users(State(state): State<Arc<AppState>>) -> Json<UsersResponse> {
    let user_ids = state.recommender.vocabulary().user_ids().to_vec();
    Json(UsersResponse {
        count: user_ids.len(),
        user_ids,
    })
}
