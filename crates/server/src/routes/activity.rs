//! Routes for the activity feed.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::activity_log::ActivityLog;
use serde::Deserialize;
use services::services::activity::ActivityService;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{app::AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
}

pub async fn get_activity(
    State(app): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<ActivityLog>>>, ApiError> {
    let feed = ActivityService::feed(&app.db().pool, query.limit).await?;
    Ok(ResponseJson(ApiResponse::success(feed)))
}

pub async fn get_tender_activity(
    State(app): State<AppState>,
    Path(tender_id): Path<Uuid>,
    Query(query): Query<FeedQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<ActivityLog>>>, ApiError> {
    let feed = ActivityService::feed_for_tender(&app.db().pool, tender_id, query.limit).await?;
    Ok(ResponseJson(ApiResponse::success(feed)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activity", get(get_activity))
        .route("/tenders/{tender_id}/activity", get(get_tender_activity))
}
