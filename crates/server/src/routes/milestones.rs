//! Routes for milestones and their workflow transitions.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::{
    milestone::{self, CreateMilestone, Milestone, MilestoneStatus, UpdateMilestone},
    tender::Tender,
};
use serde::{Deserialize, Serialize};
use services::services::workflow::WorkflowService;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{app::AppState, error::ApiError};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateMilestoneStatusRequest {
    pub status: MilestoneStatus,
    pub actor: Option<String>,
}

pub async fn list_milestones(
    State(app): State<AppState>,
    Path(tender_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Milestone>>>, ApiError> {
    let mut milestones = Milestone::find_by_tender_id(&app.db().pool, tender_id).await?;
    milestone::sort_by_sequence(&mut milestones);
    Ok(ResponseJson(ApiResponse::success(milestones)))
}

pub async fn create_milestone(
    State(app): State<AppState>,
    Path(tender_id): Path<Uuid>,
    axum::Json(payload): axum::Json<CreateMilestone>,
) -> Result<ResponseJson<ApiResponse<Milestone>>, ApiError> {
    let pool = &app.db().pool;
    Tender::find_by_id(pool, tender_id)
        .await?
        .ok_or(ApiError::NotFound("tender"))?;
    let milestone = Milestone::create(pool, tender_id, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(milestone)))
}

pub async fn update_milestone(
    State(app): State<AppState>,
    Path(milestone_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateMilestone>,
) -> Result<ResponseJson<ApiResponse<Milestone>>, ApiError> {
    let milestone = Milestone::update(&app.db().pool, milestone_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(milestone)))
}

/// Request a status change. The transition table is checked synchronously
/// before any write; a rejected transition returns 409.
pub async fn update_milestone_status(
    State(app): State<AppState>,
    Path(milestone_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateMilestoneStatusRequest>,
) -> Result<ResponseJson<ApiResponse<Milestone>>, ApiError> {
    let milestone = WorkflowService::apply_milestone_status(
        &app.db().pool,
        milestone_id,
        payload.status,
        payload.actor,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(milestone)))
}

pub async fn delete_milestone(
    State(app): State<AppState>,
    Path(milestone_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Milestone::delete(&app.db().pool, milestone_id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("milestone"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .nest(
            "/tenders/{tender_id}/milestones",
            Router::new().route("/", get(list_milestones).post(create_milestone)),
        )
        .nest(
            "/milestones/{milestone_id}",
            Router::new()
                .route("/", put(update_milestone).delete(delete_milestone))
                .route("/status", put(update_milestone_status)),
        )
}
