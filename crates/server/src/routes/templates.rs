//! Route for the seeded workflow stage templates.

use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::milestone_template::MilestoneTemplate;
use utils::response::ApiResponse;

use crate::{app::AppState, error::ApiError};

pub async fn list_templates(
    State(app): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<MilestoneTemplate>>>, ApiError> {
    let templates = MilestoneTemplate::find_all(&app.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(templates)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/milestone-templates", get(list_templates))
}
