//! Routes for the dashboard summary and its display settings.

use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::dashboard_settings::{
    DEFAULT_SCOPE, DEFAULT_UPCOMING_LIMIT, DashboardSettings, UpdateDashboardSettings,
};
use services::services::dashboard::{DashboardService, DashboardSummary};
use utils::response::ApiResponse;

use crate::{app::AppState, error::ApiError};

/// Recomputed from flat tender/milestone rows on every request.
pub async fn get_dashboard(
    State(app): State<AppState>,
) -> Result<ResponseJson<ApiResponse<DashboardSummary>>, ApiError> {
    let summary = DashboardService::summary(&app.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

pub async fn get_settings(
    State(app): State<AppState>,
) -> Result<ResponseJson<ApiResponse<DashboardSettings>>, ApiError> {
    let pool = &app.db().pool;
    let settings = match DashboardSettings::find_by_scope(pool, DEFAULT_SCOPE).await? {
        Some(settings) => settings,
        None => {
            // materialize the defaults so the frontend always has a row
            DashboardSettings::create_or_update(
                pool,
                DEFAULT_SCOPE,
                &UpdateDashboardSettings {
                    show_status_cards: true,
                    show_monthly_chart: true,
                    show_upcoming: true,
                    upcoming_limit: DEFAULT_UPCOMING_LIMIT,
                },
            )
            .await?
        }
    };
    Ok(ResponseJson(ApiResponse::success(settings)))
}

pub async fn update_settings(
    State(app): State<AppState>,
    axum::Json(payload): axum::Json<UpdateDashboardSettings>,
) -> Result<ResponseJson<ApiResponse<DashboardSettings>>, ApiError> {
    let settings =
        DashboardSettings::create_or_update(&app.db().pool, DEFAULT_SCOPE, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(settings)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/dashboard",
        Router::new()
            .route("/", get(get_dashboard))
            .route("/settings", get(get_settings).put(update_settings)),
    )
}
