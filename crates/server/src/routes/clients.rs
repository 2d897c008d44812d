//! Routes for procuring-entity records.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::client::{Client, CreateClient, UpdateClient};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{app::AppState, error::ApiError};

/// Free-text guidance a client keeps for one workflow stage.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ClientMilestoneInfo {
    pub milestone_title: String,
    pub info: Option<String>,
}

pub async fn list_clients(
    State(app): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Client>>>, ApiError> {
    let clients = Client::find_all(&app.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(clients)))
}

pub async fn create_client(
    State(app): State<AppState>,
    axum::Json(payload): axum::Json<CreateClient>,
) -> Result<ResponseJson<ApiResponse<Client>>, ApiError> {
    let client = Client::create(&app.db().pool, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(client)))
}

pub async fn get_client(
    State(app): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Client>>, ApiError> {
    let client = Client::find_by_id(&app.db().pool, client_id)
        .await?
        .ok_or(ApiError::NotFound("client"))?;
    Ok(ResponseJson(ApiResponse::success(client)))
}

pub async fn update_client(
    State(app): State<AppState>,
    Path(client_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateClient>,
) -> Result<ResponseJson<ApiResponse<Client>>, ApiError> {
    let client = Client::update(&app.db().pool, client_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(client)))
}

pub async fn delete_client(
    State(app): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Client::delete(&app.db().pool, client_id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("client"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Look up the client's stage-specific guidance by milestone title.
pub async fn get_client_milestone_info(
    State(app): State<AppState>,
    Path((client_id, milestone_title)): Path<(Uuid, String)>,
) -> Result<ResponseJson<ApiResponse<ClientMilestoneInfo>>, ApiError> {
    let client = Client::find_by_id(&app.db().pool, client_id)
        .await?
        .ok_or(ApiError::NotFound("client"))?;
    let info = client.milestone_info_for(&milestone_title);
    Ok(ResponseJson(ApiResponse::success(ClientMilestoneInfo {
        milestone_title,
        info,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/clients",
        Router::new()
            .route("/", get(list_clients).post(create_client))
            .route(
                "/{client_id}",
                get(get_client).put(update_client).delete(delete_client),
            )
            .route(
                "/{client_id}/milestone-info/{milestone_title}",
                get(get_client_milestone_info),
            ),
    )
}
