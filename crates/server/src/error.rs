use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    activity::ActivityError, dashboard::DashboardError, document_viewer::ViewerError,
    storage::StorageError, workflow::WorkflowError,
};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Activity(#[from] ActivityError),
    #[error(transparent)]
    Dashboard(#[from] DashboardError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Viewer(#[from] ViewerError),
    #[error("invalid upload: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Workflow(WorkflowError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            ApiError::Workflow(WorkflowError::MilestoneNotFound)
            | ApiError::Workflow(WorkflowError::TenderNotFound)
            | ApiError::NotFound(_)
            | ApiError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            ApiError::Multipart(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(StorageError::PathTraversal) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = Json(ApiResponse::<()>::error(self.to_string()));
        (status, body).into_response()
    }
}
