//! Routes for tender CRUD and status changes.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::{
    activity_log::{ActivityAction, ActivityLog},
    document::{DocumentVersion, TenderDocument},
    milestone::{self, Milestone},
    tender::{CreateTender, Tender, TenderStatus, TenderWithMilestones, UpdateTender},
};
use serde::{Deserialize, Serialize};
use services::services::workflow::WorkflowService;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{app::AppState, error::ApiError};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateTenderStatusRequest {
    pub status: TenderStatus,
    pub actor: Option<String>,
}

pub async fn list_tenders(
    State(app): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Tender>>>, ApiError> {
    let tenders = Tender::find_all(&app.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(tenders)))
}

/// Create a tender and instantiate the workflow milestones for it.
pub async fn create_tender(
    State(app): State<AppState>,
    axum::Json(payload): axum::Json<CreateTender>,
) -> Result<ResponseJson<ApiResponse<TenderWithMilestones>>, ApiError> {
    let pool = &app.db().pool;
    let tender = Tender::create(pool, &payload, Uuid::new_v4()).await?;
    let milestones = WorkflowService::instantiate_templates(pool, tender.id).await?;

    ActivityLog::create(
        pool,
        Some(tender.id),
        ActivityAction::TenderCreated,
        Some(format!("'{}' created", tender.title)),
        None,
    )
    .await?;

    Ok(ResponseJson(ApiResponse::success(TenderWithMilestones {
        tender,
        milestones,
    })))
}

pub async fn get_tender(
    State(app): State<AppState>,
    Path(tender_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<TenderWithMilestones>>, ApiError> {
    let pool = &app.db().pool;
    let tender = Tender::find_by_id(pool, tender_id)
        .await?
        .ok_or(ApiError::NotFound("tender"))?;
    let mut milestones = Milestone::find_by_tender_id(pool, tender_id).await?;
    milestone::sort_by_sequence(&mut milestones);

    Ok(ResponseJson(ApiResponse::success(TenderWithMilestones {
        tender,
        milestones,
    })))
}

pub async fn update_tender(
    State(app): State<AppState>,
    Path(tender_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateTender>,
) -> Result<ResponseJson<ApiResponse<Tender>>, ApiError> {
    let pool = &app.db().pool;
    let tender = Tender::update(pool, tender_id, &payload).await?;

    ActivityLog::create(
        pool,
        Some(tender.id),
        ActivityAction::TenderUpdated,
        Some(format!("'{}' updated", tender.title)),
        None,
    )
    .await?;

    Ok(ResponseJson(ApiResponse::success(tender)))
}

pub async fn update_tender_status(
    State(app): State<AppState>,
    Path(tender_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateTenderStatusRequest>,
) -> Result<ResponseJson<ApiResponse<Tender>>, ApiError> {
    let tender = WorkflowService::apply_tender_status(
        &app.db().pool,
        tender_id,
        payload.status,
        payload.actor,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(tender)))
}

/// Delete a tender. Milestones and document rows cascade; stored objects are
/// removed best-effort afterwards.
pub async fn delete_tender(
    State(app): State<AppState>,
    Path(tender_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &app.db().pool;
    let tender = Tender::find_by_id(pool, tender_id)
        .await?
        .ok_or(ApiError::NotFound("tender"))?;
    // collect every stored object (documents and their versions) before the
    // cascade wipes the rows pointing at them
    let documents = TenderDocument::find_by_tender_id(pool, tender_id).await?;
    let mut stored_paths = Vec::new();
    for document in &documents {
        stored_paths.push(document.storage_path.clone());
        let versions = DocumentVersion::find_by_document_id(pool, document.id).await?;
        stored_paths.extend(versions.into_iter().map(|v| v.storage_path));
    }

    Tender::delete(pool, tender_id).await?;

    for path in &stored_paths {
        if let Err(e) = app.storage().delete(path).await {
            tracing::warn!(
                tender_id = %tender_id,
                error = %e,
                "failed to remove stored object for deleted tender"
            );
        }
    }

    ActivityLog::create(
        pool,
        None,
        ActivityAction::TenderDeleted,
        Some(format!("'{}' deleted", tender.title)),
        None,
    )
    .await?;

    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/tenders",
        Router::new()
            .route("/", get(list_tenders).post(create_tender))
            .route(
                "/{tender_id}",
                get(get_tender).put(update_tender).delete(delete_tender),
            )
            .route("/{tender_id}/status", put(update_tender_status)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::DBService;
    use services::services::config::Config;

    async fn test_app(data_dir: std::path::PathBuf) -> AppState {
        let db = DBService::new_in_memory().await.unwrap();
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            data_dir,
            public_base_url: "http://localhost:8911".to_string(),
        };
        AppState::new(db, &config)
    }

    fn tender_payload(title: &str) -> CreateTender {
        CreateTender {
            title: title.to_string(),
            reference_number: None,
            portal_reference: None,
            client_id: None,
            client_name: None,
            status: None,
            submission_deadline: None,
            budget: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn deleting_a_tender_removes_document_and_version_objects() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path().to_path_buf()).await;
        let pool = &app.db().pool;

        let tender = Tender::create(
            pool,
            &tender_payload("Water treatment plant upgrade"),
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let doc_path = app.storage().save("bid.pdf", b"%PDF-1.7").await.unwrap();
        let document = TenderDocument::create(
            pool,
            Uuid::new_v4(),
            tender.id,
            "bid.pdf",
            Some("application/pdf"),
            8,
            &doc_path,
            None,
        )
        .await
        .unwrap();
        let version_path = app.storage().save("bid.pdf", b"%PDF-1.7 v2").await.unwrap();
        DocumentVersion::create(pool, document.id, "bid.pdf", 11, &version_path, None)
            .await
            .unwrap();

        let doc_absolute = app.storage().resolve(&doc_path).unwrap();
        let version_absolute = app.storage().resolve(&version_path).unwrap();
        assert!(doc_absolute.exists());
        assert!(version_absolute.exists());

        delete_tender(State(app.clone()), Path(tender.id))
            .await
            .unwrap();

        assert!(Tender::find_by_id(pool, tender.id).await.unwrap().is_none());
        assert!(!doc_absolute.exists());
        assert!(!version_absolute.exists());
    }
}
