//! Routes for tender documents: upload, viewing, versions, comments,
//! approvals.

use axum::{
    Router,
    extract::{Multipart, Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    activity_log::{ActivityAction, ActivityLog},
    document::{
        CreateDocumentApproval, CreateDocumentComment, DocumentApproval, DocumentComment,
        DocumentVersion, TenderDocument,
    },
    tender::Tender,
};
use services::services::document_viewer::DocumentViewResponse;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{app::AppState, error::ApiError};

/// One uploaded file pulled out of a multipart body, plus the optional
/// uploaded_by field.
struct Upload {
    file_name: String,
    mime_type: Option<String>,
    bytes: Vec<u8>,
    uploaded_by: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut uploaded_by = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| "unnamed".to_string());
                let mime_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?.to_vec();
                file = Some((file_name, mime_type, bytes));
            }
            Some("uploaded_by") => {
                uploaded_by = Some(field.text().await?);
            }
            _ => {}
        }
    }

    let (file_name, mime_type, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("missing 'file' field".to_string()))?;
    // fall back to the extension when the browser sent no content type
    let mime_type = mime_type.or_else(|| {
        mime_guess::from_path(&file_name)
            .first()
            .map(|m| m.essence_str().to_string())
    });

    Ok(Upload {
        file_name,
        mime_type,
        bytes,
        uploaded_by,
    })
}

pub async fn list_documents(
    State(app): State<AppState>,
    Path(tender_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<TenderDocument>>>, ApiError> {
    let documents = TenderDocument::find_by_tender_id(&app.db().pool, tender_id).await?;
    Ok(ResponseJson(ApiResponse::success(documents)))
}

pub async fn upload_document(
    State(app): State<AppState>,
    Path(tender_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<ResponseJson<ApiResponse<TenderDocument>>, ApiError> {
    let pool = &app.db().pool;
    Tender::find_by_id(pool, tender_id)
        .await?
        .ok_or(ApiError::NotFound("tender"))?;

    let upload = read_upload(multipart).await?;
    let storage_path = app.storage().save(&upload.file_name, &upload.bytes).await?;

    let document = TenderDocument::create(
        pool,
        Uuid::new_v4(),
        tender_id,
        &upload.file_name,
        upload.mime_type.as_deref(),
        upload.bytes.len() as i64,
        &storage_path,
        upload.uploaded_by.as_deref(),
    )
    .await?;

    ActivityLog::create(
        pool,
        Some(tender_id),
        ActivityAction::DocumentUploaded,
        Some(format!("'{}' uploaded", document.file_name)),
        upload.uploaded_by,
    )
    .await?;

    Ok(ResponseJson(ApiResponse::success(document)))
}

pub async fn get_document(
    State(app): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<TenderDocument>>, ApiError> {
    let document = TenderDocument::find_by_id(&app.db().pool, document_id)
        .await?
        .ok_or(ApiError::NotFound("document"))?;
    Ok(ResponseJson(ApiResponse::success(document)))
}

pub async fn delete_document(
    State(app): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &app.db().pool;
    let document = TenderDocument::find_by_id(pool, document_id)
        .await?
        .ok_or(ApiError::NotFound("document"))?;
    let versions = DocumentVersion::find_by_document_id(pool, document_id).await?;

    TenderDocument::delete(pool, document_id).await?;

    for path in std::iter::once(document.storage_path.as_str())
        .chain(versions.iter().map(|v| v.storage_path.as_str()))
    {
        if let Err(e) = app.storage().delete(path).await {
            tracing::warn!(document_id = %document_id, error = %e, "failed to remove stored object");
        }
    }

    Ok(ResponseJson(ApiResponse::success(())))
}

/// Resolve how the document should be rendered: inline preview, external
/// office viewer for spreadsheets, or download-only.
pub async fn view_document(
    State(app): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<DocumentViewResponse>>, ApiError> {
    let document = TenderDocument::find_by_id(&app.db().pool, document_id)
        .await?
        .ok_or(ApiError::NotFound("document"))?;
    let response = app.viewer().view(&document)?;
    Ok(ResponseJson(ApiResponse::success(response)))
}

pub async fn list_versions(
    State(app): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<DocumentVersion>>>, ApiError> {
    let versions = DocumentVersion::find_by_document_id(&app.db().pool, document_id).await?;
    Ok(ResponseJson(ApiResponse::success(versions)))
}

pub async fn upload_version(
    State(app): State<AppState>,
    Path(document_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<ResponseJson<ApiResponse<DocumentVersion>>, ApiError> {
    let pool = &app.db().pool;
    let document = TenderDocument::find_by_id(pool, document_id)
        .await?
        .ok_or(ApiError::NotFound("document"))?;

    let upload = read_upload(multipart).await?;
    let storage_path = app.storage().save(&upload.file_name, &upload.bytes).await?;

    let version = DocumentVersion::create(
        pool,
        document_id,
        &upload.file_name,
        upload.bytes.len() as i64,
        &storage_path,
        upload.uploaded_by.as_deref(),
    )
    .await?;

    ActivityLog::create(
        pool,
        Some(document.tender_id),
        ActivityAction::VersionAdded,
        Some(format!(
            "version {} of '{}' uploaded",
            version.version_number, document.file_name
        )),
        upload.uploaded_by,
    )
    .await?;

    Ok(ResponseJson(ApiResponse::success(version)))
}

pub async fn list_comments(
    State(app): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<DocumentComment>>>, ApiError> {
    let comments = DocumentComment::find_by_document_id(&app.db().pool, document_id).await?;
    Ok(ResponseJson(ApiResponse::success(comments)))
}

pub async fn add_comment(
    State(app): State<AppState>,
    Path(document_id): Path<Uuid>,
    axum::Json(payload): axum::Json<CreateDocumentComment>,
) -> Result<ResponseJson<ApiResponse<DocumentComment>>, ApiError> {
    let pool = &app.db().pool;
    let document = TenderDocument::find_by_id(pool, document_id)
        .await?
        .ok_or(ApiError::NotFound("document"))?;
    let comment = DocumentComment::create(pool, document_id, &payload).await?;

    ActivityLog::create(
        pool,
        Some(document.tender_id),
        ActivityAction::CommentAdded,
        Some(format!("comment on '{}'", document.file_name)),
        Some(comment.author.clone()),
    )
    .await?;

    Ok(ResponseJson(ApiResponse::success(comment)))
}

pub async fn list_approvals(
    State(app): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<DocumentApproval>>>, ApiError> {
    let approvals = DocumentApproval::find_by_document_id(&app.db().pool, document_id).await?;
    Ok(ResponseJson(ApiResponse::success(approvals)))
}

pub async fn add_approval(
    State(app): State<AppState>,
    Path(document_id): Path<Uuid>,
    axum::Json(payload): axum::Json<CreateDocumentApproval>,
) -> Result<ResponseJson<ApiResponse<DocumentApproval>>, ApiError> {
    let pool = &app.db().pool;
    let document = TenderDocument::find_by_id(pool, document_id)
        .await?
        .ok_or(ApiError::NotFound("document"))?;
    let approval = DocumentApproval::create(pool, document_id, &payload).await?;

    ActivityLog::create(
        pool,
        Some(document.tender_id),
        ActivityAction::ApprovalRecorded,
        Some(format!(
            "'{}' marked {} by {}",
            document.file_name, approval.status, approval.approver
        )),
        Some(approval.approver.clone()),
    )
    .await?;

    Ok(ResponseJson(ApiResponse::success(approval)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .nest(
            "/tenders/{tender_id}/documents",
            Router::new().route("/", get(list_documents).post(upload_document)),
        )
        .nest(
            "/documents/{document_id}",
            Router::new()
                .route("/", get(get_document).delete(delete_document))
                .route("/view", get(view_document))
                .route("/versions", get(list_versions).post(upload_version))
                .route("/comments", get(list_comments).post(add_comment))
                .route("/approvals", get(list_approvals).post(add_approval)),
        )
}
