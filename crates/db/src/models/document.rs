use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display,
    Default,
)]
#[sqlx(type_name = "approval_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// File metadata for a document attached to a tender. The bytes live in the
/// object store under storage_path.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct TenderDocument {
    pub id: Uuid,
    pub tender_id: Uuid,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub size_bytes: i64,
    pub storage_path: String,
    pub uploaded_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only version row; version numbers count up from 1 per document.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct DocumentVersion {
    pub id: Uuid,
    pub document_id: Uuid,
    pub version_number: i32,
    pub file_name: String,
    pub size_bytes: i64,
    pub storage_path: String,
    pub uploaded_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct DocumentComment {
    pub id: Uuid,
    pub document_id: Uuid,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct DocumentApproval {
    pub id: Uuid,
    pub document_id: Uuid,
    pub approver: String,
    pub status: ApprovalStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateDocumentComment {
    pub author: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateDocumentApproval {
    pub approver: String,
    pub status: ApprovalStatus,
    pub note: Option<String>,
}

const DOCUMENT_COLUMNS: &str = r#"id, tender_id, file_name, mime_type, size_bytes, storage_path,
       uploaded_by, created_at, updated_at"#;

impl TenderDocument {
    pub async fn find_by_tender_id(
        pool: &SqlitePool,
        tender_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            r#"SELECT {DOCUMENT_COLUMNS}
               FROM tender_documents
               WHERE tender_id = $1
               ORDER BY created_at DESC"#
        ))
        .bind(tender_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM tender_documents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        pool: &SqlitePool,
        document_id: Uuid,
        tender_id: Uuid,
        file_name: &str,
        mime_type: Option<&str>,
        size_bytes: i64,
        storage_path: &str,
        uploaded_by: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            r#"INSERT INTO tender_documents (id, tender_id, file_name, mime_type, size_bytes,
                                             storage_path, uploaded_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING {DOCUMENT_COLUMNS}"#
        ))
        .bind(document_id)
        .bind(tender_id)
        .bind(file_name)
        .bind(mime_type)
        .bind(size_bytes)
        .bind(storage_path)
        .bind(uploaded_by)
        .fetch_one(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM tender_documents WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

impl DocumentVersion {
    pub async fn find_by_document_id(
        pool: &SqlitePool,
        document_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, document_id, version_number, file_name, size_bytes, storage_path,
                      uploaded_by, created_at
               FROM document_versions
               WHERE document_id = $1
               ORDER BY version_number DESC"#,
        )
        .bind(document_id)
        .fetch_all(pool)
        .await
    }

    /// Append the next version for a document. The version number is derived
    /// from the current maximum; concurrent appends are resolved by the
    /// unique (document_id, version_number) constraint.
    pub async fn create(
        pool: &SqlitePool,
        document_id: Uuid,
        file_name: &str,
        size_bytes: i64,
        storage_path: &str,
        uploaded_by: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO document_versions (id, document_id, version_number, file_name,
                                              size_bytes, storage_path, uploaded_by)
               SELECT $1, $2, COALESCE(MAX(version_number), 0) + 1, $3, $4, $5, $6
               FROM document_versions
               WHERE document_id = $2
               RETURNING id, document_id, version_number, file_name, size_bytes, storage_path,
                         uploaded_by, created_at"#,
        )
        .bind(id)
        .bind(document_id)
        .bind(file_name)
        .bind(size_bytes)
        .bind(storage_path)
        .bind(uploaded_by)
        .fetch_one(pool)
        .await
    }
}

impl DocumentComment {
    pub async fn find_by_document_id(
        pool: &SqlitePool,
        document_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, document_id, author, body, created_at
               FROM document_comments
               WHERE document_id = $1
               ORDER BY created_at ASC"#,
        )
        .bind(document_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        document_id: Uuid,
        data: &CreateDocumentComment,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO document_comments (id, document_id, author, body)
               VALUES ($1, $2, $3, $4)
               RETURNING id, document_id, author, body, created_at"#,
        )
        .bind(id)
        .bind(document_id)
        .bind(&data.author)
        .bind(&data.body)
        .fetch_one(pool)
        .await
    }
}

impl DocumentApproval {
    pub async fn find_by_document_id(
        pool: &SqlitePool,
        document_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, document_id, approver, status, note, created_at
               FROM document_approvals
               WHERE document_id = $1
               ORDER BY created_at DESC"#,
        )
        .bind(document_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        document_id: Uuid,
        data: &CreateDocumentApproval,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO document_approvals (id, document_id, approver, status, note)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, document_id, approver, status, note, created_at"#,
        )
        .bind(id)
        .bind(document_id)
        .bind(&data.approver)
        .bind(data.status)
        .bind(&data.note)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DBService,
        models::tender::{CreateTender, Tender},
    };

    async fn db_with_document() -> (DBService, Uuid, Uuid) {
        let db = DBService::new_in_memory().await.unwrap();
        let tender_id = Uuid::new_v4();
        let data = CreateTender {
            title: "IT equipment supply".to_string(),
            reference_number: None,
            portal_reference: None,
            client_id: None,
            client_name: None,
            status: None,
            submission_deadline: None,
            budget: None,
            notes: None,
        };
        Tender::create(&db.pool, &data, tender_id).await.unwrap();
        let document_id = Uuid::new_v4();
        TenderDocument::create(
            &db.pool,
            document_id,
            tender_id,
            "bid.pdf",
            Some("application/pdf"),
            1024,
            "tenders/bid.pdf",
            Some("dana"),
        )
        .await
        .unwrap();
        (db, tender_id, document_id)
    }

    #[tokio::test]
    async fn versions_count_up_from_one() {
        let (db, _, document_id) = db_with_document().await;
        let v1 = DocumentVersion::create(&db.pool, document_id, "bid.pdf", 10, "p/1", None)
            .await
            .unwrap();
        let v2 = DocumentVersion::create(&db.pool, document_id, "bid.pdf", 11, "p/2", None)
            .await
            .unwrap();
        assert_eq!(v1.version_number, 1);
        assert_eq!(v2.version_number, 2);

        let versions = DocumentVersion::find_by_document_id(&db.pool, document_id)
            .await
            .unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].version_number, 2); // newest first
    }

    #[tokio::test]
    async fn deleting_tender_cascades_to_document_children() {
        let (db, tender_id, document_id) = db_with_document().await;
        DocumentComment::create(
            &db.pool,
            document_id,
            &CreateDocumentComment {
                author: "femi".to_string(),
                body: "needs the updated BOQ".to_string(),
            },
        )
        .await
        .unwrap();

        Tender::delete(&db.pool, tender_id).await.unwrap();

        assert!(
            TenderDocument::find_by_id(&db.pool, document_id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            DocumentComment::find_by_document_id(&db.pool, document_id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn approvals_are_append_only_and_newest_first() {
        let (db, _, document_id) = db_with_document().await;
        for status in [ApprovalStatus::Pending, ApprovalStatus::Approved] {
            DocumentApproval::create(
                &db.pool,
                document_id,
                &CreateDocumentApproval {
                    approver: "lead".to_string(),
                    status,
                    note: None,
                },
            )
            .await
            .unwrap();
        }
        let approvals = DocumentApproval::find_by_document_id(&db.pool, document_id)
            .await
            .unwrap();
        assert_eq!(approvals.len(), 2);
    }
}
