use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::milestone::Milestone;

#[derive(
    Debug, Clone, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display,
    Default,
)]
#[sqlx(type_name = "tender_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TenderStatus {
    #[default]
    Draft,
    Preparing,
    Submitted,
    UnderEvaluation,
    Clarification,
    Won,
    Lost,
    Cancelled,
}

impl TenderStatus {
    /// Won and lost are terminal decisions; they carry a decision timestamp.
    pub fn is_decided(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Tender {
    pub id: Uuid,
    pub title: String,
    pub reference_number: Option<String>,
    pub portal_reference: Option<String>,
    pub client_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub status: TenderStatus,
    pub submission_deadline: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A tender together with its milestones, as served by the detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TenderWithMilestones {
    #[serde(flatten)]
    #[ts(flatten)]
    pub tender: Tender,
    pub milestones: Vec<Milestone>,
}

impl std::ops::Deref for TenderWithMilestones {
    type Target = Tender;
    fn deref(&self) -> &Self::Target {
        &self.tender
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTender {
    pub title: String,
    pub reference_number: Option<String>,
    pub portal_reference: Option<String>,
    pub client_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub status: Option<TenderStatus>,
    pub submission_deadline: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub notes: Option<String>,
}

/// Partial update; omitted fields keep their current value.
#[derive(Debug, Default, Serialize, Deserialize, TS)]
pub struct UpdateTender {
    pub title: Option<String>,
    pub reference_number: Option<String>,
    pub portal_reference: Option<String>,
    pub client_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub submission_deadline: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub notes: Option<String>,
}

const TENDER_COLUMNS: &str = r#"id, title, reference_number, portal_reference, client_id,
       client_name, status, submission_deadline, decided_at, budget, notes,
       created_at, updated_at"#;

impl Tender {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {TENDER_COLUMNS} FROM tenders ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {TENDER_COLUMNS} FROM tenders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateTender,
        tender_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let status = data.status.clone().unwrap_or_default();
        sqlx::query_as::<_, Self>(&format!(
            r#"INSERT INTO tenders (id, title, reference_number, portal_reference, client_id,
                                    client_name, status, submission_deadline, budget, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               RETURNING {TENDER_COLUMNS}"#
        ))
        .bind(tender_id)
        .bind(&data.title)
        .bind(&data.reference_number)
        .bind(&data.portal_reference)
        .bind(data.client_id)
        .bind(&data.client_name)
        .bind(status)
        .bind(data.submission_deadline)
        .bind(data.budget)
        .bind(&data.notes)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateTender,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            r#"UPDATE tenders
               SET title               = COALESCE($2, title),
                   reference_number    = COALESCE($3, reference_number),
                   portal_reference    = COALESCE($4, portal_reference),
                   client_id           = COALESCE($5, client_id),
                   client_name         = COALESCE($6, client_name),
                   submission_deadline = COALESCE($7, submission_deadline),
                   budget              = COALESCE($8, budget),
                   notes               = COALESCE($9, notes),
                   updated_at          = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {TENDER_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.title)
        .bind(&data.reference_number)
        .bind(&data.portal_reference)
        .bind(data.client_id)
        .bind(&data.client_name)
        .bind(data.submission_deadline)
        .bind(data.budget)
        .bind(&data.notes)
        .fetch_one(pool)
        .await
    }

    /// Set the status, stamping decided_at when the tender is won or lost
    /// and clearing it when it moves back to an open status.
    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        status: TenderStatus,
    ) -> Result<Self, sqlx::Error> {
        if status.is_decided() {
            sqlx::query_as::<_, Self>(&format!(
                r#"UPDATE tenders
                   SET status = $2,
                       decided_at = datetime('now', 'subsec'),
                       updated_at = datetime('now', 'subsec')
                   WHERE id = $1
                   RETURNING {TENDER_COLUMNS}"#
            ))
            .bind(id)
            .bind(status)
            .fetch_one(pool)
            .await
        } else {
            sqlx::query_as::<_, Self>(&format!(
                r#"UPDATE tenders
                   SET status = $2,
                       decided_at = NULL,
                       updated_at = datetime('now', 'subsec')
                   WHERE id = $1
                   RETURNING {TENDER_COLUMNS}"#
            ))
            .bind(id)
            .bind(status)
            .fetch_one(pool)
            .await
        }
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM tenders WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
