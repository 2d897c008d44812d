use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Kind of event recorded in the activity feed
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display,
)]
#[sqlx(type_name = "activity_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityAction {
    TenderCreated,
    TenderUpdated,
    TenderDeleted,
    StatusChanged,
    MilestoneUpdated,
    DocumentUploaded,
    VersionAdded,
    CommentAdded,
    ApprovalRecorded,
}

/// Append-only activity feed entry
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ActivityLog {
    pub id: Uuid,
    pub tender_id: Option<Uuid>,
    pub action: ActivityAction,
    pub detail: Option<String>,
    pub actor: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    pub async fn create(
        pool: &SqlitePool,
        tender_id: Option<Uuid>,
        action: ActivityAction,
        detail: Option<String>,
        actor: Option<String>,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO activity_logs (id, tender_id, action, detail, actor)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, tender_id, action, detail, actor, created_at"#,
        )
        .bind(id)
        .bind(tender_id)
        .bind(action)
        .bind(detail)
        .bind(actor)
        .fetch_one(pool)
        .await
    }

    pub async fn find_latest(pool: &SqlitePool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, tender_id, action, detail, actor, created_at
               FROM activity_logs
               ORDER BY created_at DESC, rowid DESC
               LIMIT $1"#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_tender_id(
        pool: &SqlitePool,
        tender_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, tender_id, action, detail, actor, created_at
               FROM activity_logs
               WHERE tender_id = $1
               ORDER BY created_at DESC, rowid DESC
               LIMIT $2"#,
        )
        .bind(tender_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
