use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Row, Sqlite, SqlitePool, Type, sqlite::SqliteRow};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString,
    Display, Default,
)]
#[sqlx(type_name = "milestone_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MilestoneStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Skipped,
}

impl MilestoneStatus {
    /// Workflow transition table. Re-evaluated on every requested change;
    /// the only memory is the current status field.
    ///
    /// - pending and in_progress are always reachable (reopening a stage)
    /// - completed requires the stage to be in_progress
    /// - skipped requires the stage to still be pending
    pub fn can_transition_to(&self, next: MilestoneStatus) -> bool {
        match next {
            MilestoneStatus::Pending => true,
            MilestoneStatus::InProgress => true,
            MilestoneStatus::Completed => *self == MilestoneStatus::InProgress,
            MilestoneStatus::Skipped => *self == MilestoneStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Milestone {
    pub id: Uuid,
    pub tender_id: Uuid,
    pub title: String,
    pub status: MilestoneStatus,
    pub sequence_number: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub assignee_names: Option<String>, // JSON-serialized Vec<String>
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Milestone {
    /// Parse the assignee_names JSON into a name list.
    pub fn assignees(&self) -> Vec<String> {
        self.assignee_names
            .as_ref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default()
    }
}

/// A pending/in-progress milestone joined with its tender, as listed on the
/// dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct MilestoneWithTender {
    #[serde(flatten)]
    #[ts(flatten)]
    pub milestone: Milestone,
    pub tender_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateMilestone {
    pub title: String,
    pub status: Option<MilestoneStatus>,
    pub sequence_number: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
    pub assignee_names: Option<Vec<String>>,
    pub notes: Option<String>,
}

/// Partial update; status changes go through the workflow service instead.
#[derive(Debug, Default, Serialize, Deserialize, TS)]
pub struct UpdateMilestone {
    pub title: Option<String>,
    pub sequence_number: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
    pub assignee_names: Option<Vec<String>>,
    pub notes: Option<String>,
}

/// Sort for display: by sequence number ascending, missing numbers first as
/// zero. Stable, so equal keys keep their relative order.
pub fn sort_by_sequence(milestones: &mut [Milestone]) {
    milestones.sort_by_key(|m| m.sequence_number.unwrap_or(0));
}

/// Share of completed milestones, as a whole percentage. Empty lists are 0.
pub fn progress_percent(milestones: &[Milestone]) -> u8 {
    if milestones.is_empty() {
        return 0;
    }
    let completed = milestones
        .iter()
        .filter(|m| m.status == MilestoneStatus::Completed)
        .count();
    (completed * 100 / milestones.len()) as u8
}

const MILESTONE_COLUMNS: &str = r#"id, tender_id, title, status, sequence_number, due_date,
       completed_at, assignee_names, notes, created_at, updated_at"#;

impl Milestone {
    pub async fn find_by_tender_id(
        pool: &SqlitePool,
        tender_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            r#"SELECT {MILESTONE_COLUMNS}
               FROM milestones
               WHERE tender_id = $1
               ORDER BY COALESCE(sequence_number, 0) ASC, created_at ASC"#
        ))
        .bind(tender_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {MILESTONE_COLUMNS} FROM milestones WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        tender_id: Uuid,
        data: &CreateMilestone,
        milestone_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let status = data.status.unwrap_or_default();
        let assignees_json = data
            .assignee_names
            .as_ref()
            .map(|names| serde_json::to_string(names))
            .transpose()
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        sqlx::query_as::<_, Self>(&format!(
            r#"INSERT INTO milestones (id, tender_id, title, status, sequence_number, due_date,
                                       assignee_names, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING {MILESTONE_COLUMNS}"#
        ))
        .bind(milestone_id)
        .bind(tender_id)
        .bind(&data.title)
        .bind(status)
        .bind(data.sequence_number)
        .bind(data.due_date)
        .bind(assignees_json)
        .bind(&data.notes)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateMilestone,
    ) -> Result<Self, sqlx::Error> {
        let assignees_json = data
            .assignee_names
            .as_ref()
            .map(|names| serde_json::to_string(names))
            .transpose()
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        sqlx::query_as::<_, Self>(&format!(
            r#"UPDATE milestones
               SET title           = COALESCE($2, title),
                   sequence_number = COALESCE($3, sequence_number),
                   due_date        = COALESCE($4, due_date),
                   assignee_names  = COALESCE($5, assignee_names),
                   notes           = COALESCE($6, notes),
                   updated_at      = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {MILESTONE_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.title)
        .bind(data.sequence_number)
        .bind(data.due_date)
        .bind(assignees_json)
        .bind(&data.notes)
        .fetch_one(pool)
        .await
    }

    /// Write the new status, stamping completed_at on completion and
    /// clearing it otherwise. Transition validation happens in the workflow
    /// service before this is called.
    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        status: MilestoneStatus,
    ) -> Result<Self, sqlx::Error> {
        if status == MilestoneStatus::Completed {
            sqlx::query_as::<_, Self>(&format!(
                r#"UPDATE milestones
                   SET status = $2,
                       completed_at = datetime('now', 'subsec'),
                       updated_at = datetime('now', 'subsec')
                   WHERE id = $1
                   RETURNING {MILESTONE_COLUMNS}"#
            ))
            .bind(id)
            .bind(status)
            .fetch_one(pool)
            .await
        } else {
            sqlx::query_as::<_, Self>(&format!(
                r#"UPDATE milestones
                   SET status = $2,
                       completed_at = NULL,
                       updated_at = datetime('now', 'subsec')
                   WHERE id = $1
                   RETURNING {MILESTONE_COLUMNS}"#
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
        let result = sqlx::query("DELETE FROM milestones WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Pending and in-progress milestones with a due date, soonest first,
    /// joined with their tender's title. The dashboard caps and flags them.
    pub async fn find_upcoming(
        pool: &SqlitePool,
        limit: i64,
    ) -> Result<Vec<MilestoneWithTender>, sqlx::Error> {
        let rows = sqlx::query(
            r#"SELECT m.id, m.tender_id, m.title, m.status, m.sequence_number, m.due_date,
                      m.completed_at, m.assignee_names, m.notes, m.created_at, m.updated_at,
                      t.title AS tender_title
               FROM milestones m
               JOIN tenders t ON t.id = m.tender_id
               WHERE m.status IN ('pending', 'in_progress')
                 AND m.due_date IS NOT NULL
               ORDER BY m.due_date ASC
               LIMIT $1"#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        rows.into_iter()
            .map(|row: SqliteRow| {
                let milestone = Milestone::from_row(&row)?;
                let tender_title: String = row.try_get("tender_title")?;
                Ok(MilestoneWithTender {
                    milestone,
                    tender_title,
                })
            })
            .collect()
    }
}
