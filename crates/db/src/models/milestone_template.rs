use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Fixed workflow stage seeded by migration; instantiated into milestones
/// when a tender is created.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct MilestoneTemplate {
    pub id: Uuid,
    pub title: String,
    pub sequence_number: i32,
    pub created_at: DateTime<Utc>,
}

impl MilestoneTemplate {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, title, sequence_number, created_at
               FROM milestone_templates
               ORDER BY sequence_number ASC"#,
        )
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn seeded_workflow_has_eight_ordered_stages() {
        let db = DBService::new_in_memory().await.unwrap();
        let templates = MilestoneTemplate::find_all(&db.pool).await.unwrap();
        assert_eq!(templates.len(), 8);
        assert_eq!(templates[0].title, "Tender Review");
        assert_eq!(templates[7].title, "Contract Signing");
        let sequences: Vec<i32> = templates.iter().map(|t| t.sequence_number).collect();
        assert_eq!(sequences, (1..=8).collect::<Vec<_>>());
    }
}
