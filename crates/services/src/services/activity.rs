//! Thin wrapper over the persisted activity feed.

use db::models::activity_log::{ActivityAction, ActivityLog};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_FEED_LIMIT: i64 = 50;

#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct ActivityService;

impl ActivityService {
    pub async fn record(
        pool: &SqlitePool,
        tender_id: Option<Uuid>,
        action: ActivityAction,
        detail: impl Into<String>,
        actor: Option<String>,
    ) -> Result<ActivityLog, ActivityError> {
        let detail = detail.into();
        debug!(?tender_id, %action, detail, "recording activity");
        Ok(ActivityLog::create(pool, tender_id, action, Some(detail), actor).await?)
    }

    pub async fn feed(
        pool: &SqlitePool,
        limit: Option<i64>,
    ) -> Result<Vec<ActivityLog>, ActivityError> {
        let limit = limit.unwrap_or(DEFAULT_FEED_LIMIT).clamp(1, 500);
        Ok(ActivityLog::find_latest(pool, limit).await?)
    }

    pub async fn feed_for_tender(
        pool: &SqlitePool,
        tender_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<ActivityLog>, ActivityError> {
        let limit = limit.unwrap_or(DEFAULT_FEED_LIMIT).clamp(1, 500);
        Ok(ActivityLog::find_by_tender_id(pool, tender_id, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::DBService;

    #[tokio::test]
    async fn feed_is_newest_first_and_capped() {
        let db = DBService::new_in_memory().await.unwrap();
        for i in 0..5 {
            ActivityService::record(
                &db.pool,
                None,
                ActivityAction::TenderCreated,
                format!("tender {i}"),
                None,
            )
            .await
            .unwrap();
        }
        let feed = ActivityService::feed(&db.pool, Some(3)).await.unwrap();
        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0].detail.as_deref(), Some("tender 4"));
    }
}
