use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

pub const DEFAULT_SCOPE: &str = "default";
pub const DEFAULT_UPCOMING_LIMIT: i32 = 10;

/// Per-scope dashboard preferences; one row per scope, upserted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct DashboardSettings {
    pub id: Uuid,
    pub scope: String,
    pub show_status_cards: bool,
    pub show_monthly_chart: bool,
    pub show_upcoming: bool,
    pub upcoming_limit: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateDashboardSettings {
    pub show_status_cards: bool,
    pub show_monthly_chart: bool,
    pub show_upcoming: bool,
    pub upcoming_limit: i32,
}

impl DashboardSettings {
    pub async fn find_by_scope(
        pool: &SqlitePool,
        scope: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, scope, show_status_cards, show_monthly_chart, show_upcoming,
                      upcoming_limit, created_at, updated_at
               FROM dashboard_settings
               WHERE scope = $1"#,
        )
        .bind(scope)
        .fetch_optional(pool)
        .await
    }

    pub async fn create_or_update(
        pool: &SqlitePool,
        scope: &str,
        data: &UpdateDashboardSettings,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO dashboard_settings (id, scope, show_status_cards, show_monthly_chart,
                                               show_upcoming, upcoming_limit)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT(scope) DO UPDATE SET
                   show_status_cards = excluded.show_status_cards,
                   show_monthly_chart = excluded.show_monthly_chart,
                   show_upcoming = excluded.show_upcoming,
                   upcoming_limit = excluded.upcoming_limit,
                   updated_at = datetime('now', 'subsec')
               RETURNING id, scope, show_status_cards, show_monthly_chart, show_upcoming,
                         upcoming_limit, created_at, updated_at"#,
        )
        .bind(id)
        .bind(scope)
        .bind(data.show_status_cards)
        .bind(data.show_monthly_chart)
        .bind(data.show_upcoming)
        .bind(data.upcoming_limit)
        .fetch_one(pool)
        .await
    }

    /// The effective upcoming-milestone cap for a scope, defaulting when no
    /// row exists. Stored values are clamped so a zero or negative limit
    /// cannot turn into an unbounded SQLite LIMIT.
    pub async fn upcoming_limit_for(
        pool: &SqlitePool,
        scope: &str,
    ) -> Result<i32, sqlx::Error> {
        Ok(Self::find_by_scope(pool, scope)
            .await?
            .map(|s| s.upcoming_limit)
            .unwrap_or(DEFAULT_UPCOMING_LIMIT)
            .clamp(1, 500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn upsert_keeps_one_row_per_scope() {
        let db = DBService::new_in_memory().await.unwrap();
        let first = DashboardSettings::create_or_update(
            &db.pool,
            DEFAULT_SCOPE,
            &UpdateDashboardSettings {
                show_status_cards: true,
                show_monthly_chart: true,
                show_upcoming: true,
                upcoming_limit: 10,
            },
        )
        .await
        .unwrap();

        let second = DashboardSettings::create_or_update(
            &db.pool,
            DEFAULT_SCOPE,
            &UpdateDashboardSettings {
                show_status_cards: false,
                show_monthly_chart: true,
                show_upcoming: true,
                upcoming_limit: 5,
            },
        )
        .await
        .unwrap();

        assert_eq!(first.id, second.id);
        assert!(!second.show_status_cards);
        assert_eq!(
            DashboardSettings::upcoming_limit_for(&db.pool, DEFAULT_SCOPE)
                .await
                .unwrap(),
            5
        );
        assert_eq!(
            DashboardSettings::upcoming_limit_for(&db.pool, "other")
                .await
                .unwrap(),
            DEFAULT_UPCOMING_LIMIT
        );
    }

    #[tokio::test]
    async fn stored_limits_are_clamped_to_a_sane_range() {
        let db = DBService::new_in_memory().await.unwrap();
        for (stored, effective) in [(-1, 1), (0, 1), (25, 25), (10_000, 500)] {
            DashboardSettings::create_or_update(
                &db.pool,
                DEFAULT_SCOPE,
                &UpdateDashboardSettings {
                    show_status_cards: true,
                    show_monthly_chart: true,
                    show_upcoming: true,
                    upcoming_limit: stored,
                },
            )
            .await
            .unwrap();

            assert_eq!(
                DashboardSettings::upcoming_limit_for(&db.pool, DEFAULT_SCOPE)
                    .await
                    .unwrap(),
                effective
            );
        }
    }
}
