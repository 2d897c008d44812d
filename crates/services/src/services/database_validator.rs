//! Startup check that the schema the services expect actually exists.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

/// Tables every service in this workspace reads or writes.
pub const REQUIRED_TABLES: &[&str] = &[
    "tenders",
    "milestones",
    "milestone_templates",
    "clients",
    "tender_documents",
    "document_versions",
    "document_comments",
    "document_approvals",
    "activity_logs",
    "dashboard_settings",
];

#[derive(Debug, Error)]
pub enum DatabaseValidationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("missing tables: {0}")]
    MissingTables(String),
}

/// Result of database validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_initialized: bool,
    pub migrations_applied: usize,
    pub warnings: Vec<String>,
}

pub struct DatabaseValidator {
    pool: SqlitePool,
}

impl DatabaseValidator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Check that migrations ran and every required table exists.
    pub async fn validate(&self) -> Result<ValidationResult, DatabaseValidationError> {
        let migrations_table_exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'",
        )
        .fetch_one(&self.pool)
        .await?
            > 0;

        if !migrations_table_exists {
            warn!("database not initialized - _sqlx_migrations table does not exist");
            return Ok(ValidationResult {
                is_initialized: false,
                migrations_applied: 0,
                warnings: vec!["Database has not been initialized. Run migrations.".to_string()],
            });
        }

        let migrations_applied = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        let missing = self.missing_tables().await?;
        if !missing.is_empty() {
            return Err(DatabaseValidationError::MissingTables(missing.join(", ")));
        }

        info!(migrations_applied, "database validation complete");

        Ok(ValidationResult {
            is_initialized: true,
            migrations_applied: migrations_applied as usize,
            warnings: vec![],
        })
    }

    async fn missing_tables(&self) -> Result<Vec<String>, DatabaseValidationError> {
        let mut missing = Vec::new();
        for table in REQUIRED_TABLES {
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
            )
            .bind(table)
            .fetch_one(&self.pool)
            .await?
                > 0;
            if !exists {
                missing.push(table.to_string());
            }
        }
        Ok(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::DBService;

    #[tokio::test]
    async fn migrated_database_passes_validation() {
        let db = DBService::new_in_memory().await.unwrap();
        let result = DatabaseValidator::new(db.pool.clone())
            .validate()
            .await
            .unwrap();
        assert!(result.is_initialized);
        assert!(result.migrations_applied >= 1);
        assert!(result.warnings.is_empty());
    }
}
