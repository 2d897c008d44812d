//! Milestone workflow: transition enforcement and template instantiation.

use db::models::{
    activity_log::{ActivityAction, ActivityLog},
    milestone::{CreateMilestone, Milestone, MilestoneStatus},
    milestone_template::MilestoneTemplate,
    tender::{Tender, TenderStatus},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("milestone not found")]
    MilestoneNotFound,
    #[error("tender not found")]
    TenderNotFound,
    #[error("cannot move milestone from {current} to {requested}")]
    InvalidTransition {
        current: MilestoneStatus,
        requested: MilestoneStatus,
    },
}

pub struct WorkflowService;

impl WorkflowService {
    /// Apply a requested milestone status change. Invalid transitions are
    /// rejected before any write; concurrent valid updates are last-write-wins.
    pub async fn apply_milestone_status(
        pool: &SqlitePool,
        milestone_id: Uuid,
        requested: MilestoneStatus,
        actor: Option<String>,
    ) -> Result<Milestone, WorkflowError> {
        let milestone = Milestone::find_by_id(pool, milestone_id)
            .await?
            .ok_or(WorkflowError::MilestoneNotFound)?;

        if !milestone.status.can_transition_to(requested) {
            warn!(
                milestone_id = %milestone_id,
                current = %milestone.status,
                requested = %requested,
                "rejected milestone transition"
            );
            return Err(WorkflowError::InvalidTransition {
                current: milestone.status,
                requested,
            });
        }

        let updated = Milestone::update_status(pool, milestone_id, requested).await?;

        ActivityLog::create(
            pool,
            Some(updated.tender_id),
            ActivityAction::MilestoneUpdated,
            Some(format!(
                "'{}' moved from {} to {}",
                updated.title, milestone.status, requested
            )),
            actor,
        )
        .await?;

        Ok(updated)
    }

    /// Apply a tender status change and record it.
    pub async fn apply_tender_status(
        pool: &SqlitePool,
        tender_id: Uuid,
        requested: TenderStatus,
        actor: Option<String>,
    ) -> Result<Tender, WorkflowError> {
        let tender = Tender::find_by_id(pool, tender_id)
            .await?
            .ok_or(WorkflowError::TenderNotFound)?;
        let previous = tender.status.clone();

        let updated = Tender::update_status(pool, tender_id, requested.clone()).await?;

        ActivityLog::create(
            pool,
            Some(tender_id),
            ActivityAction::StatusChanged,
            Some(format!(
                "'{}' moved from {} to {}",
                updated.title, previous, requested
            )),
            actor,
        )
        .await?;

        Ok(updated)
    }

    /// Instantiate the seeded workflow templates as pending milestones for a
    /// freshly created tender.
    pub async fn instantiate_templates(
        pool: &SqlitePool,
        tender_id: Uuid,
    ) -> Result<Vec<Milestone>, WorkflowError> {
        let templates = MilestoneTemplate::find_all(pool).await?;
        let mut milestones = Vec::with_capacity(templates.len());
        for template in templates {
            let data = CreateMilestone {
                title: template.title,
                status: None,
                sequence_number: Some(template.sequence_number),
                due_date: None,
                assignee_names: None,
                notes: None,
            };
            let milestone = Milestone::create(pool, tender_id, &data, Uuid::new_v4()).await?;
            milestones.push(milestone);
        }
        info!(tender_id = %tender_id, count = milestones.len(), "instantiated workflow milestones");
        Ok(milestones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::{
        DBService,
        models::tender::{CreateTender, Tender},
    };

    async fn db_with_tender() -> (DBService, Uuid) {
        let db = DBService::new_in_memory().await.unwrap();
        let tender_id = Uuid::new_v4();
        let data = CreateTender {
            title: "Bridge inspection services".to_string(),
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
        (db, tender_id)
    }

    #[tokio::test]
    async fn templates_become_pending_milestones_in_order() {
        let (db, tender_id) = db_with_tender().await;
        let milestones = WorkflowService::instantiate_templates(&db.pool, tender_id)
            .await
            .unwrap();
        assert_eq!(milestones.len(), 8);
        assert!(
            milestones
                .iter()
                .all(|m| m.status == MilestoneStatus::Pending)
        );
        assert_eq!(milestones[0].sequence_number, Some(1));
    }

    #[tokio::test]
    async fn completing_a_pending_milestone_is_rejected_without_a_write() {
        let (db, tender_id) = db_with_tender().await;
        let milestones = WorkflowService::instantiate_templates(&db.pool, tender_id)
            .await
            .unwrap();
        let target = &milestones[0];

        let err = WorkflowService::apply_milestone_status(
            &db.pool,
            target.id,
            MilestoneStatus::Completed,
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));

        let unchanged = Milestone::find_by_id(&db.pool, target.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.status, MilestoneStatus::Pending);
        assert!(unchanged.completed_at.is_none());
    }

    #[tokio::test]
    async fn in_progress_then_completed_stamps_completed_at() {
        let (db, tender_id) = db_with_tender().await;
        let milestones = WorkflowService::instantiate_templates(&db.pool, tender_id)
            .await
            .unwrap();
        let target = milestones[0].id;

        WorkflowService::apply_milestone_status(
            &db.pool,
            target,
            MilestoneStatus::InProgress,
            Some("dana".to_string()),
        )
        .await
        .unwrap();
        let completed = WorkflowService::apply_milestone_status(
            &db.pool,
            target,
            MilestoneStatus::Completed,
            Some("dana".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(completed.status, MilestoneStatus::Completed);
        assert!(completed.completed_at.is_some());

        // reopening clears the completion stamp
        let reopened = WorkflowService::apply_milestone_status(
            &db.pool,
            target,
            MilestoneStatus::Pending,
            None,
        )
        .await
        .unwrap();
        assert!(reopened.completed_at.is_none());

        let feed = ActivityLog::find_by_tender_id(&db.pool, tender_id, 10)
            .await
            .unwrap();
        assert_eq!(feed.len(), 3);
        assert!(feed.iter().all(|e| e.action == ActivityAction::MilestoneUpdated));
    }
}
