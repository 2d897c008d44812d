//! Dashboard aggregation. Everything here is derived per request from flat
//! tender/milestone rows; there is no cache to invalidate.

use chrono::{DateTime, Utc};
use db::models::{
    dashboard_settings::{DEFAULT_SCOPE, DashboardSettings},
    milestone::MilestoneWithTender,
    tender::{Tender, TenderStatus},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use thiserror::Error;
use ts_rs::TS;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct StatusCount {
    pub status: TenderStatus,
    pub count: i64,
}

/// Counts for one calendar month, keyed "YYYY-MM".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct MonthlyCounts {
    pub month: String,
    pub created: i64,
    pub won: i64,
    pub lost: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpcomingMilestone {
    #[serde(flatten)]
    #[ts(flatten)]
    pub entry: MilestoneWithTender,
    pub overdue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DashboardSummary {
    pub status_counts: Vec<StatusCount>,
    pub monthly: Vec<MonthlyCounts>,
    pub success_rate: f64,
    pub upcoming_milestones: Vec<UpcomingMilestone>,
}

/// won / (won + lost) × 100, with 0 when nothing has been decided yet.
pub fn success_rate(won: i64, lost: i64) -> f64 {
    let decided = won + lost;
    if decided == 0 {
        return 0.0;
    }
    won as f64 / decided as f64 * 100.0
}

fn month_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

/// Per-status counts across every status, including zeroes, in enum order.
pub fn count_by_status(tenders: &[Tender]) -> Vec<StatusCount> {
    use TenderStatus::*;
    [
        Draft,
        Preparing,
        Submitted,
        UnderEvaluation,
        Clarification,
        Won,
        Lost,
        Cancelled,
    ]
    .into_iter()
    .map(|status| StatusCount {
        count: tenders.iter().filter(|t| t.status == status).count() as i64,
        status,
    })
    .collect()
}

/// Monthly created/won/lost counts, oldest month first. Creation buckets by
/// created_at; wins and losses bucket by the decision timestamp.
pub fn count_by_month(tenders: &[Tender]) -> Vec<MonthlyCounts> {
    fn entry(months: &mut BTreeMap<String, MonthlyCounts>, key: String) -> &mut MonthlyCounts {
        months.entry(key.clone()).or_insert_with(|| MonthlyCounts {
            month: key,
            created: 0,
            won: 0,
            lost: 0,
        })
    }

    let mut months: BTreeMap<String, MonthlyCounts> = BTreeMap::new();
    for tender in tenders {
        entry(&mut months, month_key(tender.created_at)).created += 1;
        if let Some(decided_at) = tender.decided_at {
            match tender.status {
                TenderStatus::Won => entry(&mut months, month_key(decided_at)).won += 1,
                TenderStatus::Lost => entry(&mut months, month_key(decided_at)).lost += 1,
                _ => {}
            }
        }
    }

    months.into_values().collect()
}

/// Flag entries whose due date has passed relative to `now`.
pub fn flag_overdue(
    entries: Vec<MilestoneWithTender>,
    now: DateTime<Utc>,
) -> Vec<UpcomingMilestone> {
    entries
        .into_iter()
        .map(|entry| {
            let overdue = entry
                .milestone
                .due_date
                .is_some_and(|due| due < now);
            UpcomingMilestone { entry, overdue }
        })
        .collect()
}

pub struct DashboardService;

impl DashboardService {
    /// Build the full dashboard summary for a settings scope, evaluated at
    /// request time.
    pub async fn summary(pool: &SqlitePool) -> Result<DashboardSummary, DashboardError> {
        let tenders = Tender::find_all(pool).await?;
        let limit = DashboardSettings::upcoming_limit_for(pool, DEFAULT_SCOPE).await?;
        let upcoming =
            db::models::milestone::Milestone::find_upcoming(pool, limit as i64).await?;

        let status_counts = count_by_status(&tenders);
        let won = status_counts
            .iter()
            .find(|c| c.status == TenderStatus::Won)
            .map_or(0, |c| c.count);
        let lost = status_counts
            .iter()
            .find(|c| c.status == TenderStatus::Lost)
            .map_or(0, |c| c.count);

        Ok(DashboardSummary {
            monthly: count_by_month(&tenders),
            success_rate: success_rate(won, lost),
            upcoming_milestones: flag_overdue(upcoming, Utc::now()),
            status_counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use db::models::milestone::{Milestone, MilestoneStatus};
    use uuid::Uuid;

    fn tender(status: TenderStatus, created: &str, decided: Option<&str>) -> Tender {
        let parse = |s: &str| {
            Utc.with_ymd_and_hms(
                s[0..4].parse().unwrap(),
                s[5..7].parse().unwrap(),
                1,
                12,
                0,
                0,
            )
            .unwrap()
        };
        Tender {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            reference_number: None,
            portal_reference: None,
            client_id: None,
            client_name: None,
            status,
            submission_deadline: None,
            decided_at: decided.map(parse),
            budget: None,
            notes: None,
            created_at: parse(created),
            updated_at: parse(created),
        }
    }

    #[test]
    fn success_rate_is_zero_when_nothing_decided() {
        assert_eq!(success_rate(0, 0), 0.0);
        assert_eq!(success_rate(3, 1), 75.0);
        assert_eq!(success_rate(0, 4), 0.0);
    }

    #[test]
    fn status_counts_cover_all_statuses_with_zeroes() {
        let tenders = vec![
            tender(TenderStatus::Draft, "2026-01", None),
            tender(TenderStatus::Won, "2026-01", Some("2026-02")),
        ];
        let counts = count_by_status(&tenders);
        assert_eq!(counts.len(), 8);
        let get = |s: TenderStatus| counts.iter().find(|c| c.status == s).unwrap().count;
        assert_eq!(get(TenderStatus::Draft), 1);
        assert_eq!(get(TenderStatus::Won), 1);
        assert_eq!(get(TenderStatus::Lost), 0);
    }

    #[test]
    fn monthly_counts_bucket_wins_by_decision_month() {
        let tenders = vec![
            tender(TenderStatus::Won, "2026-01", Some("2026-02")),
            tender(TenderStatus::Lost, "2026-01", Some("2026-01")),
            tender(TenderStatus::Draft, "2026-02", None),
        ];
        let monthly = count_by_month(&tenders);
        assert_eq!(
            monthly,
            vec![
                MonthlyCounts {
                    month: "2026-01".to_string(),
                    created: 2,
                    won: 0,
                    lost: 1,
                },
                MonthlyCounts {
                    month: "2026-02".to_string(),
                    created: 1,
                    won: 1,
                    lost: 0,
                },
            ]
        );
    }

    #[test]
    fn overdue_compares_due_date_to_now() {
        let now = Utc.with_ymd_and_hms(2026, 6, 15, 0, 0, 0).unwrap();
        let entry = |due: Option<DateTime<Utc>>| MilestoneWithTender {
            milestone: Milestone {
                id: Uuid::new_v4(),
                tender_id: Uuid::new_v4(),
                title: "m".to_string(),
                status: MilestoneStatus::Pending,
                sequence_number: None,
                due_date: due,
                completed_at: None,
                assignee_names: None,
                notes: None,
                created_at: now,
                updated_at: now,
            },
            tender_title: "t".to_string(),
        };
        let flagged = flag_overdue(
            vec![
                entry(Some(Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap())),
                entry(Some(Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap())),
                entry(None),
            ],
            now,
        );
        assert!(flagged[0].overdue);
        assert!(!flagged[1].overdue);
        assert!(!flagged[2].overdue);
    }
}
