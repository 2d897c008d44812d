use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A procuring entity. The milestone_info column holds free-text guidance
/// keyed by milestone title (e.g. submission portal quirks per stage).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub organization: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub milestone_info: Option<String>, // JSON object keyed by milestone title
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Parse the milestone_info JSON into a title → info map.
    pub fn milestone_info_map(&self) -> HashMap<String, String> {
        self.milestone_info
            .as_ref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default()
    }

    /// Look up the free-text info for a single milestone title.
    pub fn milestone_info_for(&self, title: &str) -> Option<String> {
        let mut map = self.milestone_info_map();
        map.remove(title)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateClient {
    pub name: String,
    pub organization: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub milestone_info: Option<HashMap<String, String>>,
}

#[derive(Debug, Default, Serialize, Deserialize, TS)]
pub struct UpdateClient {
    pub name: Option<String>,
    pub organization: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub milestone_info: Option<HashMap<String, String>>,
}

const CLIENT_COLUMNS: &str = r#"id, name, organization, contact_person, email, phone, address,
       notes, milestone_info, created_at, updated_at"#;

fn info_json(info: &Option<HashMap<String, String>>) -> Result<Option<String>, sqlx::Error> {
    info.as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| sqlx::Error::Protocol(e.to_string()))
}

impl Client {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY name ASC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateClient,
        client_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let milestone_info = info_json(&data.milestone_info)?;
        sqlx::query_as::<_, Self>(&format!(
            r#"INSERT INTO clients (id, name, organization, contact_person, email, phone,
                                    address, notes, milestone_info)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING {CLIENT_COLUMNS}"#
        ))
        .bind(client_id)
        .bind(&data.name)
        .bind(&data.organization)
        .bind(&data.contact_person)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .bind(&data.notes)
        .bind(milestone_info)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateClient,
    ) -> Result<Self, sqlx::Error> {
        let milestone_info = info_json(&data.milestone_info)?;
        sqlx::query_as::<_, Self>(&format!(
            r#"UPDATE clients
               SET name           = COALESCE($2, name),
                   organization   = COALESCE($3, organization),
                   contact_person = COALESCE($4, contact_person),
                   email          = COALESCE($5, email),
                   phone          = COALESCE($6, phone),
                   address        = COALESCE($7, address),
                   notes          = COALESCE($8, notes),
                   milestone_info = COALESCE($9, milestone_info),
                   updated_at     = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING {CLIENT_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.name)
        .bind(&data.organization)
        .bind(&data.contact_person)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .bind(&data.notes)
        .bind(milestone_info)
        .fetch_one(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn milestone_info_round_trips_and_is_looked_up_by_title() {
        let db = DBService::new_in_memory().await.unwrap();
        let mut info = HashMap::new();
        info.insert(
            "Submission".to_string(),
            "Portal closes at 14:00 local time".to_string(),
        );
        let data = CreateClient {
            name: "Harbour Authority".to_string(),
            organization: None,
            contact_person: Some("R. Okafor".to_string()),
            email: Some("procurement@harbour.example".to_string()),
            phone: None,
            address: None,
            notes: None,
            milestone_info: Some(info),
        };
        let id = Uuid::new_v4();
        let client = Client::create(&db.pool, &data, id).await.unwrap();

        assert_eq!(
            client.milestone_info_for("Submission").as_deref(),
            Some("Portal closes at 14:00 local time")
        );
        assert!(client.milestone_info_for("Award Decision").is_none());
    }
}
