use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::core::error::StorageError;
use crate::core::session::Profile;

const IDENTITY_KEY: &str = "userSession";
const PROFILE_KEY: &str = "profileCache";

/// Who is signed in on this device. Mirrors the `userSession` blob the web
/// client kept in browser storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub email: String,
    pub full_name: Option<String>,
    pub auth_token: Option<String>,
}

/// Key-value store for the identity blob and the profile fallback cache.
pub struct IdentityStore {
    pool: SqlitePool,
}

impl IdentityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn save_identity(&self, identity: &Identity) -> Result<(), StorageError> {
        self.put(IDENTITY_KEY, identity).await
    }

    pub async fn load_identity(&self) -> Result<Option<Identity>, StorageError> {
        Ok(self.get(IDENTITY_KEY).await?.map(|(identity, _)| identity))
    }

    pub async fn clear_identity(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM local_state WHERE key = ?")
            .bind(IDENTITY_KEY)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }

    /// Cache a freshly fetched profile for offline fallback.
    pub async fn save_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        self.put(PROFILE_KEY, profile).await
    }

    /// The cached profile and when it was stored. Callers surface the age as
    /// staleness; the cache itself never pretends to be fresh.
    pub async fn load_profile(&self) -> Result<Option<(Profile, DateTime<Utc>)>, StorageError> {
        self.get(PROFILE_KEY).await
    }

    async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        sqlx::query(
            "INSERT OR REPLACE INTO local_state (key, value, stored_at) VALUES (?, ?, ?)",
        )
        .bind(key)
        .bind(json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<(T, DateTime<Utc>)>, StorageError> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT value, stored_at FROM local_state WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StorageError::Database(e.to_string()))?;

        match row {
            Some((value, stored_at)) => {
                let parsed = serde_json::from_str(&value)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                let stored_at = DateTime::parse_from_rfc3339(&stored_at)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?
                    .with_timezone(&Utc);
                Ok(Some((parsed, stored_at)))
            }
            None => Ok(None),
        }
    }
}
