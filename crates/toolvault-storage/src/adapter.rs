// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use toolvault_config::model::StorageConfig;
use toolvault_core::types::{
    CredentialPatch, CredentialRecord, ShareAccessLog, ShareTokenRecord, Tool, ToolAccess,
    ToolPatch,
};
use toolvault_core::{AdapterType, HealthStatus, PluginAdapter, StorageAdapter, ToolvaultError};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already-open database (e.g. in-memory for tests).
    pub fn from_database(db: Database) -> Self {
        Self {
            config: StorageConfig {
                database_path: ":memory:".to_string(),
                wal_mode: false,
            },
            db: OnceCell::from(db),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, ToolvaultError> {
        self.db.get().ok_or_else(|| ToolvaultError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Number of (successful, failed) resolution attempts logged for a share.
    pub async fn access_log_counts(&self, share_token_id: &str) -> Result<(u32, u32), ToolvaultError> {
        queries::shares::access_log_counts(self.db()?, share_token_id).await
    }

    async fn checkpoint(&self, db: &Database) -> Result<(), ToolvaultError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ToolvaultError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("storage not initialized".to_string()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ToolvaultError> {
        if let Some(db) = self.db.get() {
            self.checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), ToolvaultError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| ToolvaultError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ToolvaultError> {
        let db = self.db()?;
        self.checkpoint(db).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Tools and grants ---

    async fn create_tool(&self, tool: &Tool) -> Result<(), ToolvaultError> {
        queries::tools::create_tool(self.db()?, tool).await
    }

    async fn get_tool(&self, id: &str) -> Result<Option<Tool>, ToolvaultError> {
        queries::tools::get_tool(self.db()?, id).await
    }

    async fn tool_access(
        &self,
        tool_id: &str,
        user_id: &str,
    ) -> Result<Option<ToolAccess>, ToolvaultError> {
        queries::tools::tool_access(self.db()?, tool_id, user_id).await
    }

    async fn update_tool(&self, id: &str, patch: &ToolPatch) -> Result<bool, ToolvaultError> {
        queries::tools::update_tool(self.db()?, id, patch).await
    }

    async fn delete_tool(&self, id: &str) -> Result<bool, ToolvaultError> {
        queries::tools::delete_tool(self.db()?, id).await
    }

    async fn grant_access(&self, tool_id: &str, user_id: &str) -> Result<(), ToolvaultError> {
        queries::tools::grant_access(self.db()?, tool_id, user_id).await
    }

    async fn revoke_access(&self, tool_id: &str, user_id: &str) -> Result<bool, ToolvaultError> {
        queries::tools::revoke_access(self.db()?, tool_id, user_id).await
    }

    // --- Credentials ---

    async fn insert_credential(&self, credential: &CredentialRecord) -> Result<(), ToolvaultError> {
        queries::credentials::insert_credential(self.db()?, credential).await
    }

    async fn get_credential(&self, id: &str) -> Result<Option<CredentialRecord>, ToolvaultError> {
        queries::credentials::get_credential(self.db()?, id).await
    }

    async fn list_credentials(&self, tool_id: &str) -> Result<Vec<CredentialRecord>, ToolvaultError> {
        queries::credentials::list_credentials(self.db()?, tool_id).await
    }

    async fn update_credential(
        &self,
        id: &str,
        patch: &CredentialPatch,
    ) -> Result<bool, ToolvaultError> {
        queries::credentials::update_credential(self.db()?, id, patch).await
    }

    async fn delete_credential(&self, id: &str) -> Result<bool, ToolvaultError> {
        queries::credentials::delete_credential(self.db()?, id).await
    }

    // --- Share tokens ---

    async fn insert_share_token(&self, token: &ShareTokenRecord) -> Result<(), ToolvaultError> {
        queries::shares::insert_share_token(self.db()?, token).await
    }

    async fn find_share_token(&self, token: &str) -> Result<Option<ShareTokenRecord>, ToolvaultError> {
        queries::shares::find_share_token(self.db()?, token).await
    }

    async fn consume_share_token(
        &self,
        id: &str,
        now: DateTime<Utc>,
        ip_address: Option<&str>,
    ) -> Result<bool, ToolvaultError> {
        queries::shares::consume_share_token(self.db()?, id, now, ip_address).await
    }

    async fn revoke_share_token(&self, id: &str) -> Result<bool, ToolvaultError> {
        queries::shares::revoke_share_token(self.db()?, id).await
    }

    async fn record_share_access(&self, entry: &ShareAccessLog) -> Result<(), ToolvaultError> {
        queries::shares::record_share_access(self.db()?, entry).await
    }
}
