// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the relational record store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ToolvaultError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    CredentialPatch, CredentialRecord, ShareAccessLog, ShareTokenRecord, Tool, ToolAccess,
    ToolPatch,
};

/// Adapter for the persistent store holding tools, grants, credentials,
/// share tokens and share access logs.
///
/// Point lookups and equality filters only. The one non-trivial requirement
/// is [`consume_share_token`](StorageAdapter::consume_share_token), which
/// must be an atomic conditional update.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), ToolvaultError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), ToolvaultError>;

    // --- Tools and grants ---

    async fn create_tool(&self, tool: &Tool) -> Result<(), ToolvaultError>;

    async fn get_tool(&self, id: &str) -> Result<Option<Tool>, ToolvaultError>;

    /// Reads a tool and the grant state of `user_id` on it in one consistent read.
    async fn tool_access(
        &self,
        tool_id: &str,
        user_id: &str,
    ) -> Result<Option<ToolAccess>, ToolvaultError>;

    /// Returns `false` when no tool matched.
    async fn update_tool(&self, id: &str, patch: &ToolPatch) -> Result<bool, ToolvaultError>;

    /// Deletes the tool along with its grants and credentials.
    async fn delete_tool(&self, id: &str) -> Result<bool, ToolvaultError>;

    /// Idempotent: granting twice keeps a single row.
    async fn grant_access(&self, tool_id: &str, user_id: &str) -> Result<(), ToolvaultError>;

    async fn revoke_access(&self, tool_id: &str, user_id: &str) -> Result<bool, ToolvaultError>;

    // --- Credentials ---

    async fn insert_credential(&self, credential: &CredentialRecord)
        -> Result<(), ToolvaultError>;

    async fn get_credential(&self, id: &str) -> Result<Option<CredentialRecord>, ToolvaultError>;

    async fn list_credentials(&self, tool_id: &str)
        -> Result<Vec<CredentialRecord>, ToolvaultError>;

    async fn update_credential(
        &self,
        id: &str,
        patch: &CredentialPatch,
    ) -> Result<bool, ToolvaultError>;

    async fn delete_credential(&self, id: &str) -> Result<bool, ToolvaultError>;

    // --- Share tokens ---

    async fn insert_share_token(&self, token: &ShareTokenRecord) -> Result<(), ToolvaultError>;

    async fn find_share_token(&self, token: &str)
        -> Result<Option<ShareTokenRecord>, ToolvaultError>;

    /// Atomically consumes one view of a share token.
    ///
    /// Increments `views` and, for one-time tokens, sets `revoked`, but only
    /// while the token is still unrevoked and unexpired at `now`. On success
    /// a successful access log entry is appended in the same transaction.
    /// Returns `false` when the conditional update matched no row.
    async fn consume_share_token(
        &self,
        id: &str,
        now: DateTime<Utc>,
        ip_address: Option<&str>,
    ) -> Result<bool, ToolvaultError>;

    /// Sets `revoked = true`. Returns `false` when no token matched.
    async fn revoke_share_token(&self, id: &str) -> Result<bool, ToolvaultError>;

    /// Appends a share access log entry.
    async fn record_share_access(&self, entry: &ShareAccessLog) -> Result<(), ToolvaultError>;
}
