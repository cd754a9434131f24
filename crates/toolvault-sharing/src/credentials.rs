// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential store facade: authorize, then encrypt on write and decrypt on read.
//!
//! Authorization and validation happen before any cipher call or write, so
//! a rejected request has no side effects.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use toolvault_core::{
    AccessLevel, CredentialPatch, CredentialRecord, Identity, StorageAdapter, ToolvaultError,
};
use toolvault_vault::Cipher;
use tracing::{error, info};

use crate::access::AccessGuard;

/// Input for [`CredentialStore::create`].
#[derive(Debug)]
pub struct NewCredential {
    pub tool_id: String,
    pub label: Option<String>,
    pub username: SecretString,
    pub password: SecretString,
}

/// Input for [`CredentialStore::update`]. Omitted fields are left untouched.
#[derive(Debug, Default)]
pub struct CredentialUpdate {
    pub id: String,
    /// `Some(None)` clears the label.
    pub label: Option<Option<String>>,
    pub username: Option<SecretString>,
    pub password: Option<SecretString>,
}

/// A decrypted credential as returned to an authorized caller.
#[derive(Debug)]
pub struct CredentialView {
    pub id: String,
    pub tool_id: String,
    pub label: Option<String>,
    pub username: SecretString,
    pub password: SecretString,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Encrypted credential storage gated by [`AccessGuard`].
pub struct CredentialStore {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    guard: AccessGuard,
    cipher: Arc<Cipher>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn StorageAdapter + Send + Sync>, cipher: Arc<Cipher>) -> Self {
        Self {
            guard: AccessGuard::new(Arc::clone(&storage)),
            storage,
            cipher,
        }
    }

    /// Store a new credential on a tool the caller owns or was granted.
    pub async fn create(
        &self,
        identity: &Identity,
        input: NewCredential,
    ) -> Result<CredentialRecord, ToolvaultError> {
        if input.tool_id.is_empty()
            || input.username.expose_secret().is_empty()
            || input.password.expose_secret().is_empty()
        {
            return Err(ToolvaultError::validation(
                "tool_id, username and password are required",
            ));
        }

        self.guard
            .authorize(identity, &input.tool_id, AccessLevel::OwnerOrGrantee)
            .await?;

        let record = CredentialRecord {
            id: uuid::Uuid::new_v4().to_string(),
            tool_id: input.tool_id,
            label: input.label,
            encrypted_username: self.cipher.encrypt(input.username.expose_secret())?,
            encrypted_password: self.cipher.encrypt(input.password.expose_secret())?,
            created_by: identity.user_id.clone(),
            created_at: Utc::now(),
        };
        self.storage.insert_credential(&record).await?;

        info!(
            credential_id = %record.id,
            tool_id = %record.tool_id,
            user_id = %identity.user_id,
            "credential created"
        );
        Ok(record)
    }

    /// List and decrypt every credential of a tool.
    pub async fn list(
        &self,
        identity: &Identity,
        tool_id: &str,
    ) -> Result<Vec<CredentialView>, ToolvaultError> {
        if tool_id.is_empty() {
            return Err(ToolvaultError::validation("tool_id required"));
        }

        self.guard
            .authorize(identity, tool_id, AccessLevel::OwnerOrGrantee)
            .await?;

        let rows = self.storage.list_credentials(tool_id).await?;
        rows.into_iter().map(|row| self.reveal(row)).collect()
    }

    /// Apply a partial update. Only supplied secrets are re-encrypted.
    pub async fn update(
        &self,
        identity: &Identity,
        update: CredentialUpdate,
    ) -> Result<(), ToolvaultError> {
        if update.id.is_empty() {
            return Err(ToolvaultError::validation("id required"));
        }

        let existing = self
            .storage
            .get_credential(&update.id)
            .await?
            .ok_or(ToolvaultError::NotFound { entity: "credential" })?;
        self.guard
            .authorize(identity, &existing.tool_id, AccessLevel::OwnerOrGrantee)
            .await?;

        let patch = CredentialPatch {
            label: update.label,
            encrypted_username: update
                .username
                .map(|u| self.cipher.encrypt(u.expose_secret()))
                .transpose()?,
            encrypted_password: update
                .password
                .map(|p| self.cipher.encrypt(p.expose_secret()))
                .transpose()?,
        };
        if patch.is_empty() {
            return Ok(());
        }

        if !self.storage.update_credential(&update.id, &patch).await? {
            return Err(ToolvaultError::NotFound { entity: "credential" });
        }
        info!(
            credential_id = %update.id,
            user_id = %identity.user_id,
            username_changed = patch.encrypted_username.is_some(),
            password_changed = patch.encrypted_password.is_some(),
            "credential updated"
        );
        Ok(())
    }

    /// Delete a credential. Share links pointing at it stop resolving.
    pub async fn delete(&self, identity: &Identity, id: &str) -> Result<(), ToolvaultError> {
        if id.is_empty() {
            return Err(ToolvaultError::validation("id required"));
        }

        let existing = self
            .storage
            .get_credential(id)
            .await?
            .ok_or(ToolvaultError::NotFound { entity: "credential" })?;
        self.guard
            .authorize(identity, &existing.tool_id, AccessLevel::OwnerOrGrantee)
            .await?;

        if !self.storage.delete_credential(id).await? {
            return Err(ToolvaultError::NotFound { entity: "credential" });
        }
        info!(credential_id = %id, user_id = %identity.user_id, "credential deleted");
        Ok(())
    }

    fn reveal(&self, row: CredentialRecord) -> Result<CredentialView, ToolvaultError> {
        let decrypt = |field: &str| {
            self.cipher.decrypt(field).inspect_err(|_| {
                error!(credential_id = %row.id, "stored credential failed authentication");
            })
        };
        let username = SecretString::from(decrypt(&row.encrypted_username)?);
        let password = SecretString::from(decrypt(&row.encrypted_password)?);
        Ok(CredentialView {
            id: row.id,
            tool_id: row.tool_id,
            label: row.label,
            username,
            password,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}
