// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for cross-crate integration testing.
//!
//! `TestHarness` assembles a temp-file SQLite store, a fixed-key cipher, a
//! low-cost secret gate and a static identity table with three users
//! (`alice`, `bob`, `mallory`).

use std::sync::Arc;

use secrecy::SecretString;
use toolvault_config::{IdentityConfig, SharingConfig, StaticUserConfig, StorageConfig};
use toolvault_core::{CredentialRecord, Identity, StorageAdapter, Tool, ToolvaultError};
use toolvault_sharing::{
    CredentialStore, NewCredential, NewTool, ShareManager, StaticIdentityProvider, ToolAdmin,
};
use toolvault_storage::SqliteStorage;
use toolvault_vault::{Cipher, SecretGate};

pub const ALICE_TOKEN: &str = "alice-test-token";
pub const BOB_TOKEN: &str = "bob-test-token";
pub const MALLORY_TOKEN: &str = "mallory-test-token";

const TEST_KEY: &str = "dGVzdC1rZXktdGVzdC1rZXktdGVzdC1rZXktMTIzNDU=";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    users: Vec<StaticUserConfig>,
    sharing: SharingConfig,
    encryption_key: String,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let user = |token: &str, id: &str| StaticUserConfig {
            token: token.to_string(),
            user_id: id.to_string(),
            email: Some(format!("{id}@example.com")),
        };
        Self {
            users: vec![
                user(ALICE_TOKEN, "alice"),
                user(BOB_TOKEN, "bob"),
                user(MALLORY_TOKEN, "mallory"),
            ],
            // Argon2 at the floor so secret-gated tests stay fast.
            sharing: SharingConfig {
                kdf_memory_cost: 1024,
                kdf_iterations: 1,
                ..SharingConfig::default()
            },
            encryption_key: TEST_KEY.to_string(),
        }
    }

    /// Add another bearer-token user.
    pub fn with_user(mut self, token: &str, user_id: &str) -> Self {
        self.users.push(StaticUserConfig {
            token: token.to_string(),
            user_id: user_id.to_string(),
            email: None,
        });
        self
    }

    /// Override share link settings.
    pub fn with_sharing(mut self, sharing: SharingConfig) -> Self {
        self.sharing = sharing;
        self
    }

    /// Use a different field encryption secret.
    pub fn with_encryption_key(mut self, key: &str) -> Self {
        self.encryption_key = key.to_string();
        self
    }

    pub async fn build(self) -> Result<TestHarness, ToolvaultError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| ToolvaultError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await?;

        let identity = StaticIdentityProvider::new(&IdentityConfig { users: self.users });

        Ok(TestHarness {
            storage: Arc::new(storage),
            cipher: Arc::new(Cipher::from_secret(self.encryption_key)),
            gate: Arc::new(SecretGate::new(&self.sharing)),
            identity: Arc::new(identity),
            sharing: self.sharing,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment backed by a temp database.
pub struct TestHarness {
    /// SQLite storage (temp DB, removed on drop).
    pub storage: Arc<SqliteStorage>,
    pub cipher: Arc<Cipher>,
    pub gate: Arc<SecretGate>,
    pub identity: Arc<StaticIdentityProvider>,
    pub sharing: SharingConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default users and settings.
    pub async fn new() -> Result<Self, ToolvaultError> {
        Self::builder().build().await
    }

    pub fn dyn_storage(&self) -> Arc<dyn StorageAdapter + Send + Sync> {
        self.storage.clone()
    }

    pub fn tool_admin(&self) -> ToolAdmin {
        ToolAdmin::new(self.dyn_storage())
    }

    pub fn credentials(&self) -> CredentialStore {
        CredentialStore::new(self.dyn_storage(), Arc::clone(&self.cipher))
    }

    pub fn shares(&self) -> ShareManager {
        ShareManager::new(
            self.dyn_storage(),
            Arc::clone(&self.cipher),
            Arc::clone(&self.gate),
            self.sharing.clone(),
        )
    }

    pub fn alice(&self) -> Identity {
        Identity::new("alice", Some("alice@example.com".into()))
    }

    pub fn bob(&self) -> Identity {
        Identity::new("bob", Some("bob@example.com".into()))
    }

    pub fn mallory(&self) -> Identity {
        Identity::new("mallory", Some("mallory@example.com".into()))
    }

    /// Create a tool owned by `owner`.
    pub async fn seed_tool(&self, owner: &Identity, name: &str) -> Result<Tool, ToolvaultError> {
        self.tool_admin()
            .create_tool(
                owner,
                NewTool {
                    name: name.to_string(),
                    url: Some(format!("https://{}.example.com", name.to_ascii_lowercase())),
                    ..NewTool::default()
                },
            )
            .await
    }

    /// Store a credential on `tool_id` as `owner`.
    pub async fn seed_credential(
        &self,
        owner: &Identity,
        tool_id: &str,
        username: &str,
        password: &str,
    ) -> Result<CredentialRecord, ToolvaultError> {
        self.credentials()
            .create(
                owner,
                NewCredential {
                    tool_id: tool_id.to_string(),
                    label: Some("primary".to_string()),
                    username: SecretString::from(username.to_string()),
                    password: SecretString::from(password.to_string()),
                },
            )
            .await
    }
}
