// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static bearer-token identity provider built from `[[identity.users]]`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use toolvault_config::IdentityConfig;
use toolvault_core::{
    AdapterType, HealthStatus, Identity, IdentityProvider, PluginAdapter, ToolvaultError,
};
use toolvault_vault::constant_time_eq;

struct Entry {
    token: SecretString,
    identity: Identity,
}

/// Resolves bearer tokens against a fixed table.
///
/// Every entry is compared on each call, in constant time per entry.
pub struct StaticIdentityProvider {
    entries: Vec<Entry>,
}

impl StaticIdentityProvider {
    pub fn new(config: &IdentityConfig) -> Self {
        let entries = config
            .users
            .iter()
            .map(|u| Entry {
                token: SecretString::from(u.token.clone()),
                identity: Identity::new(u.user_id.clone(), u.email.clone()),
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for StaticIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticIdentityProvider")
            .field("users", &self.entries.iter().map(|e| &e.identity.user_id).collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl PluginAdapter for StaticIdentityProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn health_check(&self) -> Result<HealthStatus, ToolvaultError> {
        if self.entries.is_empty() {
            Ok(HealthStatus::Degraded("no identities configured".to_string()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), ToolvaultError> {
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn authenticate(&self, bearer: &str) -> Result<Identity, ToolvaultError> {
        if bearer.is_empty() {
            return Err(ToolvaultError::Unauthenticated);
        }
        let mut found = None;
        for entry in &self.entries {
            if constant_time_eq(entry.token.expose_secret().as_bytes(), bearer.as_bytes()) {
                found = Some(&entry.identity);
            }
        }
        found.cloned().ok_or(ToolvaultError::Unauthenticated)
    }
}
