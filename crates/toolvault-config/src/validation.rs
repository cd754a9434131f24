// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as token length floors, expiry bounds and production key requirements.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{Environment, ToolvaultConfig};

/// Shortest share token accepted. Shorter tokens are guessable.
pub const MIN_TOKEN_LENGTH: usize = 8;

/// Shortest generated share secret accepted.
pub const MIN_SECRET_LENGTH: usize = 8;

/// Argon2id memory floor in KiB.
pub const MIN_KDF_MEMORY_COST: u32 = 8192;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ToolvaultConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut push = |message: String| errors.push(ConfigError::Validation { message });

    if config.server.host.trim().is_empty() {
        push("server.host must not be empty".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        push("storage.database_path must not be empty".to_string());
    }

    let sharing = &config.sharing;
    if sharing.token_length < MIN_TOKEN_LENGTH {
        push(format!(
            "sharing.token_length must be at least {MIN_TOKEN_LENGTH}, got {}",
            sharing.token_length
        ));
    }

    if sharing.secret_length < MIN_SECRET_LENGTH {
        push(format!(
            "sharing.secret_length must be at least {MIN_SECRET_LENGTH}, got {}",
            sharing.secret_length
        ));
    }

    if sharing.default_expires_in_hours < 1 {
        push("sharing.default_expires_in_hours must be at least 1".to_string());
    }

    if sharing.default_expires_in_hours > sharing.max_expires_in_hours {
        push(format!(
            "sharing.default_expires_in_hours ({}) exceeds sharing.max_expires_in_hours ({})",
            sharing.default_expires_in_hours, sharing.max_expires_in_hours
        ));
    }

    if sharing.kdf_memory_cost < MIN_KDF_MEMORY_COST {
        push(format!(
            "sharing.kdf_memory_cost must be at least {MIN_KDF_MEMORY_COST} (8 MiB), got {}",
            sharing.kdf_memory_cost
        ));
    }

    if sharing.kdf_iterations < 1 {
        push("sharing.kdf_iterations must be at least 1".to_string());
    }

    if sharing.kdf_parallelism < 1 {
        push("sharing.kdf_parallelism must be at least 1".to_string());
    }

    if config.server.environment == Environment::Production
        && config
            .vault
            .encryption_key
            .as_deref()
            .is_none_or(|k| k.trim().is_empty())
    {
        push(
            "vault.encryption_key is required when server.environment = \"production\" \
             (or set SECRET_ENCRYPTION_KEY)"
                .to_string(),
        );
    }

    let mut seen = HashSet::new();
    for (idx, user) in config.identity.users.iter().enumerate() {
        if user.token.trim().is_empty() {
            push(format!("identity.users[{idx}].token must not be empty"));
        } else if !seen.insert(user.token.as_str()) {
            push(format!(
                "identity.users[{idx}].token duplicates an earlier entry (user `{}`)",
                user.user_id
            ));
        }
        if user.user_id.trim().is_empty() {
            push(format!("identity.users[{idx}].user_id must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StaticUserConfig;

    fn messages(config: &ToolvaultConfig) -> Vec<String> {
        validate_config(config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ToolvaultConfig::default()).is_ok());
    }

    #[test]
    fn short_token_length_rejected() {
        let mut config = ToolvaultConfig::default();
        config.sharing.token_length = 4;
        let msgs = messages(&config);
        assert!(msgs.iter().any(|m| m.contains("token_length")));
    }

    #[test]
    fn default_expiry_above_max_rejected() {
        let mut config = ToolvaultConfig::default();
        config.sharing.default_expires_in_hours = 100;
        config.sharing.max_expires_in_hours = 48;
        let msgs = messages(&config);
        assert!(msgs.iter().any(|m| m.contains("exceeds")));
    }

    #[test]
    fn production_requires_encryption_key() {
        let mut config = ToolvaultConfig::default();
        config.server.environment = Environment::Production;
        let msgs = messages(&config);
        assert!(msgs.iter().any(|m| m.contains("vault.encryption_key")));

        config.vault.encryption_key = Some("k".repeat(32));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn duplicate_identity_tokens_rejected() {
        let mut config = ToolvaultConfig::default();
        for user_id in ["alice", "bob"] {
            config.identity.users.push(StaticUserConfig {
                token: "same".into(),
                user_id: user_id.into(),
                email: None,
            });
        }
        let msgs = messages(&config);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("duplicates"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ToolvaultConfig::default();
        config.server.host = " ".into();
        config.storage.database_path = String::new();
        config.sharing.kdf_iterations = 0;
        assert_eq!(messages(&config).len(), 3);
    }
}
