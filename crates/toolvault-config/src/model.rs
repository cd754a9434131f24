// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for toolvault.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level toolvault configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to development-friendly values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolvaultConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Field encryption settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Share link settings.
    #[serde(default)]
    pub sharing: SharingConfig,

    /// Bundled bearer-token identity provider.
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Deployment environment. Production forbids the insecure default key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            environment: Environment::default(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("toolvault").join("toolvault.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("toolvault.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Field encryption configuration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Secret the AES-256-GCM key is derived from (base64, or raw UTF-8).
    /// `None` selects the insecure development key.
    #[serde(default)]
    pub encryption_key: Option<String>,
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Share link configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SharingConfig {
    /// Expiry horizon used when a share request does not name one.
    #[serde(default = "default_expires_in_hours")]
    pub default_expires_in_hours: u32,

    /// Upper bound on the requested expiry horizon.
    #[serde(default = "default_max_expires_in_hours")]
    pub max_expires_in_hours: u32,

    /// Length of the public share token (mixed-case alphanumeric).
    #[serde(default = "default_token_length")]
    pub token_length: usize,

    /// Length of generated share secrets.
    #[serde(default = "default_secret_length")]
    pub secret_length: usize,

    /// Argon2id memory cost in KiB for share secret hashing.
    #[serde(default = "default_kdf_memory_cost")]
    pub kdf_memory_cost: u32,

    /// Argon2id iteration count.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Argon2id parallelism.
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            default_expires_in_hours: default_expires_in_hours(),
            max_expires_in_hours: default_max_expires_in_hours(),
            token_length: default_token_length(),
            secret_length: default_secret_length(),
            kdf_memory_cost: default_kdf_memory_cost(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
        }
    }
}

fn default_expires_in_hours() -> u32 {
    24
}

fn default_max_expires_in_hours() -> u32 {
    24 * 30
}

fn default_token_length() -> usize {
    12
}

fn default_secret_length() -> usize {
    10
}

// OWASP minimum for Argon2id: 19 MiB, 2 passes, 1 lane. Tens of ms per hash.
fn default_kdf_memory_cost() -> u32 {
    19456
}

fn default_kdf_iterations() -> u32 {
    2
}

fn default_kdf_parallelism() -> u32 {
    1
}

/// Static bearer-token identity provider configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// Known users and their bearer tokens.
    #[serde(default)]
    pub users: Vec<StaticUserConfig>,
}

/// One entry of the static identity table.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StaticUserConfig {
    /// Bearer token presented in `Authorization: Bearer <token>`.
    pub token: String,
    /// Stable user id.
    pub user_id: String,
    /// Optional contact e-mail.
    #[serde(default)]
    pub email: Option<String>,
}

impl std::fmt::Debug for StaticUserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticUserConfig")
            .field("token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_development() {
        let config = ToolvaultConfig::default();
        assert_eq!(config.server.environment, Environment::Development);
        assert!(config.vault.encryption_key.is_none());
        assert_eq!(config.sharing.default_expires_in_hours, 24);
        assert_eq!(config.sharing.secret_length, 10);
        assert!(config.sharing.token_length >= 8);
    }

    #[test]
    fn vault_debug_redacts_key() {
        let config = VaultConfig {
            encryption_key: Some("super-secret-key".into()),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn static_user_debug_redacts_token() {
        let user = StaticUserConfig {
            token: "tok-abcdef".into(),
            user_id: "u1".into(),
            email: None,
        };
        let debug = format!("{user:?}");
        assert!(!debug.contains("tok-abcdef"));
        assert!(debug.contains("u1"));
    }

    #[test]
    fn identity_users_deserialize() {
        let toml_str = r#"
[[identity.users]]
token = "t1"
user_id = "alice"
email = "alice@example.com"

[[identity.users]]
token = "t2"
user_id = "bob"
"#;
        let config: ToolvaultConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.identity.users.len(), 2);
        assert_eq!(config.identity.users[0].user_id, "alice");
        assert!(config.identity.users[1].email.is_none());
    }

    #[test]
    fn environment_parses_lowercase() {
        let config: ToolvaultConfig = toml::from_str("[server]\nenvironment = \"production\"\n").unwrap();
        assert_eq!(config.server.environment, Environment::Production);
    }
}
