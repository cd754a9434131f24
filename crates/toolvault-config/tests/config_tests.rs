// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the toolvault configuration system.

use std::path::Path;

use figment::Jail;
use toolvault_config::diagnostic::ConfigError;
use toolvault_config::model::Environment;
use toolvault_config::{load_and_validate_path, load_and_validate_str, load_config_from_path, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_toolvault_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 9000
log_level = "debug"
environment = "production"

[storage]
database_path = "/tmp/toolvault-test.db"
wal_mode = false

[vault]
encryption_key = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY="

[sharing]
default_expires_in_hours = 12
max_expires_in_hours = 48
token_length = 16
secret_length = 12

[[identity.users]]
token = "alice-token"
user_id = "alice"
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should validate");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.environment, Environment::Production);
    assert_eq!(config.storage.database_path, "/tmp/toolvault-test.db");
    assert!(!config.storage.wal_mode);
    assert!(config.vault.encryption_key.is_some());
    assert_eq!(config.sharing.default_expires_in_hours, 12);
    assert_eq!(config.sharing.token_length, 16);
    assert_eq!(config.identity.users[0].user_id, "alice");
}

/// Empty input yields pure defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML is valid");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.sharing.max_expires_in_hours, 720);
    assert_eq!(config.sharing.kdf_memory_cost, 19456);
    assert!(config.identity.users.is_empty());
}

/// A typo in a section key is reported with a suggestion.
#[test]
fn unknown_key_gets_suggestion() {
    let toml = r#"
[vault]
encrytion_key = "abc"
"#;

    let errors = load_and_validate_str(toml).expect_err("typo must be rejected");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "encrytion_key");
            assert_eq!(suggestion.as_deref(), Some("encryption_key"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// A wrong value type surfaces as InvalidType.
#[test]
fn wrong_type_is_invalid_type() {
    let toml = r#"
[server]
port = "eighty"
"#;

    let errors = load_and_validate_str(toml).expect_err("string port must be rejected");
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

/// Production without a key fails validation.
#[test]
fn production_without_key_fails_validation() {
    let toml = r#"
[server]
environment = "production"
"#;

    let errors = load_and_validate_str(toml).expect_err("key is mandatory in production");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("encryption_key")))
    );
}

/// `TOOLVAULT_*` variables override file values, keeping underscores in key names.
#[test]
fn prefixed_env_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "toolvault.toml",
            r#"
[server]
port = 8000

[sharing]
token_length = 10
"#,
        )?;
        jail.set_env("TOOLVAULT_SERVER_PORT", "9100");
        jail.set_env("TOOLVAULT_SHARING_TOKEN_LENGTH", "20");
        jail.set_env("TOOLVAULT_VAULT_ENCRYPTION_KEY", "from-env");

        let config = load_config_from_path(Path::new("toolvault.toml"))?;
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.sharing.token_length, 20);
        assert_eq!(config.vault.encryption_key.as_deref(), Some("from-env"));
        Ok(())
    });
}

/// The legacy `SECRET_ENCRYPTION_KEY` variable feeds `vault.encryption_key`.
#[test]
fn legacy_key_env_is_honoured() {
    Jail::expect_with(|jail| {
        jail.create_file("toolvault.toml", "[server]\nenvironment = \"production\"\n")?;
        jail.set_env("SECRET_ENCRYPTION_KEY", "legacy-secret");

        let config = load_and_validate_path(Path::new("toolvault.toml"))
            .map_err(|errs| figment::Error::from(format!("{errs:?}")))?;
        assert_eq!(config.vault.encryption_key.as_deref(), Some("legacy-secret"));
        Ok(())
    });
}

/// The prefixed variable wins over the legacy one.
#[test]
fn prefixed_key_beats_legacy_key() {
    Jail::expect_with(|jail| {
        jail.create_file("toolvault.toml", "")?;
        jail.set_env("SECRET_ENCRYPTION_KEY", "legacy");
        jail.set_env("TOOLVAULT_VAULT_ENCRYPTION_KEY", "modern");

        let config = load_config_from_path(Path::new("toolvault.toml"))?;
        assert_eq!(config.vault.encryption_key.as_deref(), Some("modern"));
        Ok(())
    });
}
