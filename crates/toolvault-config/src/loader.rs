// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./toolvault.toml` > `~/.config/toolvault/toolvault.toml`
//! > `/etc/toolvault/toolvault.toml` with environment variable overrides via the
//! `TOOLVAULT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ToolvaultConfig;

/// Legacy variable holding the field encryption secret.
pub const LEGACY_KEY_ENV: &str = "SECRET_ENCRYPTION_KEY";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/toolvault/toolvault.toml` (system-wide)
/// 3. `~/.config/toolvault/toolvault.toml` (user XDG config)
/// 4. `./toolvault.toml` (local directory)
/// 5. `SECRET_ENCRYPTION_KEY` (legacy name for `vault.encryption_key`)
/// 6. `TOOLVAULT_*` environment variables
pub fn load_config() -> Result<ToolvaultConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ToolvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ToolvaultConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ToolvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ToolvaultConfig::default()))
        .merge(Toml::file(path))
        .merge(legacy_key_provider())
        .merge(env_provider())
        .extract()
}

/// Config files consulted by [`load_config`], lowest precedence first.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/toolvault/toolvault.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("toolvault").join("toolvault.toml"));
    }
    paths.push(PathBuf::from("toolvault.toml"));
    paths
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    search_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(ToolvaultConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(legacy_key_provider())
        .merge(env_provider())
}

/// `SECRET_ENCRYPTION_KEY` -> `vault.encryption_key`.
fn legacy_key_provider() -> Env {
    Env::raw()
        .only(&[LEGACY_KEY_ENV])
        .map(|_| "vault.encryption_key".into())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-containing
/// keys survive: `TOOLVAULT_VAULT_ENCRYPTION_KEY` maps to
/// `vault.encryption_key`, not `vault.encryption.key`.
fn env_provider() -> Env {
    Env::prefixed("TOOLVAULT_").map(|key| {
        let mapped = key
            .as_str()
            .to_ascii_lowercase()
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("vault_", "vault.", 1)
            .replacen("sharing_", "sharing.", 1);
        mapped.into()
    })
}
