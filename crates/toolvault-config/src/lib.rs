// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for toolvault.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use toolvault_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Listening on {}:{}", config.server.host, config.server.port);
//! ```

use std::path::{Path, PathBuf};

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError, TomlSource};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    Environment, IdentityConfig, ServerConfig, SharingConfig, StaticUserConfig, StorageConfig,
    ToolvaultConfig, VaultConfig,
};

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<ToolvaultConfig, Vec<ConfigError>> {
    validated(loader::load_config(), || {
        let paths = loader::search_paths();
        TomlSource::read_all(paths.iter().map(PathBuf::as_path))
    })
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<ToolvaultConfig, Vec<ConfigError>> {
    validated(loader::load_config_from_path(path), || {
        TomlSource::read_all([path])
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<ToolvaultConfig, Vec<ConfigError>> {
    validated(loader::load_config_from_str(toml_content), || {
        vec![TomlSource::inline(toml_content)]
    })
}

/// Sources are only read back when extraction failed and spans are needed.
fn validated(
    extracted: Result<ToolvaultConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<TomlSource>,
) -> Result<ToolvaultConfig, Vec<ConfigError>> {
    let config = extracted.map_err(|err| ConfigError::from_figment(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}
