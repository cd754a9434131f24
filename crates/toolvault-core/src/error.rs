// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for toolvault.
//!
//! Every fallible operation in the workspace returns [`ToolvaultError`]. The
//! variants follow the caller-facing taxonomy (unauthenticated, forbidden,
//! not found, gone, ...) so the gateway can map them to responses without
//! inspecting strings. Messages never carry secret or ciphertext material.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// The primary error type used across all toolvault crates.
#[derive(Debug, Error)]
pub enum ToolvaultError {
    /// Missing or invalid bearer credentials.
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated, but lacking rights (or a wrong share secret).
    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    /// A tool, credential or share token does not exist.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// The share token has expired or was revoked.
    #[error("share link expired or revoked")]
    Gone,

    /// A secret-gated share token was resolved without a secret.
    #[error("secret required")]
    SecretRequired,

    /// A required input field is missing or malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Ciphertext failed authentication. Carries no cryptographic detail.
    #[error("decryption failed")]
    DecryptionFailed,

    /// Backing persistence failure.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (invalid values, missing production key).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Stable, machine-readable error kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    NotFound,
    Gone,
    SecretRequired,
    ValidationError,
    DecryptionFailed,
    StoreError,
    ConfigError,
    InternalError,
}

impl ToolvaultError {
    /// Shorthand for a [`ToolvaultError::Forbidden`] with the given reason.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`ToolvaultError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Gone => ErrorKind::Gone,
            Self::SecretRequired => ErrorKind::SecretRequired,
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::DecryptionFailed => ErrorKind::DecryptionFailed,
            Self::Storage { .. } => ErrorKind::StoreError,
            Self::Config(_) => ErrorKind::ConfigError,
            Self::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// The short message shown to callers.
    ///
    /// Internal failures (decryption, storage, config) collapse to a generic
    /// message; their detail belongs in server logs only.
    pub fn public_message(&self) -> String {
        match self {
            Self::DecryptionFailed | Self::Storage { .. } | Self::Config(_) | Self::Internal(_) => {
                "internal error".to_string()
            }
            other => other.to_string(),
        }
    }
}
