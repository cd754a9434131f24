// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for toolvault.
//!
//! This crate provides the error taxonomy, the domain types persisted by the
//! record store, and the adapter traits for the two external collaborators:
//! the identity provider and the relational store.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{ErrorKind, ToolvaultError};
pub use types::{
    AccessDecision, AccessLevel, AdapterType, CredentialPatch, CredentialRecord, HealthStatus,
    Identity, ShareAccessLog, ShareState, ShareTokenRecord, Tool, ToolAccess, ToolPatch,
};

pub use traits::{IdentityProvider, PluginAdapter, StorageAdapter};
