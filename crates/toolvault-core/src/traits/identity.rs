// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity provider trait.

use async_trait::async_trait;

use crate::error::ToolvaultError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Identity;

/// Resolves a bearer token to an [`Identity`].
///
/// Treated as an opaque oracle: implementations return
/// [`ToolvaultError::Unauthenticated`] for unknown or invalid tokens.
#[async_trait]
pub trait IdentityProvider: PluginAdapter {
    async fn authenticate(&self, bearer: &str) -> Result<Identity, ToolvaultError>;
}
