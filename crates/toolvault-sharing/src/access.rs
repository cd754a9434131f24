// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool-level authorization.
//!
//! A missing tool is reported as `NotFound` before any rights are checked;
//! an existing tool the caller has no rights on is `Forbidden`.

use std::sync::Arc;

use toolvault_core::{
    AccessDecision, AccessLevel, Identity, StorageAdapter, Tool, ToolAccess, ToolvaultError,
};
use tracing::debug;

/// Authorization predicate over tools.
#[derive(Clone)]
pub struct AccessGuard {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
}

impl AccessGuard {
    pub fn new(storage: Arc<dyn StorageAdapter + Send + Sync>) -> Self {
        Self { storage }
    }

    /// Pure decision over an already-loaded tool and grant state.
    pub fn decide(access: &ToolAccess, user_id: &str, required: AccessLevel) -> AccessDecision {
        let is_owner = access.tool.owner_id == user_id;
        let allowed = match required {
            AccessLevel::OwnerOnly => is_owner,
            AccessLevel::OwnerOrGrantee => is_owner || access.has_grant,
        };
        if allowed {
            AccessDecision::Allowed
        } else {
            AccessDecision::Denied
        }
    }

    /// Load the tool and the caller's grant in one read, then decide.
    ///
    /// Returns the tool on success so callers can use its display context.
    pub async fn authorize(
        &self,
        identity: &Identity,
        tool_id: &str,
        required: AccessLevel,
    ) -> Result<Tool, ToolvaultError> {
        let access = self
            .storage
            .tool_access(tool_id, &identity.user_id)
            .await?
            .ok_or(ToolvaultError::NotFound { entity: "tool" })?;

        match Self::decide(&access, &identity.user_id, required) {
            AccessDecision::Allowed => Ok(access.tool),
            AccessDecision::Denied => {
                debug!(user_id = %identity.user_id, tool_id, %required, "access denied");
                Err(ToolvaultError::forbidden("no access to this tool"))
            }
        }
    }
}

impl std::fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard")
            .field("storage", &self.storage.name())
            .finish()
    }
}
