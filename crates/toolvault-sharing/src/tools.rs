// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool administration: creation, owner-only metadata changes and access grants.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use toolvault_core::{AccessLevel, Identity, StorageAdapter, Tool, ToolPatch, ToolvaultError};
use tracing::info;

use crate::access::AccessGuard;

/// Input for [`ToolAdmin::create_tool`].
#[derive(Debug, Clone, Default)]
pub struct NewTool {
    pub name: String,
    pub url: Option<String>,
    pub spend_amount: Option<f64>,
    pub spend_cycle: Option<String>,
    pub renewal_date: Option<String>,
}

/// Input for [`ToolAdmin::update_tool`]. `None` keeps the stored value;
/// `url: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ToolUpdate {
    pub id: String,
    pub name: Option<String>,
    pub url: Option<Option<String>>,
    pub spend_amount: Option<f64>,
    pub spend_cycle: Option<String>,
    pub renewal_date: Option<String>,
}

/// Owner-facing tool operations.
pub struct ToolAdmin {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    guard: AccessGuard,
}

impl ToolAdmin {
    pub fn new(storage: Arc<dyn StorageAdapter + Send + Sync>) -> Self {
        Self {
            guard: AccessGuard::new(Arc::clone(&storage)),
            storage,
        }
    }

    /// Create a tool owned by the caller.
    pub async fn create_tool(&self, identity: &Identity, input: NewTool) -> Result<Tool, ToolvaultError> {
        if input.name.trim().is_empty() {
            return Err(ToolvaultError::validation("name required"));
        }
        validate_spend(input.spend_amount)?;
        validate_renewal_date(input.renewal_date.as_deref())?;

        let tool = Tool {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: identity.user_id.clone(),
            name: input.name,
            url: input.url,
            spend_amount: input.spend_amount,
            spend_cycle: input.spend_cycle,
            renewal_date: input.renewal_date,
            created_at: Utc::now(),
        };
        self.storage.create_tool(&tool).await?;
        info!(tool_id = %tool.id, user_id = %identity.user_id, "tool created");
        Ok(tool)
    }

    /// Update tool metadata. Owner only.
    pub async fn update_tool(&self, identity: &Identity, update: ToolUpdate) -> Result<Tool, ToolvaultError> {
        if update.id.is_empty() {
            return Err(ToolvaultError::validation("id required"));
        }
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ToolvaultError::validation("name must not be empty"));
        }
        validate_spend(update.spend_amount)?;
        validate_renewal_date(update.renewal_date.as_deref())?;

        self.guard
            .authorize(identity, &update.id, AccessLevel::OwnerOnly)
            .await?;

        let patch = ToolPatch {
            name: update.name,
            url: update.url,
            spend_amount: update.spend_amount,
            spend_cycle: update.spend_cycle,
            renewal_date: update.renewal_date,
        };
        if !self.storage.update_tool(&update.id, &patch).await? {
            return Err(ToolvaultError::NotFound { entity: "tool" });
        }
        info!(tool_id = %update.id, user_id = %identity.user_id, "tool updated");

        self.storage
            .get_tool(&update.id)
            .await?
            .ok_or(ToolvaultError::NotFound { entity: "tool" })
    }

    /// Delete a tool with its grants and credentials. Owner only.
    pub async fn delete_tool(&self, identity: &Identity, id: &str) -> Result<(), ToolvaultError> {
        if id.is_empty() {
            return Err(ToolvaultError::validation("id required"));
        }
        self.guard.authorize(identity, id, AccessLevel::OwnerOnly).await?;

        if !self.storage.delete_tool(id).await? {
            return Err(ToolvaultError::NotFound { entity: "tool" });
        }
        info!(tool_id = %id, user_id = %identity.user_id, "tool deleted");
        Ok(())
    }

    /// Grant another user owner-or-grantee access. Owner only; idempotent.
    pub async fn grant_access(
        &self,
        identity: &Identity,
        tool_id: &str,
        user_id: &str,
    ) -> Result<(), ToolvaultError> {
        if tool_id.is_empty() || user_id.is_empty() {
            return Err(ToolvaultError::validation("tool_id and user_id required"));
        }
        let tool = self
            .guard
            .authorize(identity, tool_id, AccessLevel::OwnerOnly)
            .await?;
        if tool.owner_id == user_id {
            return Err(ToolvaultError::validation("the owner already has access"));
        }

        self.storage.grant_access(tool_id, user_id).await?;
        info!(tool_id, grantee = user_id, user_id = %identity.user_id, "access granted");
        Ok(())
    }

    /// Withdraw a grant. Owner only.
    pub async fn revoke_access(
        &self,
        identity: &Identity,
        tool_id: &str,
        user_id: &str,
    ) -> Result<(), ToolvaultError> {
        if tool_id.is_empty() || user_id.is_empty() {
            return Err(ToolvaultError::validation("tool_id and user_id required"));
        }
        self.guard
            .authorize(identity, tool_id, AccessLevel::OwnerOnly)
            .await?;

        if !self.storage.revoke_access(tool_id, user_id).await? {
            return Err(ToolvaultError::NotFound { entity: "access grant" });
        }
        info!(tool_id, grantee = user_id, user_id = %identity.user_id, "access revoked");
        Ok(())
    }
}

fn validate_spend(amount: Option<f64>) -> Result<(), ToolvaultError> {
    match amount {
        Some(a) if !a.is_finite() || a < 0.0 => Err(ToolvaultError::validation(
            "spend_amount must be a non-negative number",
        )),
        _ => Ok(()),
    }
}

fn validate_renewal_date(date: Option<&str>) -> Result<(), ToolvaultError> {
    match date {
        Some(d) if NaiveDate::parse_from_str(d, "%Y-%m-%d").is_err() => Err(
            ToolvaultError::validation("renewal_date must be formatted YYYY-MM-DD"),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialStore, NewCredential};
    use crate::testing::{alice, bob, fixture, mallory};
    use secrecy::SecretString;

    fn figma() -> NewTool {
        NewTool {
            name: "Figma".into(),
            url: Some("https://figma.com".into()),
            spend_amount: Some(15.0),
            spend_cycle: Some("monthly".into()),
            renewal_date: Some("2026-11-01".into()),
        }
    }

    #[tokio::test]
    async fn creator_becomes_owner() {
        let f = fixture().await;
        let admin = ToolAdmin::new(f.dyn_storage());
        let tool = admin.create_tool(&alice(), figma()).await.unwrap();
        assert_eq!(tool.owner_id, "alice");
        assert!(f.storage.get_tool(&tool.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn create_rejects_bad_input() {
        let f = fixture().await;
        let admin = ToolAdmin::new(f.dyn_storage());
        let bad_name = NewTool {
            name: "  ".into(),
            ..figma()
        };
        assert!(matches!(
            admin.create_tool(&alice(), bad_name).await,
            Err(ToolvaultError::Validation(_))
        ));
        let bad_date = NewTool {
            renewal_date: Some("next tuesday".into()),
            ..figma()
        };
        assert!(matches!(
            admin.create_tool(&alice(), bad_date).await,
            Err(ToolvaultError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn grantee_cannot_rename_or_delete() {
        let f = fixture().await;
        let admin = ToolAdmin::new(f.dyn_storage());
        let tool = admin.create_tool(&alice(), figma()).await.unwrap();
        admin.grant_access(&alice(), &tool.id, "bob").await.unwrap();

        let rename = ToolUpdate {
            id: tool.id.clone(),
            name: Some("Mine now".into()),
            ..ToolUpdate::default()
        };
        assert!(matches!(
            admin.update_tool(&bob(), rename.clone()).await,
            Err(ToolvaultError::Forbidden { .. })
        ));
        assert!(matches!(
            admin.delete_tool(&bob(), &tool.id).await,
            Err(ToolvaultError::Forbidden { .. })
        ));
        assert!(matches!(
            admin.grant_access(&bob(), &tool.id, "mallory").await,
            Err(ToolvaultError::Forbidden { .. })
        ));

        let updated = admin.update_tool(&alice(), rename).await.unwrap();
        assert_eq!(updated.name, "Mine now");
        assert_eq!(updated.url.as_deref(), Some("https://figma.com"));
    }

    #[tokio::test]
    async fn owner_can_clear_url() {
        let f = fixture().await;
        let admin = ToolAdmin::new(f.dyn_storage());
        let tool = admin.create_tool(&alice(), figma()).await.unwrap();

        let clear = ToolUpdate {
            id: tool.id.clone(),
            url: Some(None),
            ..ToolUpdate::default()
        };
        let updated = admin.update_tool(&alice(), clear).await.unwrap();
        assert!(updated.url.is_none());
        assert_eq!(updated.name, "Figma");
        assert_eq!(updated.spend_amount, Some(15.0));
    }

    #[tokio::test]
    async fn missing_tool_is_not_found() {
        let f = fixture().await;
        let admin = ToolAdmin::new(f.dyn_storage());
        assert!(matches!(
            admin.delete_tool(&alice(), "ghost").await,
            Err(ToolvaultError::NotFound { entity: "tool" })
        ));
    }

    #[tokio::test]
    async fn grants_drive_credential_access() {
        let f = fixture().await;
        let admin = ToolAdmin::new(f.dyn_storage());
        let store = CredentialStore::new(f.dyn_storage(), std::sync::Arc::clone(&f.cipher));
        let tool = admin.create_tool(&alice(), figma()).await.unwrap();
        store
            .create(
                &alice(),
                NewCredential {
                    tool_id: tool.id.clone(),
                    label: None,
                    username: SecretString::from("u".to_string()),
                    password: SecretString::from("p".to_string()),
                },
            )
            .await
            .unwrap();

        assert!(store.list(&bob(), &tool.id).await.is_err());
        admin.grant_access(&alice(), &tool.id, "bob").await.unwrap();
        assert_eq!(store.list(&bob(), &tool.id).await.unwrap().len(), 1);

        admin.revoke_access(&alice(), &tool.id, "bob").await.unwrap();
        assert!(matches!(
            store.list(&bob(), &tool.id).await,
            Err(ToolvaultError::Forbidden { .. })
        ));
        assert!(matches!(
            admin.revoke_access(&alice(), &tool.id, "bob").await,
            Err(ToolvaultError::NotFound { .. })
        ));
        assert!(matches!(
            admin.grant_access(&alice(), &tool.id, "alice").await,
            Err(ToolvaultError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn delete_cascades_credentials() {
        let f = fixture().await;
        let admin = ToolAdmin::new(f.dyn_storage());
        let store = CredentialStore::new(f.dyn_storage(), std::sync::Arc::clone(&f.cipher));
        let tool = admin.create_tool(&alice(), figma()).await.unwrap();
        let cred = store
            .create(
                &alice(),
                NewCredential {
                    tool_id: tool.id.clone(),
                    label: None,
                    username: SecretString::from("u".to_string()),
                    password: SecretString::from("p".to_string()),
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            admin.delete_tool(&mallory(), &tool.id).await,
            Err(ToolvaultError::Forbidden { .. })
        ));
        admin.delete_tool(&alice(), &tool.id).await.unwrap();
        assert!(f.storage.get_credential(&cred.id).await.unwrap().is_none());
    }
}
