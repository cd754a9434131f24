// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Share link lifecycle: create, resolve and revoke.
//!
//! A share token moves from active to revoked (explicitly, or on the first
//! successful resolve when one-time). Expiry is never written; it is derived
//! from `expires_at` on every read. Consumption is a conditional update in
//! the store, so concurrent resolves of a one-time token yield one success.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use toolvault_config::SharingConfig;
use toolvault_core::types::mask_token;
use toolvault_core::{
    AccessLevel, Identity, ShareAccessLog, ShareState, ShareTokenRecord, StorageAdapter,
    ToolvaultError,
};
use toolvault_vault::{generate_token, Cipher, SecretGate};
use tracing::{debug, info, warn};

use crate::access::AccessGuard;

/// Input for [`ShareManager::create`]. `None` fields take configured defaults.
#[derive(Debug, Default)]
pub struct ShareRequest {
    pub credential_id: String,
    pub expires_in_hours: Option<u32>,
    /// Recorded on the token; only `one_time` stops further resolves.
    pub max_views: Option<u32>,
    pub one_time: Option<bool>,
    pub require_secret: bool,
    /// Caller-chosen secret. Generated when absent and `require_secret` is set.
    pub secret: Option<SecretString>,
}

/// A freshly minted share. `secret` is the only copy of the plaintext secret.
pub struct ShareGrant {
    pub id: String,
    pub token: String,
    pub credential_id: String,
    pub expires_at: DateTime<Utc>,
    pub max_views: u32,
    pub one_time: bool,
    pub require_secret: bool,
    pub secret: Option<SecretString>,
}

impl std::fmt::Debug for ShareGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareGrant")
            .field("id", &self.id)
            .field("token", &mask_token(&self.token))
            .field("expires_at", &self.expires_at)
            .field("one_time", &self.one_time)
            .field("require_secret", &self.require_secret)
            .field("secret", &self.secret)
            .finish_non_exhaustive()
    }
}

/// What an anonymous share holder receives.
#[derive(Debug)]
pub struct RevealedCredential {
    pub label: Option<String>,
    pub username: SecretString,
    pub password: SecretString,
    pub tool_name: Option<String>,
    pub tool_url: Option<String>,
}

/// Mints, resolves and revokes share tokens.
pub struct ShareManager {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    guard: AccessGuard,
    cipher: Arc<Cipher>,
    gate: Arc<SecretGate>,
    config: SharingConfig,
}

impl ShareManager {
    pub fn new(
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        cipher: Arc<Cipher>,
        gate: Arc<SecretGate>,
        config: SharingConfig,
    ) -> Self {
        Self {
            guard: AccessGuard::new(Arc::clone(&storage)),
            storage,
            cipher,
            gate,
            config,
        }
    }

    /// Mint a share token for a credential the caller can access.
    pub async fn create(
        &self,
        identity: &Identity,
        request: ShareRequest,
    ) -> Result<ShareGrant, ToolvaultError> {
        if request.credential_id.is_empty() {
            return Err(ToolvaultError::validation("credential_id required"));
        }
        let expires_in_hours = request
            .expires_in_hours
            .unwrap_or(self.config.default_expires_in_hours);
        if expires_in_hours == 0 || expires_in_hours > self.config.max_expires_in_hours {
            return Err(ToolvaultError::validation(format!(
                "expires_in_hours must be between 1 and {}",
                self.config.max_expires_in_hours
            )));
        }
        let max_views = request.max_views.unwrap_or(1);
        if max_views == 0 {
            return Err(ToolvaultError::validation("max_views must be at least 1"));
        }
        if request.secret.is_some() && !request.require_secret {
            return Err(ToolvaultError::validation(
                "a secret was supplied but require_secret is false",
            ));
        }
        if request
            .secret
            .as_ref()
            .is_some_and(|s| s.expose_secret().is_empty())
        {
            return Err(ToolvaultError::validation("secret must not be empty"));
        }
        let one_time = request.one_time.unwrap_or(true);

        let credential = self
            .storage
            .get_credential(&request.credential_id)
            .await?
            .ok_or(ToolvaultError::NotFound { entity: "credential" })?;
        self.guard
            .authorize(identity, &credential.tool_id, AccessLevel::OwnerOrGrantee)
            .await?;

        let (secret, secret_key_salt, secret_key_hash) = if request.require_secret {
            let secret = request
                .secret
                .unwrap_or_else(|| self.gate.generate_secret());
            let (secret, salt, hash) = self.derive_blocking(secret).await?;
            (Some(secret), Some(salt), Some(hash))
        } else {
            (None, None, None)
        };

        let now = Utc::now();
        let record = ShareTokenRecord {
            id: uuid::Uuid::new_v4().to_string(),
            token: generate_token(self.config.token_length),
            credential_id: credential.id,
            created_by: identity.user_id.clone(),
            expires_at: now + Duration::hours(i64::from(expires_in_hours)),
            max_views,
            views: 0,
            one_time,
            revoked: false,
            require_secret: request.require_secret,
            secret_key_salt,
            secret_key_hash,
            created_at: now,
        };
        self.storage.insert_share_token(&record).await?;

        info!(
            share_token_id = %record.id,
            credential_id = %record.credential_id,
            user_id = %identity.user_id,
            token = %mask_token(&record.token),
            expires_at = %record.expires_at,
            one_time,
            require_secret = record.require_secret,
            "share created"
        );

        Ok(ShareGrant {
            id: record.id,
            token: record.token,
            credential_id: record.credential_id,
            expires_at: record.expires_at,
            max_views,
            one_time,
            require_secret: record.require_secret,
            secret,
        })
    }

    /// Resolve a share token and reveal its credential.
    ///
    /// Order of checks: existence, liveness, secret, credential, decryption,
    /// then the conditional consumption. A decryption failure leaves the
    /// token unconsumed.
    pub async fn resolve(
        &self,
        token: &str,
        secret: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<RevealedCredential, ToolvaultError> {
        if token.is_empty() {
            return Err(ToolvaultError::validation("token required"));
        }

        let record = self
            .storage
            .find_share_token(token)
            .await?
            .ok_or(ToolvaultError::NotFound { entity: "share" })?;

        let state = record.state_at(Utc::now());
        if state != ShareState::Active {
            debug!(share_token_id = %record.id, %state, "share not resolvable");
            return Err(ToolvaultError::Gone);
        }

        if record.require_secret {
            let supplied = secret.filter(|s| !s.is_empty());
            // Hash even when nothing was supplied so both failures cost the same.
            let matched = self
                .verify_blocking(
                    supplied.unwrap_or_default().to_string(),
                    record.secret_key_salt.clone().unwrap_or_default(),
                    record.secret_key_hash.clone().unwrap_or_default(),
                )
                .await?;
            if supplied.is_none() {
                self.log_attempt(&record, ip_address, false).await;
                return Err(ToolvaultError::SecretRequired);
            }
            if !matched {
                self.log_attempt(&record, ip_address, false).await;
                warn!(share_token_id = %record.id, ip = ?ip_address, "share secret mismatch");
                return Err(ToolvaultError::forbidden("invalid secret"));
            }
        }

        let credential = self
            .storage
            .get_credential(&record.credential_id)
            .await?
            .ok_or(ToolvaultError::NotFound { entity: "credential" })?;
        let tool = self.storage.get_tool(&credential.tool_id).await?;

        let username = SecretString::from(self.cipher.decrypt(&credential.encrypted_username)?);
        let password = SecretString::from(self.cipher.decrypt(&credential.encrypted_password)?);

        if !self
            .storage
            .consume_share_token(&record.id, Utc::now(), ip_address)
            .await?
        {
            self.log_attempt(&record, ip_address, false).await;
            debug!(share_token_id = %record.id, "share consumed concurrently");
            return Err(ToolvaultError::Gone);
        }

        info!(
            share_token_id = %record.id,
            credential_id = %credential.id,
            ip = ?ip_address,
            one_time = record.one_time,
            "share resolved"
        );

        Ok(RevealedCredential {
            label: credential.label,
            username,
            password,
            tool_name: tool.as_ref().map(|t| t.name.clone()),
            tool_url: tool.and_then(|t| t.url),
        })
    }

    /// Revoke a share. Allowed for its creator and for anyone with access to
    /// the bound credential's tool.
    pub async fn revoke(&self, identity: &Identity, token: &str) -> Result<(), ToolvaultError> {
        if token.is_empty() {
            return Err(ToolvaultError::validation("token required"));
        }

        let record = self
            .storage
            .find_share_token(token)
            .await?
            .ok_or(ToolvaultError::NotFound { entity: "share" })?;

        if record.created_by != identity.user_id {
            let credential = self
                .storage
                .get_credential(&record.credential_id)
                .await?
                .ok_or_else(|| ToolvaultError::forbidden("only the creator can revoke this share"))?;
            self.guard
                .authorize(identity, &credential.tool_id, AccessLevel::OwnerOrGrantee)
                .await?;
        }

        self.storage.revoke_share_token(&record.id).await?;
        info!(
            share_token_id = %record.id,
            user_id = %identity.user_id,
            token = %mask_token(&record.token),
            "share revoked"
        );
        Ok(())
    }

    async fn derive_blocking(
        &self,
        secret: SecretString,
    ) -> Result<(SecretString, String, String), ToolvaultError> {
        let gate = Arc::clone(&self.gate);
        tokio::task::spawn_blocking(move || {
            gate.derive(&secret).map(|(salt, hash)| (secret, salt, hash))
        })
        .await
        .map_err(|e| ToolvaultError::Internal(format!("secret derivation task failed: {e}")))?
    }

    async fn verify_blocking(
        &self,
        candidate: String,
        salt: String,
        hash: String,
    ) -> Result<bool, ToolvaultError> {
        let gate = Arc::clone(&self.gate);
        let candidate = SecretString::from(candidate);
        tokio::task::spawn_blocking(move || gate.verify(candidate.expose_secret(), &salt, &hash))
            .await
            .map_err(|e| ToolvaultError::Internal(format!("secret verification task failed: {e}")))
    }

    /// Failed-attempt logging never masks the error being returned.
    async fn log_attempt(&self, record: &ShareTokenRecord, ip_address: Option<&str>, success: bool) {
        let entry = ShareAccessLog {
            share_token_id: record.id.clone(),
            ip_address: ip_address.map(str::to_string),
            success,
        };
        if let Err(e) = self.storage.record_share_access(&entry).await {
            warn!(share_token_id = %record.id, error = %e, "failed to record share access");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialStore, NewCredential};
    use crate::testing::{alice, bob, fixture, mallory, seed_tool, Fixture};
    use tracing_test::traced_test;

    fn manager(f: &Fixture) -> ShareManager {
        ShareManager::new(
            f.dyn_storage(),
            Arc::clone(&f.cipher),
            Arc::clone(&f.gate),
            f.sharing.clone(),
        )
    }

    async fn seed_credential(f: &Fixture) -> String {
        seed_tool(f, "t1", "alice").await;
        let store = CredentialStore::new(f.dyn_storage(), Arc::clone(&f.cipher));
        store
            .create(
                &alice(),
                NewCredential {
                    tool_id: "t1".into(),
                    label: Some("admin".into()),
                    username: SecretString::from("ops@example.com".to_string()),
                    password: SecretString::from("s3cr3t-pw".to_string()),
                },
            )
            .await
            .unwrap()
            .id
    }

    fn request(credential_id: &str) -> ShareRequest {
        ShareRequest {
            credential_id: credential_id.into(),
            ..ShareRequest::default()
        }
    }

    #[tokio::test]
    async fn one_time_share_resolves_once() {
        let f = fixture().await;
        let cid = seed_credential(&f).await;
        let m = manager(&f);

        let grant = m.create(&alice(), request(&cid)).await.unwrap();
        assert!(grant.one_time);
        assert!(grant.secret.is_none());
        assert_eq!(grant.token.len(), f.sharing.token_length);

        let revealed = m.resolve(&grant.token, None, Some("198.51.100.7")).await.unwrap();
        assert_eq!(revealed.username.expose_secret(), "ops@example.com");
        assert_eq!(revealed.password.expose_secret(), "s3cr3t-pw");
        assert_eq!(revealed.label.as_deref(), Some("admin"));
        assert_eq!(revealed.tool_name.as_deref(), Some("Figma"));
        assert_eq!(revealed.tool_url.as_deref(), Some("https://figma.com"));

        let err = m.resolve(&grant.token, None, None).await.unwrap_err();
        assert!(matches!(err, ToolvaultError::Gone));
        assert_eq!(f.storage.access_log_counts(&grant.id).await.unwrap(), (1, 0));
    }

    #[tokio::test]
    async fn reusable_share_counts_views_and_ignores_max_views() {
        let f = fixture().await;
        let cid = seed_credential(&f).await;
        let m = manager(&f);

        let grant = m
            .create(
                &alice(),
                ShareRequest {
                    one_time: Some(false),
                    max_views: Some(1),
                    ..request(&cid)
                },
            )
            .await
            .unwrap();
        for _ in 0..3 {
            m.resolve(&grant.token, None, None).await.unwrap();
        }
        let rec = f.storage.find_share_token(&grant.token).await.unwrap().unwrap();
        assert_eq!(rec.views, 3);
        assert!(!rec.revoked);
    }

    #[tokio::test]
    async fn expired_share_is_gone_before_secret_check() {
        let f = fixture().await;
        let cid = seed_credential(&f).await;
        let now = Utc::now();
        let record = ShareTokenRecord {
            id: "expired".into(),
            token: "ExpiredTok01".into(),
            credential_id: cid,
            created_by: "alice".into(),
            expires_at: now - Duration::minutes(1),
            max_views: 1,
            views: 0,
            one_time: true,
            revoked: false,
            require_secret: true,
            secret_key_salt: Some("c2FsdHNhbHRzYWx0c2FsdA==".into()),
            secret_key_hash: Some("aGFzaA==".into()),
            created_at: now - Duration::hours(2),
        };
        f.storage.insert_share_token(&record).await.unwrap();

        let err = manager(&f).resolve("ExpiredTok01", None, None).await.unwrap_err();
        assert!(matches!(err, ToolvaultError::Gone));
        assert_eq!(f.storage.access_log_counts("expired").await.unwrap(), (0, 0));
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let f = fixture().await;
        let err = manager(&f).resolve("nope", None, None).await.unwrap_err();
        assert!(matches!(err, ToolvaultError::NotFound { entity: "share" }));
    }

    #[tokio::test]
    async fn secret_gated_share() {
        let f = fixture().await;
        let cid = seed_credential(&f).await;
        let m = manager(&f);

        let grant = m
            .create(
                &alice(),
                ShareRequest {
                    require_secret: true,
                    ..request(&cid)
                },
            )
            .await
            .unwrap();
        let secret = grant.secret.as_ref().unwrap().expose_secret().to_string();
        assert_eq!(secret.len(), 10);

        let rec = f.storage.find_share_token(&grant.token).await.unwrap().unwrap();
        assert!(rec.secret_key_salt.is_some() && rec.secret_key_hash.is_some());
        assert_ne!(rec.secret_key_hash.as_deref(), Some(secret.as_str()));

        let err = m.resolve(&grant.token, None, None).await.unwrap_err();
        assert!(matches!(err, ToolvaultError::SecretRequired));
        let err = m.resolve(&grant.token, Some(""), None).await.unwrap_err();
        assert!(matches!(err, ToolvaultError::SecretRequired));
        let err = m.resolve(&grant.token, Some("wrongwrong"), None).await.unwrap_err();
        assert!(matches!(err, ToolvaultError::Forbidden { .. }));

        m.resolve(&grant.token, Some(&secret), None).await.unwrap();
        let err = m.resolve(&grant.token, Some(&secret), None).await.unwrap_err();
        assert!(matches!(err, ToolvaultError::Gone));

        assert_eq!(f.storage.access_log_counts(&grant.id).await.unwrap(), (1, 3));
    }

    #[tokio::test]
    async fn caller_supplied_secret() {
        let f = fixture().await;
        let cid = seed_credential(&f).await;
        let m = manager(&f);

        let grant = m
            .create(
                &alice(),
                ShareRequest {
                    require_secret: true,
                    secret: Some(SecretString::from("my-own-secret".to_string())),
                    ..request(&cid)
                },
            )
            .await
            .unwrap();
        assert_eq!(grant.secret.unwrap().expose_secret(), "my-own-secret");
        m.resolve(&grant.token, Some("my-own-secret"), None).await.unwrap();

        let err = m
            .create(
                &alice(),
                ShareRequest {
                    secret: Some(SecretString::from("orphan".to_string())),
                    ..request(&cid)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolvaultError::Validation(_)));
    }

    #[tokio::test]
    async fn create_validates_and_checks_access() {
        let f = fixture().await;
        let cid = seed_credential(&f).await;
        let m = manager(&f);

        let err = m.create(&alice(), request("")).await.unwrap_err();
        assert!(matches!(err, ToolvaultError::Validation(_)));

        let err = m
            .create(
                &alice(),
                ShareRequest {
                    expires_in_hours: Some(f.sharing.max_expires_in_hours + 1),
                    ..request(&cid)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolvaultError::Validation(_)));

        let err = m.create(&alice(), request("ghost")).await.unwrap_err();
        assert!(matches!(err, ToolvaultError::NotFound { entity: "credential" }));

        let err = m.create(&mallory(), request(&cid)).await.unwrap_err();
        assert!(matches!(err, ToolvaultError::Forbidden { .. }));

        f.storage.grant_access("t1", "bob").await.unwrap();
        m.create(&bob(), request(&cid)).await.unwrap();
    }

    #[tokio::test]
    async fn deleted_credential_is_not_found_on_resolve() {
        let f = fixture().await;
        let cid = seed_credential(&f).await;
        let m = manager(&f);
        let grant = m.create(&alice(), request(&cid)).await.unwrap();

        f.storage.delete_credential(&cid).await.unwrap();
        let err = m.resolve(&grant.token, None, None).await.unwrap_err();
        assert!(matches!(err, ToolvaultError::NotFound { entity: "credential" }));
    }

    #[tokio::test]
    async fn tampered_ciphertext_does_not_consume_token() {
        let f = fixture().await;
        let cid = seed_credential(&f).await;
        let m = manager(&f);
        let grant = m.create(&alice(), request(&cid)).await.unwrap();

        let stored = f.storage.get_credential(&cid).await.unwrap().unwrap();
        let other = Cipher::from_secret("some other key entirely");
        let patch = toolvault_core::CredentialPatch {
            encrypted_password: Some(other.encrypt("x").unwrap()),
            ..Default::default()
        };
        f.storage.update_credential(&stored.id, &patch).await.unwrap();

        let err = m.resolve(&grant.token, None, None).await.unwrap_err();
        assert!(matches!(err, ToolvaultError::DecryptionFailed));
        let rec = f.storage.find_share_token(&grant.token).await.unwrap().unwrap();
        assert!(!rec.revoked);
        assert_eq!(rec.views, 0);
    }

    #[tokio::test]
    async fn concurrent_resolves_yield_exactly_one_success() {
        let f = fixture().await;
        let cid = seed_credential(&f).await;
        let m = manager(&f);
        let grant = m.create(&alice(), request(&cid)).await.unwrap();

        let (a, b) = tokio::join!(
            m.resolve(&grant.token, None, Some("10.0.0.1")),
            m.resolve(&grant.token, None, Some("10.0.0.2")),
        );
        let outcomes = [a, b];
        let successes = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(
            outcomes
                .iter()
                .any(|r| matches!(r, Err(ToolvaultError::Gone)))
        );
    }

    #[tokio::test]
    async fn revoke_by_creator_or_tool_member() {
        let f = fixture().await;
        let cid = seed_credential(&f).await;
        f.storage.grant_access("t1", "bob").await.unwrap();
        let m = manager(&f);

        let g1 = m.create(&bob(), request(&cid)).await.unwrap();
        m.revoke(&bob(), &g1.token).await.unwrap();
        let err = m.resolve(&g1.token, None, None).await.unwrap_err();
        assert!(matches!(err, ToolvaultError::Gone));

        let g2 = m.create(&bob(), request(&cid)).await.unwrap();
        m.revoke(&alice(), &g2.token).await.unwrap();

        let g3 = m.create(&alice(), request(&cid)).await.unwrap();
        let err = m.revoke(&mallory(), &g3.token).await.unwrap_err();
        assert!(matches!(err, ToolvaultError::Forbidden { .. }));
        m.resolve(&g3.token, None, None).await.unwrap();
    }

    #[traced_test]
    #[tokio::test]
    async fn tokens_and_secrets_are_masked_in_logs() {
        let f = fixture().await;
        let cid = seed_credential(&f).await;
        let m = manager(&f);
        let grant = m
            .create(
                &alice(),
                ShareRequest {
                    require_secret: true,
                    ..request(&cid)
                },
            )
            .await
            .unwrap();
        let secret = grant.secret.as_ref().unwrap().expose_secret().to_string();
        m.resolve(&grant.token, Some(&secret), None).await.unwrap();
        let _ = format!("{grant:?}");

        assert!(logs_contain("share created"));
        assert!(logs_contain("share resolved"));
        assert!(!logs_contain(&grant.token));
        assert!(!logs_contain(&secret));
        assert!(!logs_contain("s3cr3t-pw"));
    }
}
