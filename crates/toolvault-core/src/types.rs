// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the storage, sharing and gateway crates.
//!
//! Records here mirror the persisted rows. Encrypted fields are opaque
//! base64 strings; nothing in this module ever holds plaintext credentials.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Identity,
}

/// An authenticated caller, as returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id.
    pub user_id: String,
    /// Contact e-mail, if the provider knows it.
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email,
        }
    }
}

/// Rights required by an operation on a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AccessLevel {
    /// Only the tool owner (metadata mutation, deletion, grants).
    OwnerOnly,
    /// The owner or any identity holding an access grant (credentials).
    OwnerOrGrantee,
}

/// Result of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied,
}

/// A tool (subscription, service account, ...) owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub url: Option<String>,
    pub spend_amount: Option<f64>,
    pub spend_cycle: Option<String>,
    /// Next renewal date (`YYYY-MM-DD`).
    pub renewal_date: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A tool together with whether a given identity holds an access grant on it.
///
/// Produced by a single consistent read so ownership and grant state are
/// observed at the same instant.
#[derive(Debug, Clone)]
pub struct ToolAccess {
    pub tool: Tool,
    pub has_grant: bool,
}

/// Partial update of tool metadata. `None` keeps the stored value.
///
/// `url` is tri-state: `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ToolPatch {
    pub name: Option<String>,
    pub url: Option<Option<String>>,
    pub spend_amount: Option<f64>,
    pub spend_cycle: Option<String>,
    pub renewal_date: Option<String>,
}

/// A stored credential row. Username and password are ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub id: String,
    pub tool_id: String,
    pub label: Option<String>,
    pub encrypted_username: String,
    pub encrypted_password: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Partial update of a credential row. `None` keeps the stored value.
///
/// `label` is tri-state: `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct CredentialPatch {
    pub label: Option<Option<String>>,
    pub encrypted_username: Option<String>,
    pub encrypted_password: Option<String>,
}

impl CredentialPatch {
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.encrypted_username.is_none() && self.encrypted_password.is_none()
    }
}

/// Derived state of a share token at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ShareState {
    Active,
    Expired,
    Revoked,
}

/// A stored share token: a capability to view one credential without
/// authenticating.
///
/// The plaintext share secret is never stored; only its salt and hash.
#[derive(Clone, PartialEq, Eq)]
pub struct ShareTokenRecord {
    pub id: String,
    /// Public, unguessable identifier carried in the share link.
    pub token: String,
    /// Weak reference: the credential may have been deleted since.
    pub credential_id: String,
    pub created_by: String,
    pub expires_at: DateTime<Utc>,
    /// Recorded but not enforced as a stop condition.
    pub max_views: u32,
    pub views: u32,
    pub one_time: bool,
    pub revoked: bool,
    pub require_secret: bool,
    /// Base64 Argon2id salt, set iff `require_secret`.
    pub secret_key_salt: Option<String>,
    /// Base64 Argon2id hash, set iff `require_secret`.
    pub secret_key_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ShareTokenRecord {
    /// Expiry is derived at read time, never persisted as a flag.
    pub fn state_at(&self, now: DateTime<Utc>) -> ShareState {
        if self.revoked {
            ShareState::Revoked
        } else if now > self.expires_at {
            ShareState::Expired
        } else {
            ShareState::Active
        }
    }
}

impl std::fmt::Debug for ShareTokenRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareTokenRecord")
            .field("id", &self.id)
            .field("token", &mask_token(&self.token))
            .field("credential_id", &self.credential_id)
            .field("expires_at", &self.expires_at)
            .field("views", &self.views)
            .field("one_time", &self.one_time)
            .field("revoked", &self.revoked)
            .field("require_secret", &self.require_secret)
            .finish_non_exhaustive()
    }
}

/// One append-only entry per share resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareAccessLog {
    pub share_token_id: String,
    pub ip_address: Option<String>,
    pub success: bool,
}

/// Mask a share token for logs: first three characters, then `***`.
pub fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(3).collect();
    format!("{prefix}***")
}

/// Format a timestamp the way it is persisted (fixed width, lexically ordered).
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a persisted timestamp.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(expires_in: Duration, revoked: bool) -> ShareTokenRecord {
        let now = Utc::now();
        ShareTokenRecord {
            id: "st-1".into(),
            token: "AbCdEfGh1234".into(),
            credential_id: "cred-1".into(),
            created_by: "user-1".into(),
            expires_at: now + expires_in,
            max_views: 1,
            views: 0,
            one_time: true,
            revoked,
            require_secret: false,
            secret_key_salt: None,
            secret_key_hash: None,
            created_at: now,
        }
    }

    #[test]
    fn share_state_is_derived() {
        let now = Utc::now();
        assert_eq!(token(Duration::hours(1), false).state_at(now), ShareState::Active);
        assert_eq!(token(Duration::hours(-1), false).state_at(now), ShareState::Expired);
        assert_eq!(token(Duration::hours(1), true).state_at(now), ShareState::Revoked);
    }

    #[test]
    fn debug_masks_public_token() {
        let debug = format!("{:?}", token(Duration::hours(1), false));
        assert!(!debug.contains("AbCdEfGh1234"));
        assert!(debug.contains("AbC***"));
    }

    #[test]
    fn timestamps_roundtrip_and_sort() {
        let earlier = Utc::now();
        let later = earlier + Duration::milliseconds(1500);
        let a = format_timestamp(earlier);
        let b = format_timestamp(later);
        assert!(a < b);
        assert_eq!(a.len(), b.len());
        let parsed = parse_timestamp(&a).unwrap();
        assert_eq!(parsed.timestamp_millis(), earlier.timestamp_millis());
    }

    #[test]
    fn access_level_display() {
        assert_eq!(AccessLevel::OwnerOnly.to_string(), "owner_only");
        assert_eq!(AccessLevel::OwnerOrGrantee.to_string(), "owner_or_grantee");
    }
}
