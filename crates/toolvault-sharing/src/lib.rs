// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access control, the encrypted credential store and the share link
//! lifecycle.
//!
//! Every path that reveals or mutates credential material passes either the
//! [`AccessGuard`] (authenticated owner or grantee) or share token validation
//! in [`ShareManager::resolve`] (anonymous holder of a live link). There is
//! no third path.

pub mod access;
pub mod credentials;
pub mod identity;
pub mod shares;
pub mod tools;

pub use access::AccessGuard;
pub use credentials::{CredentialStore, CredentialUpdate, CredentialView, NewCredential};
pub use identity::StaticIdentityProvider;
pub use shares::{RevealedCredential, ShareGrant, ShareManager, ShareRequest};
pub use tools::{NewTool, ToolAdmin, ToolUpdate};
