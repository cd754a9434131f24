// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cryptographic primitives for toolvault.
//!
//! - [`Cipher`]: AES-256-GCM field encryption with a base64 `nonce || ct+tag`
//!   wire format and a fallback for legacy plaintext rows.
//! - [`SecretGate`]: Argon2id hashing and constant-time verification of
//!   share secrets.
//! - [`generate_token`]: public share identifiers.
//!
//! Keys and derived material are held in [`zeroize::Zeroizing`] buffers and
//! never appear in `Debug` output or logs.

pub mod cipher;
pub mod kdf;
pub mod secret_gate;
pub mod token;

pub use cipher::{generate_random_key, Cipher, DEV_INSECURE_KEY};
pub use secret_gate::{constant_time_eq, SecretGate, SECRET_ALPHABET};
pub use token::generate_token;
