// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id derivation (Algorithm::Argon2id, Version::V0x13).

use ring::rand::{SecureRandom, SystemRandom};
use toolvault_core::ToolvaultError;
use zeroize::Zeroizing;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Derived output length in bytes.
pub const OUTPUT_LEN: usize = 32;

/// Derive a 32-byte digest from `secret` using Argon2id.
///
/// The returned buffer is wrapped in [`Zeroizing`] for automatic memory
/// zeroing on drop.
pub fn derive_key(
    secret: &[u8],
    salt: &[u8],
    memory_cost: u32,
    iterations: u32,
    parallelism: u32,
) -> Result<Zeroizing<[u8; OUTPUT_LEN]>, ToolvaultError> {
    let params = argon2::Params::new(memory_cost, iterations, parallelism, Some(OUTPUT_LEN))
        .map_err(|e| ToolvaultError::Internal(format!("invalid Argon2id parameters: {e}")))?;

    let argon2 = argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; OUTPUT_LEN]);
    argon2
        .hash_password_into(secret, salt, output.as_mut())
        .map_err(|e| ToolvaultError::Internal(format!("Argon2id derivation failed: {e}")))?;

    Ok(output)
}

/// Generate a random 16-byte salt for Argon2id.
pub fn generate_salt() -> Result<[u8; SALT_LEN], ToolvaultError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| ToolvaultError::Internal("failed to generate random salt".to_string()))?;
    Ok(salt)
}
