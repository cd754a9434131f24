// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Share secrets: generation, salted Argon2id hashing and verification.
//!
//! Only the salt and hash are persisted. Verification always runs the full
//! derivation and compares in constant time, so timing does not depend on
//! how many leading bytes of a guess are correct.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use toolvault_config::SharingConfig;
use toolvault_core::ToolvaultError;

use crate::kdf::{self, SALT_LEN};

/// Characters for generated secrets. Excludes `0 O 1 I l`.
pub const SECRET_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Argon2id-backed share secret gate.
#[derive(Debug, Clone)]
pub struct SecretGate {
    secret_length: usize,
    memory_cost: u32,
    iterations: u32,
    parallelism: u32,
}

impl SecretGate {
    /// Build a gate from the `[sharing]` section.
    pub fn new(config: &SharingConfig) -> Self {
        Self {
            secret_length: config.secret_length,
            memory_cost: config.kdf_memory_cost,
            iterations: config.kdf_iterations,
            parallelism: config.kdf_parallelism,
        }
    }

    /// Generate a human-typable secret from [`SECRET_ALPHABET`].
    pub fn generate_secret(&self) -> SecretString {
        let mut rng = OsRng;
        let secret: String = (0..self.secret_length)
            .map(|_| SECRET_ALPHABET[rng.gen_range(0..SECRET_ALPHABET.len())] as char)
            .collect();
        SecretString::from(secret)
    }

    /// Hash `secret` under a fresh salt. Returns `(salt_b64, hash_b64)`.
    pub fn derive(&self, secret: &SecretString) -> Result<(String, String), ToolvaultError> {
        let salt = kdf::generate_salt()?;
        let hash = self.hash(secret.expose_secret().as_bytes(), &salt)?;
        Ok((STANDARD.encode(salt), STANDARD.encode(hash.as_ref())))
    }

    /// Check `candidate` against a stored salt and hash.
    ///
    /// Undecodable or short salts are treated as a non-match rather than an
    /// error, but the derivation still runs against a zero salt so the call
    /// costs the same either way.
    pub fn verify(&self, candidate: &str, salt_b64: &str, hash_b64: &str) -> bool {
        let (salt, salt_ok) = match STANDARD.decode(salt_b64) {
            Ok(bytes) if bytes.len() >= SALT_LEN => (bytes, true),
            _ => (vec![0u8; SALT_LEN], false),
        };
        let expected = STANDARD.decode(hash_b64).unwrap_or_default();

        match self.hash(candidate.as_bytes(), &salt) {
            Ok(actual) => constant_time_eq(actual.as_ref(), &expected) && salt_ok,
            Err(_) => false,
        }
    }

    fn hash(
        &self,
        secret: &[u8],
        salt: &[u8],
    ) -> Result<zeroize::Zeroizing<[u8; kdf::OUTPUT_LEN]>, ToolvaultError> {
        kdf::derive_key(
            secret,
            salt,
            self.memory_cost,
            self.iterations,
            self.parallelism,
        )
    }
}

/// Compare two byte strings without short-circuiting on the first mismatch.
///
/// Length is not secret; unequal lengths return `false` immediately.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn gate() -> SecretGate {
        SecretGate::new(&SharingConfig {
            kdf_memory_cost: 1024,
            kdf_iterations: 1,
            ..SharingConfig::default()
        })
    }

    #[test]
    fn generated_secret_uses_unambiguous_alphabet() {
        let g = gate();
        for _ in 0..50 {
            let s = g.generate_secret();
            let s = s.expose_secret();
            assert_eq!(s.len(), 10);
            assert!(s.bytes().all(|b| SECRET_ALPHABET.contains(&b)));
            assert!(!s.contains(['0', 'O', '1', 'I', 'l']));
        }
    }

    #[test]
    fn derive_then_verify() {
        let g = gate();
        let secret = SecretString::from("K7pQ2mX9aB".to_string());
        let (salt, hash) = g.derive(&secret).unwrap();
        assert_eq!(STANDARD.decode(&salt).unwrap().len(), SALT_LEN);
        assert_eq!(STANDARD.decode(&hash).unwrap().len(), 32);

        assert!(g.verify("K7pQ2mX9aB", &salt, &hash));
        assert!(!g.verify("K7pQ2mX9aC", &salt, &hash));
        assert!(!g.verify("", &salt, &hash));
    }

    #[test]
    fn same_secret_gets_distinct_salts() {
        let g = gate();
        let secret = SecretString::from("abcdefghjk".to_string());
        let (s1, h1) = g.derive(&secret).unwrap();
        let (s2, h2) = g.derive(&secret).unwrap();
        assert_ne!(s1, s2);
        assert_ne!(h1, h2);
    }

    #[test]
    fn malformed_salt_is_a_non_match() {
        let g = gate();
        let secret = SecretString::from("abcdefghjk".to_string());
        let (_, hash) = g.derive(&secret).unwrap();
        assert!(!g.verify("abcdefghjk", "%%%not-base64%%%", &hash));
        assert!(!g.verify("abcdefghjk", "c2hvcnQ=", &hash));
    }

    #[test]
    fn constant_time_eq_semantics() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }

    fn median(mut samples: Vec<Duration>) -> Duration {
        samples.sort();
        samples[samples.len() / 2]
    }

    #[test]
    fn verify_time_does_not_depend_on_prefix_match() {
        let g = gate();
        let secret = "K7pQ2mX9aB";
        let (salt, hash) = g.derive(&SecretString::from(secret.to_string())).unwrap();

        let mut near = Vec::new();
        let mut far = Vec::new();
        for _ in 0..21 {
            let t = Instant::now();
            assert!(!g.verify("K7pQ2mX9aC", &salt, &hash));
            near.push(t.elapsed());

            let t = Instant::now();
            assert!(!g.verify("zzzzzzzzzz", &salt, &hash));
            far.push(t.elapsed());
        }

        let near = median(near).as_secs_f64();
        let far = median(far).as_secs_f64();
        let ratio = near / far;
        assert!(
            (0.5..=2.0).contains(&ratio),
            "median verify times diverge: near={near:.6}s far={far:.6}s"
        );
    }
}
