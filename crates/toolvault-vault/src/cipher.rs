// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM field cipher.
//!
//! Wire format: `base64(nonce[12] || ciphertext || tag[16])`, standard
//! alphabet with padding. Every call to [`Cipher::encrypt`] draws a fresh
//! random 96-bit nonce from the system CSPRNG.
//!
//! Rows written before encryption was introduced hold plaintext. Input that
//! does not decode as base64, or decodes to no more than a nonce, is handed
//! back unchanged by [`Cipher::decrypt`]. Anything longer that fails
//! authentication is a hard [`ToolvaultError::DecryptionFailed`].

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};
use toolvault_config::VaultConfig;
use toolvault_core::ToolvaultError;
use tracing::warn;
use zeroize::Zeroizing;

/// Key length required by AES-256-GCM.
pub const KEY_LEN: usize = 32;

/// Fallback secret used when no key is configured. Never use in production.
pub const DEV_INSECURE_KEY: &str = "dev-insecure-key-change-me";

/// Field cipher holding the process-wide data key.
///
/// The key is derived from the configured secret on first use and cached
/// for the lifetime of the cipher.
pub struct Cipher {
    secret: Option<SecretString>,
    key: OnceLock<Zeroizing<[u8; KEY_LEN]>>,
    rng: SystemRandom,
}

impl Cipher {
    /// Build a cipher from the `[vault]` section.
    pub fn new(config: &VaultConfig) -> Self {
        let secret = config
            .encryption_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .map(|k| SecretString::from(k.to_string()));
        Self {
            secret,
            key: OnceLock::new(),
            rng: SystemRandom::new(),
        }
    }

    /// Build a cipher from an explicit secret.
    pub fn from_secret(secret: impl Into<String>) -> Self {
        Self::new(&VaultConfig {
            encryption_key: Some(secret.into()),
        })
    }

    /// Whether this cipher falls back to [`DEV_INSECURE_KEY`].
    pub fn uses_dev_key(&self) -> bool {
        self.secret.is_none()
    }

    fn key(&self) -> &[u8; KEY_LEN] {
        self.key.get_or_init(|| match &self.secret {
            Some(secret) => derive_key_bytes(secret.expose_secret()),
            None => {
                warn!(
                    "no vault encryption key configured, using the insecure development key; \
                     set TOOLVAULT_VAULT_ENCRYPTION_KEY before storing real credentials"
                );
                derive_key_bytes(DEV_INSECURE_KEY)
            }
        })
    }

    fn sealing_key(&self) -> Result<LessSafeKey, ToolvaultError> {
        let unbound = UnboundKey::new(&AES_256_GCM, self.key())
            .map_err(|_| ToolvaultError::Internal("failed to create AES-256-GCM key".to_string()))?;
        Ok(LessSafeKey::new(unbound))
    }

    /// Encrypt `plaintext` into the base64 wire format.
    ///
    /// The empty string maps to the empty string.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, ToolvaultError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let key = self.sealing_key()?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| ToolvaultError::Internal("failed to generate random nonce".to_string()))?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = plaintext.as_bytes().to_vec();
        key.seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| ToolvaultError::Internal("AES-256-GCM encryption failed".to_string()))?;

        let mut framed = Vec::with_capacity(NONCE_LEN + in_out.len());
        framed.extend_from_slice(&nonce_bytes);
        framed.extend_from_slice(&in_out);
        Ok(STANDARD.encode(framed))
    }

    /// Decrypt a value produced by [`Cipher::encrypt`], or pass legacy
    /// plaintext through.
    pub fn decrypt(&self, stored: &str) -> Result<String, ToolvaultError> {
        if stored.is_empty() {
            return Ok(String::new());
        }

        let framed = match STANDARD.decode(stored) {
            Ok(bytes) if bytes.len() > NONCE_LEN => bytes,
            _ => return Ok(stored.to_string()),
        };

        let (nonce_bytes, sealed) = framed.split_at(NONCE_LEN);
        let nonce =
            Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| ToolvaultError::DecryptionFailed)?;

        let key = self.sealing_key()?;
        let mut in_out = Zeroizing::new(sealed.to_vec());
        let plaintext = key
            .open_in_place(nonce, Aad::empty(), in_out.as_mut_slice())
            .map_err(|_| ToolvaultError::DecryptionFailed)?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| ToolvaultError::DecryptionFailed)
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher")
            .field("key", &"[REDACTED]")
            .field("dev_key", &self.uses_dev_key())
            .finish()
    }
}

/// Base64 secrets are decoded, anything else is taken as raw UTF-8; the
/// bytes are then truncated or zero-padded to 32.
fn derive_key_bytes(secret: &str) -> Zeroizing<[u8; KEY_LEN]> {
    let raw = Zeroizing::new(
        STANDARD
            .decode(secret)
            .unwrap_or_else(|_| secret.as_bytes().to_vec()),
    );
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    let n = raw.len().min(KEY_LEN);
    key[..n].copy_from_slice(&raw[..n]);
    key
}

/// Generate a random 32-byte key, base64-encoded, for `toolvault keygen`.
pub fn generate_random_key() -> Result<String, ToolvaultError> {
    let rng = SystemRandom::new();
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    rng.fill(key.as_mut())
        .map_err(|_| ToolvaultError::Internal("failed to generate random key".to_string()))?;
    Ok(STANDARD.encode(key.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tracing_test::traced_test;

    fn cipher() -> Cipher {
        Cipher::from_secret("MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=")
    }

    #[test]
    fn roundtrip_simple() {
        let c = cipher();
        let ct = c.encrypt("hunter2").unwrap();
        assert_ne!(ct, "hunter2");
        assert_eq!(c.decrypt(&ct).unwrap(), "hunter2");
    }

    #[test]
    fn empty_string_is_sentinel() {
        let c = cipher();
        assert_eq!(c.encrypt("").unwrap(), "");
        assert_eq!(c.decrypt("").unwrap(), "");
    }

    #[test]
    fn wire_format_is_nonce_ct_tag() {
        let c = cipher();
        let ct = c.encrypt("hello").unwrap();
        let bytes = STANDARD.decode(&ct).unwrap();
        assert_eq!(bytes.len(), NONCE_LEN + 5 + 16);
    }

    #[test]
    fn nonce_is_fresh_per_call() {
        let c = cipher();
        let a = STANDARD.decode(c.encrypt("same input").unwrap()).unwrap();
        let b = STANDARD.decode(c.encrypt("same input").unwrap()).unwrap();
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn legacy_plaintext_passes_through() {
        let c = cipher();
        assert_eq!(c.decrypt("plainstring").unwrap(), "plainstring");
        // Valid base64, but not longer than a nonce.
        assert_eq!(c.decrypt("YWJjZA==").unwrap(), "YWJjZA==");
    }

    #[test]
    fn every_tampered_byte_is_rejected() {
        let c = cipher();
        let ct = c.encrypt("do not tamper").unwrap();
        let bytes = STANDARD.decode(&ct).unwrap();
        for i in 0..bytes.len() {
            let mut tampered = bytes.clone();
            tampered[i] ^= 0x01;
            let err = c.decrypt(&STANDARD.encode(&tampered)).unwrap_err();
            assert!(
                matches!(err, ToolvaultError::DecryptionFailed),
                "byte {i} flip was not detected"
            );
        }
    }

    #[test]
    fn wrong_key_is_decryption_failure() {
        let ct = cipher().encrypt("secret").unwrap();
        let other = Cipher::from_secret("a completely different secret");
        assert!(matches!(
            other.decrypt(&ct).unwrap_err(),
            ToolvaultError::DecryptionFailed
        ));
    }

    #[test]
    fn raw_and_padded_keys_derive_deterministically() {
        let short = derive_key_bytes("short");
        assert_eq!(&short[..5], b"short");
        assert!(short[5..].iter().all(|b| *b == 0));

        // '-' is outside the standard alphabet, so this is taken as raw bytes.
        let raw = "x-".repeat(20);
        let long = derive_key_bytes(&raw);
        assert_eq!(&long[..], &raw.as_bytes()[..KEY_LEN]);

        let a = Cipher::from_secret("short");
        let b = Cipher::from_secret("short");
        assert_eq!(b.decrypt(&a.encrypt("v").unwrap()).unwrap(), "v");
    }

    #[test]
    fn base64_key_is_decoded() {
        let key = derive_key_bytes("MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=");
        assert_eq!(&key[..], b"0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn long_base64_key_is_decoded_then_truncated() {
        let material = b"0123456789abcdef0123456789abcdefOVERFLOW";
        let key = derive_key_bytes(&STANDARD.encode(material));
        assert_eq!(&key[..], &material[..KEY_LEN]);
    }

    #[traced_test]
    #[test]
    fn dev_key_warns_once() {
        let c = Cipher::new(&VaultConfig::default());
        assert!(c.uses_dev_key());
        let ct = c.encrypt("x").unwrap();
        c.decrypt(&ct).unwrap();
        logs_assert(|lines: &[&str]| {
            match lines.iter().filter(|l| l.contains("insecure development key")).count() {
                1 => Ok(()),
                n => Err(format!("expected one warning, saw {n}")),
            }
        });
    }

    #[test]
    fn debug_is_redacted() {
        let c = Cipher::from_secret("top-secret-value");
        let debug = format!("{c:?}");
        assert!(!debug.contains("top-secret-value"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn generated_key_is_32_bytes() {
        let k = generate_random_key().unwrap();
        assert_eq!(STANDARD.decode(&k).unwrap().len(), KEY_LEN);
        assert_ne!(k, generate_random_key().unwrap());
    }

    proptest! {
        #[test]
        fn roundtrip_any_text(p in "\\PC*") {
            let c = cipher();
            let ct = c.encrypt(&p).unwrap();
            prop_assert_eq!(c.decrypt(&ct).unwrap(), p);
        }

        #[test]
        fn roundtrip_multibyte(p in "[äöü€😀日本語]{1,32}") {
            let c = cipher();
            prop_assert_eq!(c.decrypt(&c.encrypt(&p).unwrap()).unwrap(), p);
        }
    }
}
