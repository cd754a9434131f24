// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Public share token generation.

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

/// Generate a mixed-case alphanumeric token of `len` characters from the OS CSPRNG.
///
/// At 62 symbols per character a 12-character token carries ~71 bits, so
/// uniqueness is not re-checked against the store.
pub fn generate_token(len: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn token_has_requested_length_and_charset() {
        let t = generate_token(12);
        assert_eq!(t.len(), 12);
        assert!(t.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn tokens_do_not_collide() {
        let tokens: HashSet<_> = (0..1000).map(|_| generate_token(12)).collect();
        assert_eq!(tokens.len(), 1000);
    }
}
