//! Seed & PRNG derivation (component A).
//!
//! Given a user seed, a server seed and a Unix timestamp, derives a
//! deterministic sequence of 64-bit numbers. Anyone who later learns the
//! same three inputs — which happens by design once the server seed is
//! revealed — can recompute the exact same sequence and so verify any past
//! wager outcome.
//!
//! ## Construction
//! ```text
//! T       = decimal(timestamp) || user_seed || server_seed
//! word[i] = be_u64(blake2b_256(decimal(i) || T)[0..8])   for i in 0..n
//! ```
//!
//! The digest is BLAKE2b truncated to a 256-bit (32-byte) output, matching
//! the commitment scheme the rest of the stack hashes seeds with.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;

/// Derives `count` deterministic 64-bit numbers from the given seed triple.
///
/// Callers must request at least `game.numbers_per_bet() * num_games`
/// numbers; requesting fewer than a game consumes is a caller bug, not
/// something this function can detect.
pub fn derive_numbers(user_seed: &str, server_seed: &str, timestamp: u64, count: u64) -> Vec<u64> {
    let suffix = format!("{timestamp}{user_seed}{server_seed}");
    (0..count)
        .map(|i| {
            let mut hasher = Blake2b256::new();
            hasher.update(i.to_string().as_bytes());
            hasher.update(suffix.as_bytes());
            let digest = hasher.finalize();
            u64::from_be_bytes(digest[0..8].try_into().expect("digest is 32 bytes"))
        })
        .collect()
}

/// Hex-encoded BLAKE2b-256 digest of `value`, used both to commit server
/// seeds and to hash the client-chosen user seed secret before storage.
pub fn hash_hex(value: &str) -> String {
    let mut hasher = Blake2b256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_calls() {
        let a = derive_numbers("client-seed", "server-seed", 1_700_000_000, 8);
        let b = derive_numbers("client-seed", "server-seed", 1_700_000_000, 8);
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn distinct_seeds_diverge() {
        let a = derive_numbers("alice-seed", "server-seed", 1_700_000_000, 4);
        let b = derive_numbers("bob-seed", "server-seed", 1_700_000_000, 4);
        assert_ne!(a, b);
    }

    #[test]
    fn distinct_indices_diverge() {
        let seq = derive_numbers("client-seed", "server-seed", 1_700_000_000, 16);
        let mut sorted = seq.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), seq.len(), "no collisions expected in a 16-word run");
    }

    #[test]
    fn hash_hex_is_stable() {
        assert_eq!(hash_hex("myseed"), hash_hex("myseed"));
        assert_eq!(hash_hex("myseed").len(), 64);
    }
}
