//! Short, human-ergonomic session identifiers.
//!
//! IDs are for ergonomics, not secrecy (spec §9): four lowercase
//! alphanumeric characters, allocated by retrying on collision rather
//! than surfacing it to callers under normal load.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const LEN: usize = 4;
const MAX_ALLOCATION_ATTEMPTS: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Case-insensitive: always stored and compared lowercase.
    pub fn parse(raw: &str) -> Self {
        SessionId(raw.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn random() -> Self {
        let mut rng = rand::thread_rng();
        let s: String = (0..LEN)
            .map(|_| {
                let idx = rng.gen_range(0..ALPHABET.len());
                ALPHABET[idx] as char
            })
            .collect();
        SessionId(s)
    }

    /// Allocate an ID unused according to `is_taken`, retrying up to a
    /// bounded number of times. Returns `None` on persistent collision,
    /// which the caller should surface as `CommandError::Conflict` —
    /// an outcome spec.md calls "rare".
    pub fn allocate(is_taken: impl Fn(&SessionId) -> bool) -> Option<Self> {
        for _ in 0..MAX_ALLOCATION_ATTEMPTS {
            let candidate = Self::random();
            if !is_taken(&candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lowercases() {
        assert_eq!(SessionId::parse("AbCd").as_str(), "abcd");
    }

    #[test]
    fn random_ids_are_four_chars() {
        let id = SessionId::random();
        assert_eq!(id.as_str().len(), LEN);
    }

    #[test]
    fn allocate_retries_on_collision() {
        let mut first_seen = None;
        let id = SessionId::allocate(|candidate| {
            if first_seen.is_none() {
                first_seen = Some(candidate.clone());
                true // force one retry
            } else {
                false
            }
        });
        assert!(id.is_some());
    }

    #[test]
    fn allocate_gives_up_after_persistent_collision() {
        let id = SessionId::allocate(|_| true);
        assert!(id.is_none());
    }
}
