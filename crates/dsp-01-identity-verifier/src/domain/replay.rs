//! # Token Replay Guard
//!
//! Remembers token ids until their expiry so a captured token cannot be
//! presented twice.
//!
//! ## Security Properties
//!
//! - Exact tracking (no false positives)
//! - Entries are purged once their token has expired, bounding memory by the
//!   number of live tokens

use parking_lot::Mutex;
use shared_types::Timestamp;
use std::collections::HashMap;

/// Seen token ids with their expiry.
#[derive(Debug, Default)]
pub struct ReplayGuard {
    seen: Mutex<HashMap<String, Timestamp>>,
}

impl ReplayGuard {
    /// Create an empty guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `token_id`; returns `true` if it was already recorded and is
    /// still live (a replay).
    pub fn check_and_record(&self, token_id: &str, expires_at: Timestamp, now: Timestamp) -> bool {
        let mut seen = self.seen.lock();
        seen.retain(|_, exp| *exp >= now);
        if seen.contains_key(token_id) {
            return true;
        }
        seen.insert(token_id.to_string(), expires_at);
        false
    }

    /// Number of tracked ids.
    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    /// Nothing tracked.
    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_detected() {
        let guard = ReplayGuard::new();
        assert!(!guard.check_and_record("jti-1", 200, 100));
        assert!(guard.check_and_record("jti-1", 200, 150));
    }

    #[test]
    fn test_expired_entries_purged() {
        let guard = ReplayGuard::new();
        guard.check_and_record("jti-1", 200, 100);
        guard.check_and_record("jti-2", 500, 100);
        assert_eq!(guard.len(), 2);

        assert!(!guard.check_and_record("jti-3", 600, 300));
        assert_eq!(guard.len(), 2);
    }
}
