//! Record identifiers.
//!
//! Ids are Unix timestamps in milliseconds rendered as decimal strings. When two
//! ids are requested within the same millisecond the later one is bumped past the
//! previous, so a batch created in one go never collides.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Returns a fresh identifier, strictly greater than every id returned before it
/// by this process.
#[must_use]
pub fn next_id() -> String {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return candidate.to_string(),
            Err(actual) => last = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_batch_of_ids_never_collides() {
        let ids: Vec<String> = (0..1000).map(|_| next_id()).collect();
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_ids_increase_and_track_the_clock() {
        let before = Utc::now().timestamp_millis();
        let first: i64 = next_id().parse().unwrap();
        let second: i64 = next_id().parse().unwrap();
        assert!(first >= before);
        assert!(second > first);
    }

    #[test]
    fn test_concurrent_ids_are_unique() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..250).map(|_| next_id()).collect::<Vec<_>>()))
            .collect();
        let mut all = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(all.insert(id));
            }
        }
        assert_eq!(all.len(), 1000);
    }
}
