use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Issues note and photo identifiers.
///
/// Ids look like millisecond timestamps, matching existing stored data, but
/// are strictly increasing: two creations within the same millisecond get
/// distinct ids, and a new id is always above the largest id already present
/// in the target collection.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id, strictly greater than `floor` when given. `None` once no
    /// larger `i64` is left.
    pub fn next_after(&self, floor: Option<i64>) -> Option<i64> {
        let now = Utc::now().timestamp_millis();
        let mut current = self.last.load(Ordering::Acquire);
        loop {
            let mut candidate = now.max(current.checked_add(1)?);
            if let Some(floor) = floor {
                candidate = candidate.max(floor.checked_add(1)?);
            }
            match self
                .last
                .compare_exchange_weak(current, candidate, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return Some(candidate),
                Err(actual) => current = actual,
            }
        }
    }

    pub fn next(&self) -> Option<i64> {
        self.next_after(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_rapid_ids_are_unique_and_increasing() {
        let ids = IdGenerator::new();
        let issued: Vec<i64> = (0..1000).map(|_| ids.next().unwrap()).collect();
        assert!(issued.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_respects_floor() {
        let ids = IdGenerator::new();
        let far_future = Utc::now().timestamp_millis() + 1_000_000;
        assert_eq!(ids.next_after(Some(far_future)), Some(far_future + 1));
        assert!(ids.next().unwrap() > far_future + 1);
    }

    #[test]
    fn test_exhausted_id_space() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next_after(Some(i64::MAX)), None);
        assert_eq!(ids.next_after(Some(i64::MAX - 1)), Some(i64::MAX));
        // Nothing is left above the last issued id.
        assert_eq!(ids.next(), None);
    }

    #[test]
    fn test_unique_across_threads() {
        let ids = Arc::new(IdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..250).map(|_| ids.next().unwrap()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {}", id);
            }
        }
        assert_eq!(seen.len(), 1000);
    }
}
