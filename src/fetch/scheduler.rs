//! Per-field request spacing

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Hands out start instants so that two requests for the same field never
/// start less than `crawl_delay` apart
#[derive(Debug)]
pub struct RateScheduler {
    crawl_delay: chrono::Duration,
    next_allowed: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl RateScheduler {
    pub fn new(crawl_delay: Duration) -> Self {
        Self {
            crawl_delay: chrono::Duration::from_std(crawl_delay)
                .unwrap_or(chrono::Duration::zero()),
            next_allowed: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve the earliest start for `field` at or after `now`
    pub fn reserve(&self, field: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut slots = self.next_allowed.lock().unwrap_or_else(PoisonError::into_inner);
        let start = match slots.get(field) {
            Some(&next) if next > now => next,
            _ => now,
        };
        let next = start.checked_add_signed(self.crawl_delay).unwrap_or(DateTime::<Utc>::MAX_UTC);
        slots.insert(field.to_string(), next);
        start
    }

    pub fn crawl_delay(&self) -> Duration {
        self.crawl_delay.to_std().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_field_requests_are_spaced() {
        let scheduler = RateScheduler::new(Duration::from_secs(1));
        let t0 = DateTime::<Utc>::UNIX_EPOCH;

        assert_eq!(scheduler.reserve("AI", t0), t0);
        assert_eq!(scheduler.reserve("AI", t0), t0 + chrono::Duration::seconds(1));
        assert_eq!(scheduler.reserve("AI", t0), t0 + chrono::Duration::seconds(2));
    }

    #[test]
    fn test_fields_are_independent() {
        let scheduler = RateScheduler::new(Duration::from_secs(1));
        let t0 = DateTime::<Utc>::UNIX_EPOCH;
        assert_eq!(scheduler.reserve("AI", t0), t0);
        assert_eq!(scheduler.reserve("ML", t0), t0);
    }

    #[test]
    fn test_late_request_starts_immediately() {
        let scheduler = RateScheduler::new(Duration::from_millis(1500));
        let t0 = DateTime::<Utc>::UNIX_EPOCH;
        scheduler.reserve("AI", t0);
        let later = t0 + chrono::Duration::seconds(5);
        assert_eq!(scheduler.reserve("AI", later), later);
        assert_eq!(scheduler.crawl_delay(), Duration::from_millis(1500));
    }
}
