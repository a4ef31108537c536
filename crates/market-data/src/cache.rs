//! TTL cache for provider responses, keyed by `(ticker, operation, source)`.
//! A stale entry is still returned — wrapped in `MarketSource::StaleCache` —
//! when every provider in the chain has failed and the entry is no older
//! than `STALE_MULTIPLIER` times its TTL.

use dashmap::DashMap;
use std::time::{Duration, Instant};

const STALE_MULTIPLIER: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Quote,
    Historical,
    Indicators,
}

impl Operation {
    pub fn ttl(self) -> Duration {
        match self {
            Operation::Quote => Duration::from_secs(60),
            Operation::Historical => Duration::from_secs(60 * 60),
            Operation::Indicators => Duration::from_secs(15 * 60),
        }
    }
}

type Key = (String, Operation, &'static str);

struct Entry<T> {
    value: T,
    stored_at: Instant,
    ttl: Duration,
}

pub struct TtlCache<T: Clone> {
    entries: DashMap<Key, Entry<T>>,
}

pub enum Lookup<T> {
    Fresh(T),
    Stale(T),
    Miss,
}

impl<T: Clone> TtlCache<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, ticker: &str, op: Operation, source: &'static str) -> Lookup<T> {
        let key = (ticker.to_string(), op, source);
        match self.entries.get(&key) {
            Some(entry) => {
                let age = entry.stored_at.elapsed();
                if age <= entry.ttl {
                    Lookup::Fresh(entry.value.clone())
                } else if age <= entry.ttl * STALE_MULTIPLIER {
                    Lookup::Stale(entry.value.clone())
                } else {
                    Lookup::Miss
                }
            }
            None => Lookup::Miss,
        }
    }

    pub fn put(&self, ticker: &str, op: Operation, source: &'static str, value: T) {
        self.entries.insert(
            (ticker.to_string(), op, source),
            Entry {
                value,
                stored_at: Instant::now(),
                ttl: op.ttl(),
            },
        );
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fresh_hit_returns_value() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.put("NVDA", Operation::Quote, "primary", 42);
        match cache.get("NVDA", Operation::Quote, "primary") {
            Lookup::Fresh(v) => assert_eq!(v, 42),
            _ => panic!("expected fresh hit"),
        }
    }

    #[test]
    fn miss_on_unknown_key() {
        let cache: TtlCache<u32> = TtlCache::new();
        assert!(matches!(
            cache.get("AAPL", Operation::Quote, "primary"),
            Lookup::Miss
        ));
    }

    #[test]
    fn different_sources_do_not_clobber_each_other() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.put("NVDA", Operation::Quote, "primary", 1);
        cache.put("NVDA", Operation::Quote, "secondary", 2);
        match cache.get("NVDA", Operation::Quote, "primary") {
            Lookup::Fresh(v) => assert_eq!(v, 1),
            _ => panic!("expected fresh hit"),
        }
        match cache.get("NVDA", Operation::Quote, "secondary") {
            Lookup::Fresh(v) => assert_eq!(v, 2),
            _ => panic!("expected fresh hit"),
        }
    }

    #[test]
    fn stale_within_multiplier_window() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.entries.insert(
            ("NVDA".to_string(), Operation::Quote, "primary"),
            Entry {
                value: 7,
                stored_at: Instant::now() - Duration::from_secs(120),
                ttl: Duration::from_secs(60),
            },
        );
        match cache.get("NVDA", Operation::Quote, "primary") {
            Lookup::Stale(v) => assert_eq!(v, 7),
            _ => panic!("expected stale hit"),
        }
    }

    #[test]
    fn expired_beyond_multiplier_is_miss() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.entries.insert(
            ("NVDA".to_string(), Operation::Quote, "primary"),
            Entry {
                value: 7,
                stored_at: Instant::now() - Duration::from_secs(700),
                ttl: Duration::from_secs(60),
            },
        );
        assert!(matches!(
            cache.get("NVDA", Operation::Quote, "primary"),
            Lookup::Miss
        ));
        thread::yield_now();
    }
}
