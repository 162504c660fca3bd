//! Cache statistics reporting.

use std::fmt;

use serde::Serialize;

/// Point-in-time statistics for one cache.
///
/// Counters are for observability only; nothing in the pipeline makes
/// decisions based on them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Cache name ("tile", "network").
    pub name: String,
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Approximate number of live entries.
    pub entry_count: u64,
    /// Configured entry limit.
    pub max_entries: u64,
}

impl CacheStats {
    /// Hit rate in `0.0..=1.0`; `0.0` before the first lookup.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cache: {} hits, {} misses, success ratio {:.3} ({}/{} entries)",
            self.name,
            self.hits,
            self.misses,
            self.hit_ratio(),
            self.entry_count,
            self.max_entries
        )
    }
}
