//! Cache configuration.

/// Configuration for a cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    /// `0` means the cache is unbounded.
    pub max_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with the given max capacity.
    pub fn with_capacity(max_capacity: usize) -> Self {
        Self { max_capacity }
    }

    /// Create a config with no capacity limit.
    pub fn unbounded() -> Self {
        Self { max_capacity: 0 }
    }

    /// Set max capacity for cache (builder pattern).
    #[must_use]
    pub fn max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// The effective limit, `None` when unbounded.
    pub fn limit(&self) -> Option<usize> {
        (self.max_capacity > 0).then_some(self.max_capacity)
    }

    /// Create config for collections that are few and long lived.
    /// Guilds and roles rarely exceed a few thousand per connection.
    pub fn small_collection() -> Self {
        Self {
            max_capacity: 2_000,
        }
    }

    /// Create config for large, churn-heavy collections.
    /// Members and users grow with every message seen.
    pub fn large_collection() -> Self {
        Self {
            max_capacity: 50_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit() {
        assert_eq!(CacheConfig::unbounded().limit(), None);
        assert_eq!(CacheConfig::with_capacity(0).limit(), None);
        assert_eq!(CacheConfig::default().max_capacity(3).limit(), Some(3));
    }
}
