//! Configuration module for the mirror.
//!
//! Loads per-collection cache capacities from environment variables.

use std::env;

use crate::cache::CacheConfig;
use crate::error::{MirrorError, Result};

/// Capacities for every mirrored collection.
///
/// A capacity of `0` leaves that collection unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorConfig {
    pub guilds: CacheConfig,
    pub channels: CacheConfig,
    pub threads: CacheConfig,
    /// Applied to each guild's role cache.
    pub roles: CacheConfig,
    /// Applied to each guild's member cache.
    pub members: CacheConfig,
    pub users: CacheConfig,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            guilds: CacheConfig::small_collection(),
            channels: CacheConfig::default(),
            threads: CacheConfig::default(),
            roles: CacheConfig::small_collection(),
            members: CacheConfig::large_collection(),
            users: CacheConfig::large_collection(),
        }
    }
}

impl MirrorConfig {
    /// A config with every collection unbounded.
    pub fn unbounded() -> Self {
        let unbounded = CacheConfig::unbounded();
        Self {
            guilds: unbounded,
            channels: unbounded,
            threads: unbounded,
            roles: unbounded,
            members: unbounded,
            users: unbounded,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    /// Returns `MirrorError::Config` if a variable is not a non-negative integer.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let capacity = |key: &'static str, default: CacheConfig| -> Result<CacheConfig> {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => raw
                    .trim()
                    .parse::<usize>()
                    .map(CacheConfig::with_capacity)
                    .map_err(|e| MirrorError::Config {
                        key,
                        reason: format!("`{raw}` is not a capacity: {e}"),
                    }),
            }
        };

        Ok(Self {
            guilds: capacity("GUILD_CACHE_CAPACITY", defaults.guilds)?,
            channels: capacity("CHANNEL_CACHE_CAPACITY", defaults.channels)?,
            threads: capacity("THREAD_CACHE_CAPACITY", defaults.threads)?,
            roles: capacity("ROLE_CACHE_CAPACITY", defaults.roles)?,
            members: capacity("MEMBER_CACHE_CAPACITY", defaults.members)?,
            users: capacity("USER_CACHE_CAPACITY", defaults.users)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = MirrorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, MirrorConfig::default());
    }

    #[test]
    fn test_zero_means_unbounded() {
        let config = MirrorConfig::from_lookup(lookup(&[
            ("USER_CACHE_CAPACITY", "0"),
            ("CHANNEL_CACHE_CAPACITY", " 250 "),
        ]))
        .unwrap();

        assert_eq!(config.users.limit(), None);
        assert_eq!(config.channels.limit(), Some(250));
        assert_eq!(config.guilds, MirrorConfig::default().guilds);
    }

    #[test]
    fn test_rejects_garbage() {
        let err = MirrorConfig::from_lookup(lookup(&[("MEMBER_CACHE_CAPACITY", "-3")])).unwrap_err();
        assert!(matches!(
            err,
            MirrorError::Config {
                key: "MEMBER_CACHE_CAPACITY",
                ..
            }
        ));
    }
}
