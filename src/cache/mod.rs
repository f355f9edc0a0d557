//! Cache module - Bounded entity caches.
//!
//! Every mirrored collection (guilds, channels, threads, roles, members,
//! users) is an [`EntityCache`]. Entries are shared out as [`Cached`]
//! handles which outlive eviction.
//!
//! ## Usage
//!
//! ```rust
//! use guildmirror::cache::{CacheConfig, EntityCache};
//! use guildmirror::entity::{User, UserPatch};
//! use guildmirror::Snowflake;
//!
//! let users: EntityCache<User> = EntityCache::new(CacheConfig::with_capacity(100));
//!
//! let patch = UserPatch {
//!     username: Some("nelly".into()),
//!     ..Default::default()
//! };
//! let user = users.upsert(Snowflake(80351110224678912), &patch).unwrap();
//! assert_eq!(user.read().username, "nelly");
//! ```

mod config;
mod entity_cache;

pub use config::CacheConfig;
pub use entity_cache::{Cached, EntityCache};
