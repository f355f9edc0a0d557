//! guildmirror - Bounded local mirror of chat guild state.
//!
//! Keeps guilds, channels, threads, roles, members and users in memory,
//! merges partial updates into long-lived entries, and resolves a member's
//! effective permissions in a channel.
//!
//! ## Architecture
//!
//! - `snowflake` - Identifier decoding
//! - `cache` - Capacity-bounded entity caches with insertion-order eviction
//! - `entity` - Entity records, patch merging, and lazy relations
//! - `permissions` - Flags, allow/deny masks, overwrites, and the resolver
//! - `mirror` - The aggregate of all caches and permission queries
//! - `update` - Ingestion of parsed update records
//! - `config` - Environment configuration
//!
//! ## Usage
//!
//! ```rust
//! use guildmirror::{Mirror, MirrorConfig, Snowflake, Update};
//! use guildmirror::permissions::Permissions;
//!
//! let mirror = Mirror::new(MirrorConfig::default());
//! let records: Vec<Update> = serde_json::from_str(r#"[
//!     {"op": "guild_upsert", "id": "10", "fields": {"name": "hall", "owner_id": "1"}},
//!     {"op": "role_upsert", "guild_id": "10", "id": "10",
//!      "fields": {"name": "@everyone", "permissions": "1024"}},
//!     {"op": "member_upsert", "guild_id": "10", "id": "2", "fields": {"roles": []}},
//!     {"op": "channel_upsert", "id": "20", "fields": {"type": 0, "guild_id": "10"}}
//! ]"#).unwrap();
//! mirror.apply_all(&records).unwrap();
//!
//! let perms = mirror.permissions_of(Snowflake(2), Snowflake(20)).unwrap();
//! assert!(perms.has(Permissions::VIEW_CHANNEL));
//! ```

pub mod cache;
pub mod config;
pub mod entity;
pub mod error;
pub mod mirror;
pub mod permissions;
pub mod snowflake;
pub mod update;
mod utils;

pub use config::MirrorConfig;
pub use error::{EntityKind, MirrorError, Result};
pub use mirror::Mirror;
pub use snowflake::Snowflake;
pub use update::{Applied, Update};
