//! Error types for the mirror.

use std::fmt;

use thiserror::Error;

use crate::snowflake::Snowflake;

/// The kind of entity a cache holds, used to qualify failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Guild,
    Channel,
    Thread,
    Role,
    Member,
    User,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guild => "guild",
            Self::Channel => "channel",
            Self::Thread => "thread",
            Self::Role => "role",
            Self::Member => "member",
            Self::User => "user",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by cache and permission operations.
///
/// None of these are fatal: a missing entry or one bad record only affects
/// the call that hit it.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// A related entity is absent from its cache at lookup time.
    #[error("{kind} {id} is not cached")]
    NotCached { kind: EntityKind, id: Snowflake },

    /// A record is missing a field required to construct a new entity.
    #[error("malformed {kind} patch for {id}: {reason}")]
    MalformedPatch {
        kind: EntityKind,
        id: Snowflake,
        reason: String,
    },

    /// Permissions were requested for a channel that belongs to no guild.
    #[error("channel {channel} does not belong to a guild")]
    NotGuildChannel { channel: Snowflake },

    /// An environment value could not be parsed.
    #[error("invalid configuration for {key}: {reason}")]
    Config { key: &'static str, reason: String },
}

impl MirrorError {
    pub fn not_cached(kind: EntityKind, id: Snowflake) -> Self {
        Self::NotCached { kind, id }
    }

    pub fn missing_field(kind: EntityKind, id: Snowflake, field: &str) -> Self {
        Self::MalformedPatch {
            kind,
            id,
            reason: format!("missing required field `{field}`"),
        }
    }

    /// Whether the caller can recover by fetching the entity and retrying.
    pub fn is_not_cached(&self) -> bool {
        matches!(self, Self::NotCached { .. })
    }
}

pub type Result<T, E = MirrorError> = std::result::Result<T, E>;
