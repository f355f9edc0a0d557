//! Entity records mirrored from the platform.
//!
//! Every record has an immutable [`Snowflake`] and a set of mutable fields
//! that are merged from partial patches. Relations to other records are
//! stored as ids and resolved against a cache on access.

mod channel;
mod guild;
mod member;
mod role;
mod user;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{EntityKind, MirrorError, Result};
use crate::snowflake::Snowflake;

pub use channel::{Channel, ChannelKind, ChannelPatch};
pub use guild::{Guild, GuildPatch};
pub use member::{Member, MemberPatch};
pub use role::{Role, RolePatch};
pub use user::{User, UserPatch};

/// A record that can live in an [`EntityCache`](crate::cache::EntityCache).
pub trait Entity: Sized {
    const KIND: EntityKind;

    /// Partial update record; every field is optional.
    type Patch;

    fn id(&self) -> Snowflake;

    fn created_at(&self) -> DateTime<Utc> {
        self.id().created_at()
    }

    /// Copy the fields present in `patch`, leave the rest untouched.
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Build a new record on first observation.
    ///
    /// Fails with [`MirrorError::MalformedPatch`] when a required field is
    /// absent.
    fn from_patch(id: Snowflake, patch: &Self::Patch) -> Result<Self>;
}

/// Decode an already-parsed field map into `T`'s patch record.
pub fn parse_patch<T>(id: Snowflake, fields: &Map<String, Value>) -> Result<T::Patch>
where
    T: Entity,
    T::Patch: DeserializeOwned,
{
    serde_json::from_value(Value::Object(fields.clone())).map_err(|e| MirrorError::MalformedPatch {
        kind: T::KIND,
        id,
        reason: e.to_string(),
    })
}

pub(crate) fn required<T: Clone>(
    value: &Option<T>,
    kind: EntityKind,
    id: Snowflake,
    field: &str,
) -> Result<T> {
    value
        .clone()
        .ok_or_else(|| MirrorError::missing_field(kind, id, field))
}
