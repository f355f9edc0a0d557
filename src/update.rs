//! Update records handed over by the transport.
//!
//! Each record is either an upsert carrying an already-parsed field map, or a
//! deletion carrying only ids. Field maps are decoded into the entity's patch
//! type when applied.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::entity::{Channel, Guild, Member, Role, User, parse_patch};
use crate::error::Result;
use crate::mirror::Mirror;
use crate::snowflake::Snowflake;

pub type Fields = Map<String, Value>;

/// One incremental change to the mirrored state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Update {
    GuildUpsert {
        id: Snowflake,
        #[serde(default)]
        fields: Fields,
    },
    GuildRemove {
        id: Snowflake,
    },
    ChannelUpsert {
        id: Snowflake,
        #[serde(default)]
        fields: Fields,
    },
    ChannelRemove {
        id: Snowflake,
    },
    ThreadUpsert {
        id: Snowflake,
        #[serde(default)]
        fields: Fields,
    },
    ThreadRemove {
        id: Snowflake,
    },
    RoleUpsert {
        guild_id: Snowflake,
        id: Snowflake,
        #[serde(default)]
        fields: Fields,
    },
    RoleRemove {
        guild_id: Snowflake,
        id: Snowflake,
    },
    MemberUpsert {
        guild_id: Snowflake,
        id: Snowflake,
        #[serde(default)]
        fields: Fields,
    },
    MemberRemove {
        guild_id: Snowflake,
        id: Snowflake,
    },
    UserUpsert {
        id: Snowflake,
        #[serde(default)]
        fields: Fields,
    },
    UserRemove {
        id: Snowflake,
    },
}

/// What applying an update did to the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Upserted,
    Removed,
    /// A deletion for an id that was not cached.
    Absent,
}

impl Applied {
    fn removed<T>(removed: Option<T>) -> Self {
        if removed.is_some() { Self::Removed } else { Self::Absent }
    }
}

impl Update {
    pub fn op(&self) -> &'static str {
        match self {
            Self::GuildUpsert { .. } => "guild_upsert",
            Self::GuildRemove { .. } => "guild_remove",
            Self::ChannelUpsert { .. } => "channel_upsert",
            Self::ChannelRemove { .. } => "channel_remove",
            Self::ThreadUpsert { .. } => "thread_upsert",
            Self::ThreadRemove { .. } => "thread_remove",
            Self::RoleUpsert { .. } => "role_upsert",
            Self::RoleRemove { .. } => "role_remove",
            Self::MemberUpsert { .. } => "member_upsert",
            Self::MemberRemove { .. } => "member_remove",
            Self::UserUpsert { .. } => "user_upsert",
            Self::UserRemove { .. } => "user_remove",
        }
    }
}

impl Mirror {
    /// Apply one update record.
    ///
    /// # Errors
    /// `MalformedPatch` if the field map does not decode or lacks fields needed
    /// to create a new entity; `NotCached` if a role or member update names a
    /// guild that is not cached. The mirror is unchanged on error.
    pub fn apply(&self, update: &Update) -> Result<Applied> {
        debug!("Applying {}", update.op());

        let applied = match update {
            Update::GuildUpsert { id, fields } => {
                self.upsert_guild(*id, &parse_patch::<Guild>(*id, fields)?)?;
                Applied::Upserted
            }
            Update::GuildRemove { id } => Applied::removed(self.remove_guild(*id)),
            Update::ChannelUpsert { id, fields } => {
                self.upsert_channel(*id, &parse_patch::<Channel>(*id, fields)?)?;
                Applied::Upserted
            }
            Update::ChannelRemove { id } => Applied::removed(self.remove_channel(*id)),
            Update::ThreadUpsert { id, fields } => {
                self.upsert_thread(*id, &parse_patch::<Channel>(*id, fields)?)?;
                Applied::Upserted
            }
            Update::ThreadRemove { id } => Applied::removed(self.remove_thread(*id)),
            Update::RoleUpsert { guild_id, id, fields } => {
                self.upsert_role(*guild_id, *id, &parse_patch::<Role>(*id, fields)?)?;
                Applied::Upserted
            }
            Update::RoleRemove { guild_id, id } => Applied::removed(self.remove_role(*guild_id, *id)?),
            Update::MemberUpsert { guild_id, id, fields } => {
                self.upsert_member(*guild_id, *id, &parse_patch::<Member>(*id, fields)?)?;
                Applied::Upserted
            }
            Update::MemberRemove { guild_id, id } => {
                Applied::removed(self.remove_member(*guild_id, *id)?)
            }
            Update::UserUpsert { id, fields } => {
                self.upsert_user(*id, &parse_patch::<User>(*id, fields)?)?;
                Applied::Upserted
            }
            Update::UserRemove { id } => Applied::removed(self.remove_user(*id)),
        };

        Ok(applied)
    }

    /// Apply a batch in order, stopping at the first failure.
    pub fn apply_all<'a, I>(&self, updates: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a Update>,
    {
        let mut count = 0;
        for update in updates {
            self.apply(update)?;
            count += 1;
        }
        Ok(count)
    }
}
