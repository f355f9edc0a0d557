//! Guild member record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, Guild, User, required};
use crate::cache::{Cached, EntityCache};
use crate::error::{EntityKind, Result};
use crate::snowflake::Snowflake;
use crate::utils::{merge, nullable};

/// A user's membership in one guild. Keyed by the user's id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    pub user_id: Snowflake,
    pub guild_id: Snowflake,
    pub nick: Option<String>,
    /// Explicitly held roles; the base role is implied.
    pub roles: Vec<Snowflake>,
    pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemberPatch {
    /// Only read on first observation.
    pub guild_id: Option<Snowflake>,
    #[serde(deserialize_with = "nullable")]
    pub nick: Option<Option<String>>,
    /// Replaces the whole role list.
    pub roles: Option<Vec<Snowflake>>,
    pub joined_at: Option<DateTime<Utc>>,
}

impl Member {
    /// Build a member for a known guild; the patch need not carry `guild_id`.
    pub fn new_in(guild_id: Snowflake, user_id: Snowflake, patch: &MemberPatch) -> Result<Self> {
        let mut member = Self {
            user_id,
            guild_id,
            nick: None,
            roles: Vec::new(),
            joined_at: None,
        };
        member.apply_patch(patch);
        Ok(member)
    }

    pub fn has_role(&self, role_id: Snowflake) -> bool {
        role_id == self.guild_id || self.roles.contains(&role_id)
    }

    /// Nickname when set, otherwise the user's display name.
    pub fn display_name(&self, users: &EntityCache<User>) -> Result<String> {
        if let Some(nick) = &self.nick {
            return Ok(nick.clone());
        }
        Ok(self.user(users)?.read().display_name().to_string())
    }

    pub fn user(&self, users: &EntityCache<User>) -> Result<Cached<User>> {
        users.require(self.user_id)
    }

    pub fn guild(&self, guilds: &EntityCache<Guild>) -> Result<Cached<Guild>> {
        guilds.require(self.guild_id)
    }
}

impl Entity for Member {
    const KIND: EntityKind = EntityKind::Member;
    type Patch = MemberPatch;

    fn id(&self) -> Snowflake {
        self.user_id
    }

    fn apply_patch(&mut self, patch: &MemberPatch) {
        merge(&mut self.nick, &patch.nick);
        merge(&mut self.roles, &patch.roles);
        if patch.joined_at.is_some() {
            self.joined_at = patch.joined_at;
        }
    }

    fn from_patch(id: Snowflake, patch: &MemberPatch) -> Result<Self> {
        let guild_id = required(&patch.guild_id, Self::KIND, id, "guild_id")?;
        Self::new_in(guild_id, id, patch)
    }
}
