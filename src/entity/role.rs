//! Role record.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{Entity, Guild, required};
use crate::cache::{Cached, EntityCache};
use crate::error::{EntityKind, Result};
use crate::permissions::{PermissionMask, Permissions};
use crate::snowflake::Snowflake;
use crate::utils::merge;

/// A guild role. Roles only grant; denials come from channel overwrites.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Role {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub name: String,
    pub permissions: Permissions,
    /// Display order, higher ranks first.
    pub position: i64,
    pub color: u32,
    pub hoist: bool,
    pub mentionable: bool,
    /// Whether an integration owns this role.
    pub managed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RolePatch {
    /// Only read on first observation; a role never changes guild.
    pub guild_id: Option<Snowflake>,
    pub name: Option<String>,
    pub permissions: Option<Permissions>,
    pub position: Option<i64>,
    pub color: Option<u32>,
    pub hoist: Option<bool>,
    pub mentionable: Option<bool>,
    pub managed: Option<bool>,
}

impl Role {
    /// Build a role for a known guild; the patch need not carry `guild_id`.
    pub fn new_in(guild_id: Snowflake, id: Snowflake, patch: &RolePatch) -> Result<Self> {
        let mut role = Self {
            id,
            guild_id,
            name: required(&patch.name, Self::KIND, id, "name")?,
            permissions: Permissions::empty(),
            position: 0,
            color: 0,
            hoist: false,
            mentionable: false,
            managed: false,
        };
        role.apply_patch(patch);
        Ok(role)
    }

    /// Whether this is the guild's implicit base role.
    pub fn is_base(&self) -> bool {
        self.id == self.guild_id
    }

    /// The role's grants as a mask with no denials.
    pub fn mask(&self) -> PermissionMask {
        PermissionMask::allowing(self.permissions)
    }

    /// Hierarchy order: higher position ranks higher, and on a tie the older
    /// role (lower id) ranks higher.
    pub fn compare_position(&self, other: &Role) -> Ordering {
        self.position
            .cmp(&other.position)
            .then_with(|| other.id.cmp(&self.id))
    }

    pub fn guild(&self, guilds: &EntityCache<Guild>) -> Result<Cached<Guild>> {
        guilds.require(self.guild_id)
    }
}

impl Entity for Role {
    const KIND: EntityKind = EntityKind::Role;
    type Patch = RolePatch;

    fn id(&self) -> Snowflake {
        self.id
    }

    fn apply_patch(&mut self, patch: &RolePatch) {
        merge(&mut self.name, &patch.name);
        merge(&mut self.permissions, &patch.permissions);
        merge(&mut self.position, &patch.position);
        merge(&mut self.color, &patch.color);
        merge(&mut self.hoist, &patch.hoist);
        merge(&mut self.mentionable, &patch.mentionable);
        merge(&mut self.managed, &patch.managed);
    }

    fn from_patch(id: Snowflake, patch: &RolePatch) -> Result<Self> {
        let guild_id = required(&patch.guild_id, Self::KIND, id, "guild_id")?;
        Self::new_in(guild_id, id, patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: u64, position: i64) -> Role {
        Role::new_in(
            Snowflake(1),
            Snowflake(id),
            &RolePatch {
                name: Some(format!("r{id}")),
                position: Some(position),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_compare_position() {
        assert_eq!(role(10, 2).compare_position(&role(11, 1)), Ordering::Greater);
        // Same position: older id ranks higher.
        assert_eq!(role(10, 1).compare_position(&role(11, 1)), Ordering::Greater);
        assert_eq!(role(10, 1).compare_position(&role(10, 1)), Ordering::Equal);
    }

    #[test]
    fn test_from_patch_requires_guild() {
        let patch = RolePatch {
            name: Some("mods".into()),
            ..Default::default()
        };
        assert!(Role::from_patch(Snowflake(5), &patch).is_err());

        let patch = RolePatch {
            guild_id: Some(Snowflake(5)),
            ..patch
        };
        assert!(Role::from_patch(Snowflake(5), &patch).unwrap().is_base());
    }

    #[test]
    fn test_new_in_keeps_guild() {
        let patch = RolePatch {
            guild_id: Some(Snowflake(99)),
            name: Some("x".into()),
            ..Default::default()
        };
        assert_eq!(Role::new_in(Snowflake(1), Snowflake(2), &patch).unwrap().guild_id, Snowflake(1));
    }
}
