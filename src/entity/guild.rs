//! Guild record.

use std::cmp::Ordering;

use serde::Deserialize;
use tracing::debug;

use super::{Entity, Member, Role, User, required};
use crate::cache::{CacheConfig, Cached, EntityCache};
use crate::error::{EntityKind, Result};
use crate::permissions::{MemberGrants, PermissionMask, resolve_base};
use crate::snowflake::Snowflake;
use crate::utils::{merge, nullable};

/// A guild together with its role and member caches.
///
/// Cloning a guild clones handles to the same caches.
#[derive(Debug, Clone)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    pub owner_id: Snowflake,
    pub icon: Option<String>,
    pub roles: EntityCache<Role>,
    pub members: EntityCache<Member>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GuildPatch {
    pub name: Option<String>,
    pub owner_id: Option<Snowflake>,
    #[serde(deserialize_with = "nullable")]
    pub icon: Option<Option<String>>,
}

impl Guild {
    /// Build a guild whose role and member caches use the given limits.
    pub fn with_caches(
        id: Snowflake,
        patch: &GuildPatch,
        roles: CacheConfig,
        members: CacheConfig,
    ) -> Result<Self> {
        let mut guild = Self {
            id,
            name: required(&patch.name, Self::KIND, id, "name")?,
            owner_id: required(&patch.owner_id, Self::KIND, id, "owner_id")?,
            icon: None,
            roles: EntityCache::new(roles),
            members: EntityCache::new(members),
        };
        guild.apply_patch(patch);
        Ok(guild)
    }

    /// The implicit role every member holds shares the guild's id.
    pub fn base_role_id(&self) -> Snowflake {
        self.id
    }

    pub fn base_role(&self) -> Result<Cached<Role>> {
        self.roles.require(self.base_role_id())
    }

    pub fn role(&self, id: Snowflake) -> Result<Cached<Role>> {
        self.roles.require(id)
    }

    pub fn member(&self, id: Snowflake) -> Result<Cached<Member>> {
        self.members.require(id)
    }

    pub fn is_owner(&self, user_id: Snowflake) -> bool {
        self.owner_id == user_id
    }

    pub fn owner(&self, users: &EntityCache<User>) -> Result<Cached<User>> {
        users.require(self.owner_id)
    }

    /// Gather a member's grants for resolution.
    ///
    /// Fails with `NotCached` if the member, the base role, or any role the
    /// member holds is missing.
    pub fn grants_for(&self, member_id: Snowflake) -> Result<MemberGrants> {
        let role_ids = self.member(member_id)?.read().roles.clone();
        let base_role_allow = self.base_role()?.read().permissions;

        let mut roles = Vec::with_capacity(role_ids.len());
        for role_id in role_ids {
            if role_id == self.base_role_id() {
                continue;
            }
            let allow = self.role(role_id)?.read().permissions;
            roles.push((role_id, allow));
        }

        debug!(
            "Gathered {} roles for member {} in guild {}",
            roles.len(),
            member_id,
            self.id
        );

        Ok(MemberGrants {
            member_id,
            base_role_id: self.base_role_id(),
            base_role_allow,
            roles,
            is_owner: self.is_owner(member_id),
        })
    }

    /// Guild-wide permissions of a member, without any channel.
    pub fn member_permissions(&self, member_id: Snowflake) -> Result<PermissionMask> {
        Ok(resolve_base(&self.grants_for(member_id)?))
    }

    /// The member's top role by hierarchy, `None` if they hold only the base role.
    pub fn highest_role(&self, member: &Member) -> Result<Option<Cached<Role>>> {
        let mut best: Option<(Cached<Role>, Role)> = None;
        for role_id in &member.roles {
            if *role_id == self.base_role_id() {
                continue;
            }
            let handle = self.role(*role_id)?;
            let role = handle.snapshot();
            let better = best
                .as_ref()
                .is_none_or(|(_, current)| role.compare_position(current) == Ordering::Greater);
            if better {
                best = Some((handle, role));
            }
        }
        Ok(best.map(|(handle, _)| handle))
    }

    /// Compare two roles of this guild by hierarchy.
    pub fn compare_roles(&self, a: Snowflake, b: Snowflake) -> Result<Ordering> {
        let a = self.role(a)?.snapshot();
        let b = self.role(b)?.snapshot();
        Ok(a.compare_position(&b))
    }
}

impl Entity for Guild {
    const KIND: EntityKind = EntityKind::Guild;
    type Patch = GuildPatch;

    fn id(&self) -> Snowflake {
        self.id
    }

    fn apply_patch(&mut self, patch: &GuildPatch) {
        merge(&mut self.name, &patch.name);
        merge(&mut self.owner_id, &patch.owner_id);
        merge(&mut self.icon, &patch.icon);
    }

    fn from_patch(id: Snowflake, patch: &GuildPatch) -> Result<Self> {
        Self::with_caches(
            id,
            patch,
            CacheConfig::small_collection(),
            CacheConfig::large_collection(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{MemberPatch, RolePatch};
    use crate::error::MirrorError;
    use crate::permissions::Permissions;

    const GUILD: Snowflake = Snowflake(100);
    const OWNER: Snowflake = Snowflake(1);
    const MEMBER: Snowflake = Snowflake(2);

    fn guild() -> Guild {
        let guild = Guild::from_patch(
            GUILD,
            &GuildPatch {
                name: Some("hall".into()),
                owner_id: Some(OWNER),
                icon: None,
            },
        )
        .unwrap();

        add_role(&guild, GUILD, 0, Permissions::VIEW_CHANNEL);
        guild
    }

    fn add_role(guild: &Guild, id: Snowflake, position: i64, permissions: Permissions) {
        let patch = RolePatch {
            name: Some(format!("role-{id}")),
            permissions: Some(permissions),
            position: Some(position),
            ..Default::default()
        };
        guild
            .roles
            .update_or_insert(id, &patch, |id, p| Role::new_in(GUILD, id, p))
            .unwrap();
    }

    fn add_member(guild: &Guild, id: Snowflake, roles: &[Snowflake]) {
        let patch = MemberPatch {
            roles: Some(roles.to_vec()),
            ..Default::default()
        };
        guild
            .members
            .update_or_insert(id, &patch, |id, p| Member::new_in(GUILD, id, p))
            .unwrap();
    }

    #[test]
    fn test_requires_name_and_owner() {
        let err = Guild::from_patch(GUILD, &GuildPatch::default()).unwrap_err();
        assert!(matches!(err, MirrorError::MalformedPatch { .. }));
    }

    #[test]
    fn test_member_permissions() {
        let guild = guild();
        add_role(&guild, Snowflake(10), 1, Permissions::KICK_MEMBERS);
        add_member(&guild, MEMBER, &[Snowflake(10)]);

        let perms = guild.member_permissions(MEMBER).unwrap();
        assert!(perms.has(Permissions::VIEW_CHANNEL | Permissions::KICK_MEMBERS));
        assert!(!perms.has(Permissions::BAN_MEMBERS));
    }

    #[test]
    fn test_owner_has_everything() {
        let guild = guild();
        add_member(&guild, OWNER, &[]);
        assert_eq!(guild.member_permissions(OWNER).unwrap(), PermissionMask::all_allowed());
    }

    #[test]
    fn test_missing_role_is_not_cached() {
        let guild = guild();
        add_member(&guild, MEMBER, &[Snowflake(77)]);

        match guild.grants_for(MEMBER).unwrap_err() {
            MirrorError::NotCached { kind, id } => {
                assert_eq!(kind, EntityKind::Role);
                assert_eq!(id, Snowflake(77));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_base_role_is_not_cached() {
        let guild = guild();
        add_member(&guild, MEMBER, &[]);
        guild.roles.remove(GUILD);
        assert!(guild.grants_for(MEMBER).unwrap_err().is_not_cached());
    }

    #[test]
    fn test_highest_role() {
        let guild = guild();
        add_role(&guild, Snowflake(10), 1, Permissions::empty());
        add_role(&guild, Snowflake(11), 3, Permissions::empty());
        add_role(&guild, Snowflake(12), 3, Permissions::empty());
        add_member(&guild, MEMBER, &[Snowflake(10), Snowflake(12), Snowflake(11)]);

        let member = guild.member(MEMBER).unwrap();
        let top = guild.highest_role(&member.read()).unwrap().unwrap();
        // 11 and 12 tie on position; the older id wins.
        assert_eq!(top.id(), Snowflake(11));

        assert_eq!(guild.compare_roles(Snowflake(10), Snowflake(11)).unwrap(), Ordering::Less);

        add_member(&guild, OWNER, &[]);
        let owner = guild.member(OWNER).unwrap();
        assert!(guild.highest_role(&owner.read()).unwrap().is_none());
    }
}
