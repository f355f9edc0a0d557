//! The mirror: every top-level cache plus permission queries over them.

use tracing::{debug, info};

use crate::cache::{Cached, EntityCache};
use crate::config::MirrorConfig;
use crate::entity::{
    Channel, ChannelPatch, Guild, GuildPatch, Member, MemberPatch, Role, RolePatch, User, UserPatch,
};
use crate::error::{EntityKind, MirrorError, Result};
use crate::permissions::{PermissionMask, Permissions, resolve_in_channel, resolve_role_in_channel};
use crate::snowflake::Snowflake;

/// Local mirror of remote guild state.
///
/// Roles and members live in per-guild caches on [`Guild`]; everything else
/// is held here. Cloning is cheap and shares the same caches.
#[derive(Debug, Clone)]
pub struct Mirror {
    pub guilds: EntityCache<Guild>,
    pub channels: EntityCache<Channel>,
    pub threads: EntityCache<Channel>,
    pub users: EntityCache<User>,
    config: MirrorConfig,
}

impl Mirror {
    pub fn new(config: MirrorConfig) -> Self {
        info!(
            "Mirror initialized (guilds={:?}, channels={:?}, threads={:?}, users={:?})",
            config.guilds.limit(),
            config.channels.limit(),
            config.threads.limit(),
            config.users.limit()
        );

        Self {
            guilds: EntityCache::new(config.guilds),
            channels: EntityCache::new(config.channels),
            threads: EntityCache::with_kind(EntityKind::Thread, config.threads),
            users: EntityCache::new(config.users),
            config,
        }
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Patch or create a guild.
    pub fn upsert_guild(&self, id: Snowflake, patch: &GuildPatch) -> Result<Cached<Guild>> {
        let (roles, members) = (self.config.roles, self.config.members);
        self.guilds
            .update_or_insert(id, patch, |id, p| Guild::with_caches(id, p, roles, members))
    }

    /// Remove a guild along with the channels and threads that belong to it.
    pub fn remove_guild(&self, id: Snowflake) -> Option<Cached<Guild>> {
        let removed = self.guilds.remove(id)?;

        for cache in [&self.channels, &self.threads] {
            let owned: Vec<Snowflake> = cache
                .filter(|c| c.guild_id == Some(id))
                .map(|c| c.id())
                .collect();
            for channel_id in owned {
                cache.remove(channel_id);
            }
        }

        debug!("Removed guild {} and its channels", id);
        Some(removed)
    }

    pub fn upsert_channel(&self, id: Snowflake, patch: &ChannelPatch) -> Result<Cached<Channel>> {
        self.channels.upsert(id, patch)
    }

    /// Remove a channel along with its threads.
    pub fn remove_channel(&self, id: Snowflake) -> Option<Cached<Channel>> {
        let removed = self.channels.remove(id)?;

        let threads: Vec<Snowflake> = self
            .threads
            .filter(|t| t.parent_id == Some(id))
            .map(|t| t.id())
            .collect();
        for thread_id in threads {
            self.threads.remove(thread_id);
        }

        Some(removed)
    }

    pub fn upsert_thread(&self, id: Snowflake, patch: &ChannelPatch) -> Result<Cached<Channel>> {
        self.threads.upsert(id, patch)
    }

    pub fn remove_thread(&self, id: Snowflake) -> Option<Cached<Channel>> {
        self.threads.remove(id)
    }

    /// Patch or create a role in a cached guild.
    pub fn upsert_role(&self, guild_id: Snowflake, id: Snowflake, patch: &RolePatch) -> Result<Cached<Role>> {
        let roles = self.guilds.require(guild_id)?.read().roles.clone();
        roles.update_or_insert(id, patch, |id, p| Role::new_in(guild_id, id, p))
    }

    /// Remove a role and drop it from every cached member's role list.
    pub fn remove_role(&self, guild_id: Snowflake, id: Snowflake) -> Result<Option<Cached<Role>>> {
        let guild = self.guilds.require(guild_id)?.snapshot();
        let Some(removed) = guild.roles.remove(id) else {
            return Ok(None);
        };

        let patch = |member: &Member| MemberPatch {
            roles: Some(member.roles.iter().copied().filter(|r| *r != id).collect()),
            ..Default::default()
        };
        // Members evicted or removed meanwhile are skipped, not recreated.
        for member in guild.members.filter(|m| m.roles.contains(&id)) {
            let member_id = member.id();
            let stripped = patch(&member.read());
            guild.members.patch(member_id, &stripped);
        }

        Ok(Some(removed))
    }

    /// Patch or create a member in a cached guild.
    pub fn upsert_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        patch: &MemberPatch,
    ) -> Result<Cached<Member>> {
        let members = self.guilds.require(guild_id)?.read().members.clone();
        members.update_or_insert(user_id, patch, |id, p| Member::new_in(guild_id, id, p))
    }

    pub fn remove_member(&self, guild_id: Snowflake, user_id: Snowflake) -> Result<Option<Cached<Member>>> {
        let members = self.guilds.require(guild_id)?.read().members.clone();
        Ok(members.remove(user_id))
    }

    pub fn upsert_user(&self, id: Snowflake, patch: &UserPatch) -> Result<Cached<User>> {
        self.users.upsert(id, patch)
    }

    pub fn remove_user(&self, id: Snowflake) -> Option<Cached<User>> {
        self.users.remove(id)
    }

    /// Look a channel up in the channel cache, then the thread cache.
    pub fn channel(&self, id: Snowflake) -> Result<Cached<Channel>> {
        self.channels
            .get(id)
            .or_else(|| self.threads.get(id))
            .ok_or_else(|| MirrorError::not_cached(EntityKind::Channel, id))
    }

    /// The channel whose overwrites govern `id`: threads defer to their parent.
    fn overwrite_source(&self, id: Snowflake) -> Result<Cached<Channel>> {
        let channel = self.channel(id)?;
        let parent_id = {
            let c = channel.read();
            if !c.is_thread() {
                None
            } else {
                c.parent_id
            }
        };

        match parent_id {
            Some(parent_id) => self.channels.require(parent_id),
            None => Ok(channel),
        }
    }

    /// Effective permissions of a member in a channel or thread.
    ///
    /// # Errors
    /// `NotCached` if the channel, its guild, the member, the base role, or
    /// any of the member's roles is missing; `NotGuildChannel` for private
    /// channels.
    pub fn permissions_of(&self, member_id: Snowflake, channel_id: Snowflake) -> Result<PermissionMask> {
        let source = self.overwrite_source(channel_id)?;
        let channel = source.read();
        let guild = channel.guild(&self.guilds)?;
        let grants = guild.read().grants_for(member_id)?;

        let resolved = resolve_in_channel(&grants, &channel.overwrites);
        debug!(
            "Resolved permissions for member {} in channel {}: {}",
            member_id, channel_id, resolved.allow
        );
        Ok(resolved)
    }

    /// Guild-wide permissions of a member.
    pub fn guild_permissions_of(&self, guild_id: Snowflake, member_id: Snowflake) -> Result<PermissionMask> {
        self.guilds.require(guild_id)?.read().member_permissions(member_id)
    }

    /// Permissions a role carries in a channel, by itself and the base role.
    pub fn role_permissions_in(&self, role_id: Snowflake, channel_id: Snowflake) -> Result<PermissionMask> {
        let source = self.overwrite_source(channel_id)?;
        let channel = source.read();
        let guild = channel.guild(&self.guilds)?.snapshot();

        let base_allow = guild.base_role()?.read().permissions;
        let role_allow = guild.role(role_id)?.read().permissions;

        Ok(resolve_role_in_channel(
            guild.base_role_id(),
            base_allow,
            role_id,
            role_allow,
            &channel.overwrites,
        ))
    }

    /// Whether a member holds every flag in `flags` in a channel.
    pub fn can(&self, member_id: Snowflake, channel_id: Snowflake, flags: Permissions) -> Result<bool> {
        Ok(self.permissions_of(member_id, channel_id)?.has(flags))
    }
}

impl Default for Mirror {
    fn default() -> Self {
        Self::new(MirrorConfig::default())
    }
}
