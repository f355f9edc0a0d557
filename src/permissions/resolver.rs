//! Effective permission resolution.
//!
//! Precedence, least to most specific:
//! 1. the base role's grants
//! 2. the member's roles' grants
//! 3. administrator or guild owner: everything, overwrites ignored
//! 4. the channel's base-role overwrite
//! 5. the channel's overwrites for the member's roles, all denies then all allows
//! 6. the channel's overwrite for the member

use tracing::debug;

use super::{OverwriteKind, Overwrites, PermissionMask, Permissions};
use crate::snowflake::Snowflake;

/// A member's guild-level standing, gathered from the caches.
#[derive(Debug, Clone)]
pub struct MemberGrants {
    pub member_id: Snowflake,
    /// Id of the base role every member holds (the guild id).
    pub base_role_id: Snowflake,
    pub base_role_allow: Permissions,
    /// Explicitly held roles and their grants.
    pub roles: Vec<(Snowflake, Permissions)>,
    pub is_owner: bool,
}

impl MemberGrants {
    /// Steps 1 and 2: base grant plus every held role's grant.
    pub fn accumulated(&self) -> Permissions {
        self.roles
            .iter()
            .fold(self.base_role_allow, |acc, (_, allow)| acc | *allow)
    }

    /// Step 3.
    pub fn bypasses_overwrites(&self) -> bool {
        self.is_owner || self.accumulated().contains(Permissions::ADMINISTRATOR)
    }

    fn holds(&self, role_id: Snowflake) -> bool {
        role_id != self.base_role_id && self.roles.iter().any(|(id, _)| *id == role_id)
    }
}

/// Guild-wide permissions, ignoring any channel.
pub fn resolve_base(grants: &MemberGrants) -> PermissionMask {
    if grants.bypasses_overwrites() {
        return PermissionMask::all_allowed();
    }
    PermissionMask::allowing(grants.accumulated())
}

/// Permissions of a member in a channel with the given overwrites.
///
/// The resulting mask has an empty `deny` set.
pub fn resolve_in_channel(grants: &MemberGrants, overwrites: &Overwrites) -> PermissionMask {
    if grants.bypasses_overwrites() {
        debug!(
            "Member {} bypasses channel overwrites (owner={})",
            grants.member_id, grants.is_owner
        );
        return PermissionMask::all_allowed();
    }

    let mut acc = grants.accumulated();

    if let Some(base) = overwrites.get_kind(grants.base_role_id, OverwriteKind::Role) {
        acc = base.mask.apply_to(acc);
    }

    let roles = overwrites
        .iter()
        .filter(|ow| ow.kind == OverwriteKind::Role && grants.holds(ow.id))
        .fold(PermissionMask::EMPTY, |merged, ow| merged.union(ow.mask));
    acc = roles.apply_to(acc);

    if let Some(member) = overwrites.get_kind(grants.member_id, OverwriteKind::Member) {
        acc = member.mask.apply_to(acc);
    }

    PermissionMask::allowing(acc)
}

/// Permissions a single role carries in a channel.
///
/// Only the base-role overwrite and the role's own overwrite apply.
pub fn resolve_role_in_channel(
    base_role_id: Snowflake,
    base_role_allow: Permissions,
    role_id: Snowflake,
    role_allow: Permissions,
    overwrites: &Overwrites,
) -> PermissionMask {
    let mut acc = base_role_allow | role_allow;
    if acc.contains(Permissions::ADMINISTRATOR) {
        return PermissionMask::all_allowed();
    }

    if let Some(base) = overwrites.get_kind(base_role_id, OverwriteKind::Role) {
        acc = base.mask.apply_to(acc);
    }
    if role_id != base_role_id
        && let Some(own) = overwrites.get_kind(role_id, OverwriteKind::Role)
    {
        acc = own.mask.apply_to(acc);
    }

    PermissionMask::allowing(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::Overwrite;

    const GUILD: Snowflake = Snowflake(100);
    const MEMBER: Snowflake = Snowflake(200);
    const R1: Snowflake = Snowflake(301);
    const R2: Snowflake = Snowflake(302);

    fn grants(base: Permissions, roles: &[(Snowflake, Permissions)]) -> MemberGrants {
        MemberGrants {
            member_id: MEMBER,
            base_role_id: GUILD,
            base_role_allow: base,
            roles: roles.to_vec(),
            is_owner: false,
        }
    }

    fn none() -> Permissions {
        Permissions::empty()
    }

    #[test]
    fn test_no_overwrites_is_role_union() {
        let g = grants(
            Permissions::VIEW_CHANNEL,
            &[(R1, Permissions::SEND_MESSAGES), (R2, Permissions::ATTACH_FILES)],
        );
        let resolved = resolve_in_channel(&g, &Overwrites::new());

        assert_eq!(
            resolved.allow,
            Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::ATTACH_FILES
        );
        assert!(resolved.deny.is_empty());
    }

    #[test]
    fn test_role_allow_beats_other_role_deny() {
        let g = grants(Permissions::VIEW_CHANNEL, &[(R1, none()), (R2, none())]);
        let overwrites: Overwrites = [
            Overwrite::role(R1, none(), Permissions::SEND_MESSAGES),
            Overwrite::role(R2, Permissions::SEND_MESSAGES, none()),
        ]
        .into_iter()
        .collect();

        let resolved = resolve_in_channel(&g, &overwrites);
        assert_eq!(resolved.allow, Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES);
        assert_eq!(resolved.deny, none());
    }

    #[test]
    fn test_member_overwrite_is_final() {
        let g = grants(Permissions::VIEW_CHANNEL, &[(R1, none())]);
        let overwrites: Overwrites = [
            Overwrite::role(R1, Permissions::VIEW_CHANNEL, none()),
            Overwrite::member(MEMBER, none(), Permissions::VIEW_CHANNEL),
        ]
        .into_iter()
        .collect();

        let resolved = resolve_in_channel(&g, &overwrites);
        assert_eq!(resolved.allow, none());
    }

    #[test]
    fn test_administrator_bypasses_overwrites() {
        let g = grants(Permissions::VIEW_CHANNEL, &[(R1, Permissions::ADMINISTRATOR)]);
        let overwrites: Overwrites = [
            Overwrite::role(GUILD, none(), Permissions::ALL),
            Overwrite::role(R1, none(), Permissions::ALL),
            Overwrite::member(MEMBER, none(), Permissions::ALL),
        ]
        .into_iter()
        .collect();

        let resolved = resolve_in_channel(&g, &overwrites);
        assert_eq!(resolved, PermissionMask::all_allowed());
    }

    #[test]
    fn test_owner_bypasses_overwrites() {
        let mut g = grants(none(), &[]);
        g.is_owner = true;
        let overwrites: Overwrites = [Overwrite::role(GUILD, none(), Permissions::ALL)]
            .into_iter()
            .collect();

        assert_eq!(resolve_in_channel(&g, &overwrites), PermissionMask::all_allowed());
        assert_eq!(resolve_base(&g), PermissionMask::all_allowed());
    }

    #[test]
    fn test_base_overwrite_applies_before_role_overwrites() {
        let g = grants(Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES, &[(R1, none())]);
        let overwrites: Overwrites = [
            Overwrite::role(GUILD, none(), Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES),
            Overwrite::role(R1, Permissions::VIEW_CHANNEL, none()),
        ]
        .into_iter()
        .collect();

        let resolved = resolve_in_channel(&g, &overwrites);
        assert_eq!(resolved.allow, Permissions::VIEW_CHANNEL);
    }

    #[test]
    fn test_overwrites_for_unheld_roles_are_ignored() {
        let g = grants(Permissions::VIEW_CHANNEL, &[(R1, none())]);
        let overwrites: Overwrites = [Overwrite::role(R2, none(), Permissions::VIEW_CHANNEL)]
            .into_iter()
            .collect();

        assert_eq!(resolve_in_channel(&g, &overwrites).allow, Permissions::VIEW_CHANNEL);
    }

    #[test]
    fn test_member_overwrite_ignored_when_kind_is_role() {
        let g = grants(Permissions::VIEW_CHANNEL, &[]);
        // An overwrite keyed by the member's id but scoped to a role does not apply.
        let overwrites: Overwrites = [Overwrite::role(MEMBER, none(), Permissions::VIEW_CHANNEL)]
            .into_iter()
            .collect();

        assert_eq!(resolve_in_channel(&g, &overwrites).allow, Permissions::VIEW_CHANNEL);
    }

    #[test]
    fn test_resolve_base_ignores_channels() {
        let g = grants(Permissions::VIEW_CHANNEL, &[(R1, Permissions::KICK_MEMBERS)]);
        assert_eq!(
            resolve_base(&g).allow,
            Permissions::VIEW_CHANNEL | Permissions::KICK_MEMBERS
        );
    }

    #[test]
    fn test_role_in_channel() {
        let overwrites: Overwrites = [
            Overwrite::role(GUILD, none(), Permissions::SEND_MESSAGES),
            Overwrite::role(R1, Permissions::ATTACH_FILES, none()),
            Overwrite::role(R2, Permissions::MANAGE_MESSAGES, none()),
        ]
        .into_iter()
        .collect();

        let resolved = resolve_role_in_channel(
            GUILD,
            Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES,
            R1,
            none(),
            &overwrites,
        );
        assert_eq!(resolved.allow, Permissions::VIEW_CHANNEL | Permissions::ATTACH_FILES);
    }
}
