//! Allow/deny permission masks.

use std::collections::BTreeMap;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use super::Permissions;

/// Inspection state of a single flag within a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagState {
    Allowed,
    Denied,
    Unset,
}

/// A pair of allow and deny flag sets.
///
/// A flag may sit in both sets; which one wins is decided during
/// resolution, never inside a single mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PermissionMask {
    #[serde(default)]
    pub allow: Permissions,
    #[serde(default)]
    pub deny: Permissions,
}

impl PermissionMask {
    pub const EMPTY: Self = Self {
        allow: Permissions::empty(),
        deny: Permissions::empty(),
    };

    pub const fn new(allow: Permissions, deny: Permissions) -> Self {
        Self { allow, deny }
    }

    /// A mask that only grants.
    pub const fn allowing(allow: Permissions) -> Self {
        Self {
            allow,
            deny: Permissions::empty(),
        }
    }

    /// A fully resolved mask with every bit allowed, including bits the
    /// flag table does not name.
    pub const fn all_allowed() -> Self {
        Self::allowing(Permissions::EVERY_BIT)
    }

    /// Combine two masks, allow with allow and deny with deny.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            allow: self.allow | other.allow,
            deny: self.deny | other.deny,
        }
    }

    /// Whether every flag in `flags` is allowed.
    ///
    /// `deny` is not consulted; call this on resolved masks.
    pub fn has(&self, flags: Permissions) -> bool {
        self.allow.contains(flags)
    }

    /// Whether any of `flags` is allowed.
    pub fn has_any(&self, flags: Permissions) -> bool {
        self.allow.intersects(flags)
    }

    /// Clear `deny` from `acc`, then add `allow`.
    pub(crate) fn apply_to(&self, acc: Permissions) -> Permissions {
        (acc - self.deny) | self.allow
    }

    /// Per-flag view for inspection and serialization.
    pub fn to_named_map(&self) -> BTreeMap<&'static str, FlagState> {
        Permissions::ALL
            .iter_names()
            .map(|(name, flag)| {
                let state = if self.allow.contains(flag) {
                    FlagState::Allowed
                } else if self.deny.contains(flag) {
                    FlagState::Denied
                } else {
                    FlagState::Unset
                };
                (name, state)
            })
            .collect()
    }

    /// Drop every grant if `VIEW_CHANNEL` is missing.
    ///
    /// A member who cannot see a channel can do nothing in it. Not part of
    /// channel resolution itself; callers opt in.
    #[must_use]
    pub fn with_implicit_view_rule(self) -> Self {
        if self.has(Permissions::VIEW_CHANNEL) {
            self
        } else {
            Self::EMPTY
        }
    }
}

impl BitOr for PermissionMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl From<Permissions> for PermissionMask {
    fn from(allow: Permissions) -> Self {
        Self::allowing(allow)
    }
}
