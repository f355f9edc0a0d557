//! Channel permission overwrites.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{PermissionMask, Permissions};
use crate::snowflake::Snowflake;

/// Who an overwrite applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawKind", into = "u8")]
pub enum OverwriteKind {
    Role,
    Member,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawKind {
    Code(u8),
    Name(String),
}

impl TryFrom<RawKind> for OverwriteKind {
    type Error = String;

    fn try_from(raw: RawKind) -> Result<Self, Self::Error> {
        match raw {
            RawKind::Code(0) => Ok(Self::Role),
            RawKind::Code(1) => Ok(Self::Member),
            RawKind::Name(name) => match name.to_lowercase().as_str() {
                "role" => Ok(Self::Role),
                "member" => Ok(Self::Member),
                _ => Err(format!("unknown overwrite type `{name}`")),
            },
            RawKind::Code(code) => Err(format!("unknown overwrite type {code}")),
        }
    }
}

impl From<OverwriteKind> for u8 {
    fn from(kind: OverwriteKind) -> Self {
        match kind {
            OverwriteKind::Role => 0,
            OverwriteKind::Member => 1,
        }
    }
}

/// A permission exception for one role or one member in one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overwrite {
    /// The role or member this overwrite targets.
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: OverwriteKind,
    #[serde(flatten)]
    pub mask: PermissionMask,
}

impl Overwrite {
    pub fn role(id: Snowflake, allow: Permissions, deny: Permissions) -> Self {
        Self {
            id,
            kind: OverwriteKind::Role,
            mask: PermissionMask::new(allow, deny),
        }
    }

    pub fn member(id: Snowflake, allow: Permissions, deny: Permissions) -> Self {
        Self {
            id,
            kind: OverwriteKind::Member,
            mask: PermissionMask::new(allow, deny),
        }
    }

    pub fn allow(&self) -> Permissions {
        self.mask.allow
    }

    pub fn deny(&self) -> Permissions {
        self.mask.deny
    }

    /// Whether this overwrite explicitly grants every flag in `flags`.
    pub fn has(&self, flags: Permissions) -> bool {
        self.mask.has(flags)
    }
}

/// A channel's overwrites, at most one per subject id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overwrites {
    by_subject: HashMap<Snowflake, Overwrite>,
}

impl Overwrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, subject: Snowflake) -> Option<&Overwrite> {
        self.by_subject.get(&subject)
    }

    /// The overwrite for `subject` if it targets that kind of subject.
    pub fn get_kind(&self, subject: Snowflake, kind: OverwriteKind) -> Option<&Overwrite> {
        self.get(subject).filter(|ow| ow.kind == kind)
    }

    /// Insert or replace the overwrite for its subject.
    pub fn insert(&mut self, overwrite: Overwrite) -> Option<Overwrite> {
        self.by_subject.insert(overwrite.id, overwrite)
    }

    pub fn remove(&mut self, subject: Snowflake) -> Option<Overwrite> {
        self.by_subject.remove(&subject)
    }

    pub fn len(&self) -> usize {
        self.by_subject.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_subject.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Overwrite> {
        self.by_subject.values()
    }
}

impl FromIterator<Overwrite> for Overwrites {
    /// Later records for the same subject replace earlier ones.
    fn from_iter<I: IntoIterator<Item = Overwrite>>(iter: I) -> Self {
        let mut set = Self::new();
        for overwrite in iter {
            set.insert(overwrite);
        }
        set
    }
}
