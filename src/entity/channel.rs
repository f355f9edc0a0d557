//! Channel and thread record.

use serde::{Deserialize, Serialize};

use super::{Entity, Guild, required};
use crate::cache::{Cached, EntityCache};
use crate::error::{EntityKind, MirrorError, Result};
use crate::permissions::{Overwrite, Overwrites};
use crate::snowflake::Snowflake;
use crate::utils::{merge, nullable};

/// Channel type codes as sent by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelKind {
    Text,
    Dm,
    Voice,
    GroupDm,
    Category,
    Announcement,
    AnnouncementThread,
    PublicThread,
    PrivateThread,
    StageVoice,
    Directory,
    Forum,
    Media,
    Unknown(u8),
}

impl From<u8> for ChannelKind {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Text,
            1 => Self::Dm,
            2 => Self::Voice,
            3 => Self::GroupDm,
            4 => Self::Category,
            5 => Self::Announcement,
            10 => Self::AnnouncementThread,
            11 => Self::PublicThread,
            12 => Self::PrivateThread,
            13 => Self::StageVoice,
            14 => Self::Directory,
            15 => Self::Forum,
            16 => Self::Media,
            other => Self::Unknown(other),
        }
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Text => 0,
            ChannelKind::Dm => 1,
            ChannelKind::Voice => 2,
            ChannelKind::GroupDm => 3,
            ChannelKind::Category => 4,
            ChannelKind::Announcement => 5,
            ChannelKind::AnnouncementThread => 10,
            ChannelKind::PublicThread => 11,
            ChannelKind::PrivateThread => 12,
            ChannelKind::StageVoice => 13,
            ChannelKind::Directory => 14,
            ChannelKind::Forum => 15,
            ChannelKind::Media => 16,
            ChannelKind::Unknown(code) => code,
        }
    }
}

impl ChannelKind {
    pub fn is_thread(self) -> bool {
        matches!(
            self,
            Self::AnnouncementThread | Self::PublicThread | Self::PrivateThread
        )
    }

    pub fn is_private(self) -> bool {
        matches!(self, Self::Dm | Self::GroupDm)
    }
}

/// A guild channel, category, thread, or private channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: Snowflake,
    pub kind: ChannelKind,
    pub guild_id: Option<Snowflake>,
    /// Category for channels, parent channel for threads.
    pub parent_id: Option<Snowflake>,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub position: i64,
    pub overwrites: Overwrites,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelPatch {
    #[serde(rename = "type")]
    pub kind: Option<ChannelKind>,
    pub guild_id: Option<Snowflake>,
    #[serde(deserialize_with = "nullable")]
    pub parent_id: Option<Option<Snowflake>>,
    #[serde(deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub topic: Option<Option<String>>,
    pub position: Option<i64>,
    /// Replaces the whole overwrite set.
    pub permission_overwrites: Option<Vec<Overwrite>>,
}

impl Channel {
    pub fn is_thread(&self) -> bool {
        self.kind.is_thread()
    }

    /// The owning guild. Private channels have none.
    pub fn guild(&self, guilds: &EntityCache<Guild>) -> Result<Cached<Guild>> {
        let guild_id = self
            .guild_id
            .ok_or(MirrorError::NotGuildChannel { channel: self.id })?;
        guilds.require(guild_id)
    }

    /// The parent category or, for threads, the parent channel.
    ///
    /// `Ok(None)` when the channel has no parent.
    pub fn parent(&self, channels: &EntityCache<Channel>) -> Result<Option<Cached<Channel>>> {
        self.parent_id.map(|id| channels.require(id)).transpose()
    }
}

impl Entity for Channel {
    const KIND: EntityKind = EntityKind::Channel;
    type Patch = ChannelPatch;

    fn id(&self) -> Snowflake {
        self.id
    }

    fn apply_patch(&mut self, patch: &ChannelPatch) {
        merge(&mut self.kind, &patch.kind);
        if patch.guild_id.is_some() {
            self.guild_id = patch.guild_id;
        }
        merge(&mut self.parent_id, &patch.parent_id);
        merge(&mut self.name, &patch.name);
        merge(&mut self.topic, &patch.topic);
        merge(&mut self.position, &patch.position);
        if let Some(overwrites) = &patch.permission_overwrites {
            self.overwrites = overwrites.iter().copied().collect();
        }
    }

    fn from_patch(id: Snowflake, patch: &ChannelPatch) -> Result<Self> {
        let mut channel = Self {
            id,
            kind: required(&patch.kind, Self::KIND, id, "type")?,
            guild_id: None,
            parent_id: None,
            name: None,
            topic: None,
            position: 0,
            overwrites: Overwrites::new(),
        };
        channel.apply_patch(patch);
        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::permissions::Permissions;
    use serde_json::json;

    fn patch(value: serde_json::Value) -> ChannelPatch {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_kind_codes() {
        assert_eq!(ChannelKind::from(11), ChannelKind::PublicThread);
        assert!(ChannelKind::from(12).is_thread());
        assert_eq!(u8::from(ChannelKind::from(42)), 42);
        assert!(ChannelKind::Dm.is_private());
    }

    #[test]
    fn test_requires_type() {
        let err = Channel::from_patch(Snowflake(1), &patch(json!({ "name": "general" }))).unwrap_err();
        assert!(matches!(err, MirrorError::MalformedPatch { .. }));
    }

    #[test]
    fn test_overwrites_replaced_wholesale() {
        let mut channel = Channel::from_patch(
            Snowflake(1),
            &patch(json!({
                "type": 0,
                "guild_id": "9",
                "permission_overwrites": [
                    { "id": "9", "type": 0, "allow": "0", "deny": "1024" },
                    { "id": "7", "type": 1, "allow": "2048", "deny": "0" }
                ]
            })),
        )
        .unwrap();
        assert_eq!(channel.overwrites.len(), 2);

        // Patch without overwrites keeps them.
        channel.apply_patch(&patch(json!({ "name": "general" })));
        assert_eq!(channel.overwrites.len(), 2);

        channel.apply_patch(&patch(json!({
            "permission_overwrites": [{ "id": "7", "type": 1, "allow": "0", "deny": "2048" }]
        })));
        assert_eq!(channel.overwrites.len(), 1);
        assert!(channel.overwrites.get(Snowflake(9)).is_none());
        assert_eq!(
            channel.overwrites.get(Snowflake(7)).unwrap().deny(),
            Permissions::SEND_MESSAGES
        );
    }

    #[test]
    fn test_parent_cleared_by_null() {
        let mut channel = Channel::from_patch(Snowflake(1), &patch(json!({ "type": 0, "parent_id": "5" }))).unwrap();
        assert_eq!(channel.parent_id, Some(Snowflake(5)));

        channel.apply_patch(&patch(json!({ "parent_id": null })));
        assert_eq!(channel.parent_id, None);
    }

    #[test]
    fn test_relations() {
        let guilds: EntityCache<Guild> = EntityCache::new(CacheConfig::default());
        let channels: EntityCache<Channel> = EntityCache::new(CacheConfig::default());

        let dm = Channel::from_patch(Snowflake(1), &patch(json!({ "type": 1 }))).unwrap();
        assert!(matches!(
            dm.guild(&guilds).unwrap_err(),
            MirrorError::NotGuildChannel { .. }
        ));
        assert!(dm.parent(&channels).unwrap().is_none());

        let orphan =
            Channel::from_patch(Snowflake(2), &patch(json!({ "type": 0, "guild_id": 3, "parent_id": 4 }))).unwrap();
        assert!(orphan.guild(&guilds).unwrap_err().is_not_cached());
        assert!(orphan.parent(&channels).unwrap_err().is_not_cached());
    }
}
