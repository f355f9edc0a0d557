//! User record.

use serde::{Deserialize, Serialize};

use super::{Entity, required};
use crate::error::{EntityKind, Result};
use crate::snowflake::Snowflake;
use crate::utils::{merge, nullable};

/// A platform account, independent of any guild.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    /// Display name, if the account set one.
    pub global_name: Option<String>,
    pub avatar: Option<String>,
    pub bot: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserPatch {
    pub username: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub global_name: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub avatar: Option<Option<String>>,
    pub bot: Option<bool>,
}

impl User {
    /// Name to show: global name when set, username otherwise.
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;
    type Patch = UserPatch;

    fn id(&self) -> Snowflake {
        self.id
    }

    fn apply_patch(&mut self, patch: &UserPatch) {
        merge(&mut self.username, &patch.username);
        merge(&mut self.global_name, &patch.global_name);
        merge(&mut self.avatar, &patch.avatar);
        merge(&mut self.bot, &patch.bot);
    }

    fn from_patch(id: Snowflake, patch: &UserPatch) -> Result<Self> {
        let mut user = Self {
            id,
            username: required(&patch.username, Self::KIND, id, "username")?,
            global_name: None,
            avatar: None,
            bot: false,
        };
        user.apply_patch(patch);
        Ok(user)
    }
}
