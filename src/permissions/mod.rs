//! Permission system for resolving member access in channels.
//!
//! This module provides the flag space, allow/deny masks, channel
//! overwrites, and the resolver that folds them into an effective set.
//!
//! ## Usage
//!
//! ```rust
//! use guildmirror::permissions::{PermissionMask, Permissions};
//!
//! let everyone = PermissionMask::allowing(Permissions::VIEW_CHANNEL);
//! let writer = PermissionMask::allowing(Permissions::SEND_MESSAGES);
//!
//! let combined = everyone.union(writer);
//! assert!(combined.has(Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES));
//! ```

mod flags;
mod mask;
mod overwrite;
pub mod resolver;

pub use flags::Permissions;
pub use mask::{FlagState, PermissionMask};
pub use overwrite::{Overwrite, OverwriteKind, Overwrites};
pub use resolver::{MemberGrants, resolve_base, resolve_in_channel, resolve_role_in_channel};
