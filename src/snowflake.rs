//! Snowflake identifiers.
//!
//! Layout (most significant bit first):
//! - 42 bits timestamp (ms since [`DISCORD_EPOCH`])
//! - 5 bits worker id
//! - 5 bits process id
//! - 12 bits increment
//!
//! Only the timestamp is meaningful to the mirror; the low 22 bits are
//! carried through untouched.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Platform epoch, 2015-01-01T00:00:00.000Z, in unix milliseconds.
pub const DISCORD_EPOCH: u64 = 1_420_070_400_000;

/// Number of low bits below the timestamp field.
pub const TIMESTAMP_SHIFT: u32 = 22;

/// Decode the creation time of `id` as unix milliseconds.
pub const fn decode(id: u64) -> u64 {
    (id >> TIMESTAMP_SHIFT) + DISCORD_EPOCH
}

/// A 64-bit platform identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Snowflake(pub u64);

impl Snowflake {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Creation time in unix milliseconds.
    pub const fn timestamp_ms(self) -> u64 {
        decode(self.0)
    }

    /// Creation time as a UTC datetime.
    pub fn created_at(self) -> DateTime<Utc> {
        // The decoded value is at most 2^42 + epoch, well inside chrono's range.
        Utc.timestamp_millis_opt(self.timestamp_ms() as i64)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Smallest snowflake that could have been minted at `unix_ms`.
    ///
    /// Useful for range queries over ids by time.
    pub const fn from_timestamp_ms(unix_ms: u64) -> Self {
        Self(unix_ms.saturating_sub(DISCORD_EPOCH) << TIMESTAMP_SHIFT)
    }
}

impl From<u64> for Snowflake {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<Snowflake> for u64 {
    fn from(id: Snowflake) -> Self {
        id.0
    }
}

impl FromStr for Snowflake {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snowflake({})", self.0)
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

struct SnowflakeVisitor;

impl Visitor<'_> for SnowflakeVisitor {
    type Value = Snowflake;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a snowflake as an integer or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Snowflake(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .map(Snowflake)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SnowflakeVisitor)
    }
}
