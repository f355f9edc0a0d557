//! Utility functions.
//!
//! Helpers shared by the patch records.

use serde::{Deserialize, Deserializer};

/// Deserialize a nullable patch field.
///
/// Absent stays `None` (via `#[serde(default)]`), `null` becomes
/// `Some(None)` and a value becomes `Some(Some(v))`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Copy `value` into `slot` when present.
#[inline]
pub fn merge<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *slot = v.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct Probe {
        #[serde(deserialize_with = "nullable")]
        nick: Option<Option<String>>,
    }

    #[test]
    fn test_nullable_distinguishes_absent_and_null() {
        let absent: Probe = serde_json::from_str("{}").unwrap();
        let null: Probe = serde_json::from_str(r#"{"nick": null}"#).unwrap();
        let set: Probe = serde_json::from_str(r#"{"nick": "kit"}"#).unwrap();

        assert_eq!(absent.nick, None);
        assert_eq!(null.nick, Some(None));
        assert_eq!(set.nick, Some(Some("kit".to_string())));
    }

    #[test]
    fn test_merge() {
        let mut name = "old".to_string();
        merge(&mut name, &None);
        assert_eq!(name, "old");
        merge(&mut name, &Some("new".to_string()));
        assert_eq!(name, "new");
    }
}
