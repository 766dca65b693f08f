use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
  Text(String),
  Signed(i64),
  Unsigned(u64),
}

impl From<RawId> for String {
  fn from(raw: RawId) -> Self {
    match raw {
      RawId::Text(s) => s,
      RawId::Signed(n) => n.to_string(),
      RawId::Unsigned(n) => n.to_string(),
    }
  }
}

macro_rules! string_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
    #[serde(transparent)]
    pub struct $name(String);

    impl $name {
      pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
      }

      pub fn as_str(&self) -> &str {
        &self.0
      }
    }

    impl<'de> Deserialize<'de> for $name {
      fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
      }
    }

    impl From<&str> for $name {
      fn from(s: &str) -> Self {
        Self(s.to_string())
      }
    }

    impl From<String> for $name {
      fn from(s: String) -> Self {
        Self(s)
      }
    }

    impl From<i32> for $name {
      fn from(n: i32) -> Self {
        Self(n.to_string())
      }
    }

    impl From<i64> for $name {
      fn from(n: i64) -> Self {
        Self(n.to_string())
      }
    }

    impl From<u64> for $name {
      fn from(n: u64) -> Self {
        Self(n.to_string())
      }
    }
  };
}

string_id!(
  /// Identifier of a single node execution record.
  ///
  /// The push channel sends these as strings or integers; both forms compare
  /// equal when their decimal text matches.
  ExecId
);

string_id!(
  /// Identifier of a workflow run (`app_run_id`).
  RunId
);

/// Deserialize an optional id where `null` and `""` both mean absent.
pub(crate) fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<ExecId>, D::Error>
where
  D: Deserializer<'de>,
{
  let id = Option::<ExecId>::deserialize(deserializer)?;
  Ok(id.filter(|id| !id.as_str().is_empty()))
}
