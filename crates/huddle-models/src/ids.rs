//! Type-safe ID wrappers for Huddle.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Macro to generate ID newtypes with common functionality.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an ID from an existing string.
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Returns the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
    ($name:ident, $prefix:literal) => {
        define_id!($name);

        impl $name {
            /// Creates a new random ID.
            pub fn new() -> Self {
                Self(format!("{}-{}", $prefix, Uuid::new_v4()))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

define_id!(AgentId);
define_id!(MeetingId);
define_id!(RunId, "run");
define_id!(MessageId, "msg");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_prefix() {
        let id = RunId::new();
        assert!(id.as_str().starts_with("run-"));
    }

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn test_agent_id_from_string() {
        let id = AgentId::from_string("travel_agent_1");
        assert_eq!(id.as_str(), "travel_agent_1");
        assert_eq!(id, AgentId::from("travel_agent_1"));
    }

    #[test]
    fn test_id_serialization() {
        let id = MeetingId::from_string("abcd-efgh-ijkl");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abcd-efgh-ijkl\"");

        let parsed: MeetingId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_display() {
        let id = MessageId::from_string("msg-123");
        assert_eq!(format!("{}", id), "msg-123");
    }
}
