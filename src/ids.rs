//! Typed record identifiers
//!
//! Every record in the backing store is keyed by a UUID. Wrapping them in
//! distinct types keeps a challenge id from ever being compared against a
//! user id, which matters most when resolving the winner of a challenge.

use std::{fmt::Display, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Copy,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            DeserializeFromStr,
            SerializeDisplay,
        )]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            /// Parses an identifier from a UUID string
            ///
            /// # Errors
            ///
            /// Returns a `uuid::Error` if the string is not a valid UUID.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::from_str(s)?))
            }
        }

        impl From<$name> for serde_json::Value {
            fn from(value: $name) -> Self {
                serde_json::Value::String(value.to_string())
            }
        }
    };
}

uuid_id!(
    /// Identifies a user profile
    UserId
);

uuid_id!(
    /// Identifies a head-to-head challenge
    ChallengeId
);

uuid_id!(
    /// Identifies a quiz question
    QuestionId
);
