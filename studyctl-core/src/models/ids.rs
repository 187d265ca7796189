//! Typed identifiers
//!
//! All ids are UUIDs on the wire and in the database; the newtypes keep a
//! workbook id from being passed where a problem id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

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
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| ValidationError::InvalidFormat {
                        field: $field,
                        reason: "invalid UUID format",
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

define_id!(
    /// Organization (tenant) id
    OrganizationId,
    "organization_id"
);
define_id!(
    /// Application user id
    AppUserId,
    "app_user_id"
);
define_id!(WorkbookId, "workbook_id");
define_id!(ProblemId, "problem_id");
define_id!(AudioId, "audio_id");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_uuid() {
        let raw = "1b4e28ba-2fa1-11d2-883f-0016d3cca427";
        let id: WorkbookId = raw.parse().unwrap();
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn rejects_garbage() {
        let err = "not-a-uuid".parse::<ProblemId>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidFormat {
                field: "problem_id",
                reason: "invalid UUID format"
            }
        );
    }

    #[test]
    fn serializes_as_bare_string() {
        let id = AudioId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}
