//! Authenticated callers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{AppUserId, OrganizationId, ValidationError};

/// Role of a user within their organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Organization owner; may read every workbook in the organization
    Owner,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::User => "user",
        }
    }
}

impl FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "user" => Ok(Self::User),
            other => Err(ValidationError::InvalidVariant {
                field: "role",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user a request acts for, resolved from its access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppUser {
    pub id: AppUserId,
    pub organization_id: OrganizationId,
    pub login_id: String,
    pub role: UserRole,
}

impl AppUser {
    pub fn is_owner(&self) -> bool {
        self.role == UserRole::Owner
    }
}

/// Validate a login id: 1..=64 chars, no whitespace.
pub fn validate_login_id(s: &str) -> Result<String, ValidationError> {
    if s.is_empty() {
        return Err(ValidationError::Empty { field: "login_id" });
    }
    if s.chars().count() > 64 {
        return Err(ValidationError::TooLong {
            field: "login_id",
            max: 64,
        });
    }
    if s.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "login_id",
            reason: "must not contain whitespace",
        });
    }
    Ok(s.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip() {
        assert_eq!("owner".parse::<UserRole>().unwrap(), UserRole::Owner);
        assert!("admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn login_id_rules() {
        assert!(validate_login_id("alice@example.com").is_ok());
        assert!(validate_login_id("").is_err());
        assert!(validate_login_id("has space").is_err());
    }
}
