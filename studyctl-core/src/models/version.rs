//! Optimistic-locking version numbers

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Row version; starts at 1 and increases by one on every update
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Version(i32);

impl Version {
    pub const INITIAL: Version = Version(1);

    pub fn new(v: i32) -> Result<Self, ValidationError> {
        if v < 1 {
            return Err(ValidationError::InvalidFormat {
                field: "version",
                reason: "must be a positive integer",
            });
        }
        Ok(Self(v))
    }

    pub fn get(&self) -> i32 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl TryFrom<i32> for Version {
    type Error = ValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Version> for i32 {
    fn from(value: Version) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one() {
        assert_eq!(Version::INITIAL.get(), 1);
        assert_eq!(Version::INITIAL.next().get(), 2);
    }

    #[test]
    fn rejects_zero() {
        assert!(Version::new(0).is_err());
        assert!(serde_json::from_str::<Version>("-3").is_err());
    }
}
