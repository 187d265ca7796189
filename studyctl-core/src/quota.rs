//! Per-user quota counters
//!
//! Every problem type has two named quotas:
//! - `<type>Size`: how many problems of the type a user may own (persistent)
//! - `<type>Update`: how many adds/updates of the type a user may make per UTC day
//!
//! Usage lives in a stored counter; this module holds the names, limits and
//! the arithmetic, the store holds the numbers.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::models::ProblemType;

/// Which of the two quotas of a problem type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaKind {
    Size,
    Update,
}

impl QuotaKind {
    pub fn unit(&self) -> QuotaUnit {
        match self {
            Self::Size => QuotaUnit::Persistent,
            Self::Update => QuotaUnit::Day,
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            Self::Size => "Size",
            Self::Update => "Update",
        }
    }
}

/// Period over which a counter accumulates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaUnit {
    Persistent,
    Day,
}

impl QuotaUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Persistent => "persistent",
            Self::Day => "day",
        }
    }
}

/// Counter bucket: persistent counters have a single bucket, daily counters
/// one per UTC date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QuotaPeriod {
    Persistent,
    Day(NaiveDate),
}

impl QuotaPeriod {
    pub fn for_kind(kind: QuotaKind, today: NaiveDate) -> Self {
        match kind.unit() {
            QuotaUnit::Persistent => Self::Persistent,
            QuotaUnit::Day => Self::Day(today),
        }
    }

    pub fn unit(&self) -> QuotaUnit {
        match self {
            Self::Persistent => QuotaUnit::Persistent,
            Self::Day(_) => QuotaUnit::Day,
        }
    }
}

/// Quota name such as `english_wordSize`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuotaName {
    pub problem_type: ProblemType,
    pub kind: QuotaKind,
}

impl QuotaName {
    pub fn new(problem_type: ProblemType, kind: QuotaKind) -> Self {
        Self { problem_type, kind }
    }

    pub fn size(problem_type: ProblemType) -> Self {
        Self::new(problem_type, QuotaKind::Size)
    }

    pub fn update(problem_type: ProblemType) -> Self {
        Self::new(problem_type, QuotaKind::Update)
    }
}

impl fmt::Display for QuotaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.problem_type.as_str(), self.kind.suffix())
    }
}

/// Limits for one problem type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLimit {
    pub size: i64,
    pub update: i64,
}

impl QuotaLimit {
    pub fn get(&self, kind: QuotaKind) -> i64 {
        match kind {
            QuotaKind::Size => self.size,
            QuotaKind::Update => self.update,
        }
    }
}

/// Limits for every problem type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaLimits(BTreeMap<ProblemType, QuotaLimit>);

impl QuotaLimits {
    /// Override the defaults for some problem types.
    pub fn with_overrides(overrides: impl IntoIterator<Item = (ProblemType, QuotaLimit)>) -> Self {
        let mut limits = Self::default();
        limits.0.extend(overrides);
        limits
    }

    pub fn limit(&self, name: QuotaName) -> i64 {
        self.0
            .get(&name.problem_type)
            .map(|l| l.get(name.kind))
            .unwrap_or(0)
    }
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self(BTreeMap::from([
            (
                ProblemType::EnglishWord,
                QuotaLimit {
                    size: 5000,
                    update: 1000,
                },
            ),
            (
                ProblemType::EnglishPhrase,
                QuotaLimit {
                    size: 3000,
                    update: 1000,
                },
            ),
            (
                ProblemType::EnglishSentence,
                QuotaLimit {
                    size: 3000,
                    update: 1000,
                },
            ),
        ]))
    }
}

/// Fail with `QuotaExceeded` if consuming `amount` more would pass `limit`.
pub fn check(name: QuotaName, used: i64, limit: i64, amount: i64) -> DomainResult<()> {
    if used.saturating_add(amount) > limit {
        return Err(DomainError::QuotaExceeded {
            name: name.to_string(),
            limit,
        });
    }
    Ok(())
}

/// New counter value after applying `delta`; counters never go below zero.
pub fn apply_delta(used: i64, delta: i64) -> i64 {
    used.saturating_add(delta).max(0)
}

/// Current usage of one quota, as reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaUsage {
    pub name: String,
    pub problem_type: ProblemType,
    pub kind: QuotaKind,
    pub unit: QuotaUnit,
    pub used: i64,
    pub limit: i64,
}

impl QuotaUsage {
    pub fn new(name: QuotaName, used: i64, limit: i64) -> Self {
        Self {
            name: name.to_string(),
            problem_type: name.problem_type,
            kind: name.kind,
            unit: name.kind.unit(),
            used,
            limit,
        }
    }

    pub fn remaining(&self) -> i64 {
        (self.limit - self.used).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_type_and_kind() {
        assert_eq!(QuotaName::size(ProblemType::EnglishWord).to_string(), "english_wordSize");
        assert_eq!(
            QuotaName::update(ProblemType::EnglishSentence).to_string(),
            "english_sentenceUpdate"
        );
    }

    #[test]
    fn check_allows_up_to_limit() {
        let name = QuotaName::size(ProblemType::EnglishWord);
        assert!(check(name, 4, 5, 1).is_ok());
        let err = check(name, 5, 5, 1).unwrap_err();
        assert!(matches!(err, DomainError::QuotaExceeded { limit: 5, .. }));
    }

    #[test]
    fn delta_never_goes_negative() {
        assert_eq!(apply_delta(3, 1), 4);
        assert_eq!(apply_delta(0, -1), 0);
        assert_eq!(apply_delta(2, -5), 0);
    }

    #[test]
    fn periods_follow_units() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(QuotaPeriod::for_kind(QuotaKind::Size, today), QuotaPeriod::Persistent);
        assert_eq!(QuotaPeriod::for_kind(QuotaKind::Update, today), QuotaPeriod::Day(today));
    }

    #[test]
    fn overrides_replace_defaults() {
        let limits = QuotaLimits::with_overrides([(
            ProblemType::EnglishPhrase,
            QuotaLimit { size: 10, update: 2 },
        )]);
        assert_eq!(limits.limit(QuotaName::size(ProblemType::EnglishPhrase)), 10);
        assert_eq!(limits.limit(QuotaName::update(ProblemType::EnglishWord)), 1000);
    }

    #[test]
    fn usage_remaining() {
        let usage = QuotaUsage::new(QuotaName::size(ProblemType::EnglishWord), 7, 5);
        assert_eq!(usage.remaining(), 0);
        assert_eq!(usage.unit, QuotaUnit::Persistent);
    }
}
