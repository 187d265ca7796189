//! Study progress records

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AppUserId, Problem, ProblemId, ValidationError, WorkbookId};

/// Highest memorization level a record can reach
pub const MAX_LEVEL: i32 = 10;

/// Way a workbook is studied; progress is tracked separately for each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyType {
    Memorization,
    Dictation,
}

impl StudyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memorization => "memorization",
            Self::Dictation => "dictation",
        }
    }
}

impl FromStr for StudyType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memorization" => Ok(Self::Memorization),
            "dictation" => Ok(Self::Dictation),
            other => Err(ValidationError::InvalidVariant {
                field: "study_type",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for StudyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's progress on one problem for one study type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyRecord {
    pub app_user_id: AppUserId,
    pub workbook_id: WorkbookId,
    pub problem_id: ProblemId,
    pub study_type: StudyType,
    pub result_prev1: bool,
    pub memorized: bool,
    pub level: i32,
    pub answered_count: i32,
    pub correct_count: i32,
    pub last_answered_at: DateTime<Utc>,
}

impl StudyRecord {
    /// First answer for a problem.
    pub fn first(
        app_user_id: AppUserId,
        workbook_id: WorkbookId,
        problem_id: ProblemId,
        study_type: StudyType,
        answer: StudyAnswer,
        at: DateTime<Utc>,
    ) -> Self {
        let blank = Self {
            app_user_id,
            workbook_id,
            problem_id,
            study_type,
            result_prev1: false,
            memorized: false,
            level: 0,
            answered_count: 0,
            correct_count: 0,
            last_answered_at: at,
        };
        blank.answered(answer, at)
    }

    /// Apply an answer: a correct answer raises the level by one (capped at
    /// [`MAX_LEVEL`]), a wrong answer resets it to zero.
    pub fn answered(mut self, answer: StudyAnswer, at: DateTime<Utc>) -> Self {
        self.level = if answer.result {
            (self.level + 1).min(MAX_LEVEL)
        } else {
            0
        };
        self.result_prev1 = answer.result;
        self.memorized = answer.memorized;
        self.answered_count += 1;
        if answer.result {
            self.correct_count += 1;
        }
        self.last_answered_at = at;
        self
    }
}

/// Result submitted after answering a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StudyAnswer {
    pub result: bool,
    #[serde(default)]
    pub memorized: bool,
}

/// A problem paired with the caller's record for it, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordbookEntry {
    pub problem: Problem,
    pub record: Option<StudyRecord>,
}

/// All problems of a workbook with the caller's records for one study type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recordbook {
    pub workbook_id: WorkbookId,
    pub study_type: StudyType,
    pub entries: Vec<RecordbookEntry>,
}

/// Share of a workbook's problems the caller has memorized
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompletionRate {
    pub total: i64,
    pub memorized: i64,
    pub rate: f64,
}

impl CompletionRate {
    pub fn new(total: i64, memorized: i64) -> Self {
        let rate = if total == 0 {
            0.0
        } else {
            memorized as f64 / total as f64
        };
        Self {
            total,
            memorized,
            rate,
        }
    }
}
