//! Workbook records and their validated fields

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{optional_text, required_text};
use super::{AppUserId, Lang2, OrganizationId, ProblemType, ValidationError, Version, WorkbookId};

const MAX_WORKBOOK_NAME_LEN: usize = 40;
const MAX_QUESTION_TEXT_LEN: usize = 100;

/// Validated workbook name (trimmed, 1..=40 chars)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WorkbookName(String);

impl WorkbookName {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        required_text("workbook name", s, MAX_WORKBOOK_NAME_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Question-text template shown above every problem of a workbook
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct QuestionText(String);

impl QuestionText {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        optional_text("question text", s, MAX_QUESTION_TEXT_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Workbook row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workbook {
    pub id: WorkbookId,
    pub version: Version,
    pub organization_id: OrganizationId,
    pub owner_id: AppUserId,
    pub name: String,
    pub problem_type: ProblemType,
    pub question_text: String,
    pub lang2: Lang2,
    pub audio_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for a new private workbook
#[derive(Debug, Clone)]
pub struct NewWorkbook {
    pub name: WorkbookName,
    pub problem_type: ProblemType,
    pub question_text: QuestionText,
    pub lang2: Lang2,
    pub audio_enabled: bool,
}

/// Mutable fields of a workbook. Problem type and language are fixed at
/// creation because existing problems were validated against them.
#[derive(Debug, Clone)]
pub struct WorkbookUpdate {
    pub name: WorkbookName,
    pub question_text: QuestionText,
    pub audio_enabled: bool,
}

/// Raw workbook fields as sent by clients, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct WorkbookFields {
    pub name: String,
    pub problem_type: String,
    #[serde(default)]
    pub question_text: String,
    #[serde(default = "default_lang2")]
    pub lang2: String,
    #[serde(default)]
    pub audio_enabled: bool,
}

fn default_lang2() -> String {
    "en".to_owned()
}

impl TryFrom<WorkbookFields> for NewWorkbook {
    type Error = ValidationError;

    fn try_from(fields: WorkbookFields) -> Result<Self, Self::Error> {
        Ok(Self {
            name: WorkbookName::new(&fields.name)?,
            problem_type: fields.problem_type.parse()?,
            question_text: QuestionText::new(&fields.question_text)?,
            lang2: Lang2::new(&fields.lang2)?,
            audio_enabled: fields.audio_enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rules() {
        assert_eq!(WorkbookName::new("  Basic verbs ").unwrap().as_str(), "Basic verbs");
        assert!(matches!(
            WorkbookName::new(""),
            Err(ValidationError::Empty { .. })
        ));
        assert!(matches!(
            WorkbookName::new(&"a".repeat(41)),
            Err(ValidationError::TooLong { max: 40, .. })
        ));
    }

    #[test]
    fn question_text_may_be_empty() {
        assert_eq!(QuestionText::new("").unwrap().as_str(), "");
        assert!(QuestionText::new(&"q".repeat(101)).is_err());
    }

    #[test]
    fn fields_convert_with_defaults() {
        let fields: WorkbookFields =
            serde_json::from_str(r#"{"name":"Animals","problem_type":"english_word"}"#).unwrap();
        let new = NewWorkbook::try_from(fields).unwrap();
        assert_eq!(new.problem_type, ProblemType::EnglishWord);
        assert_eq!(new.lang2.as_str(), "en");
        assert!(!new.audio_enabled);
    }

    #[test]
    fn fields_reject_unknown_problem_type() {
        let fields: WorkbookFields =
            serde_json::from_str(r#"{"name":"Animals","problem_type":"kanji"}"#).unwrap();
        assert!(matches!(
            NewWorkbook::try_from(fields),
            Err(ValidationError::InvalidVariant { field: "problem_type", .. })
        ));
    }
}
