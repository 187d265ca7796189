//! Problems and their type-specific properties
//!
//! Properties travel as JSON. They are parsed against the problem type of the
//! owning workbook, so an `english_word` workbook only ever stores word
//! properties.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::validation::{optional_text, required_text};
use super::{AudioId, ProblemId, ValidationError, Version, WorkbookId};

/// Kind of problem a workbook holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    EnglishWord,
    EnglishPhrase,
    EnglishSentence,
}

impl ProblemType {
    pub const ALL: [ProblemType; 3] = [
        ProblemType::EnglishWord,
        ProblemType::EnglishPhrase,
        ProblemType::EnglishSentence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnglishWord => "english_word",
            Self::EnglishPhrase => "english_phrase",
            Self::EnglishSentence => "english_sentence",
        }
    }
}

impl FromStr for ProblemType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidVariant {
                field: "problem_type",
                value: s.to_owned(),
            })
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Part of speech of an English word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Preposition,
    Pronoun,
    Conjunction,
    Interjection,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnglishWordProperties {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<PartOfSpeech>,
    #[serde(default)]
    pub translated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_id: Option<AudioId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnglishPhraseProperties {
    pub text: String,
    pub translated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_id: Option<AudioId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnglishSentenceProperties {
    pub text: String,
    #[serde(default)]
    pub translated: String,
    #[serde(default)]
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_id: Option<AudioId>,
}

/// Validated, type-specific problem properties
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProblemProperties {
    EnglishWord(EnglishWordProperties),
    EnglishPhrase(EnglishPhraseProperties),
    EnglishSentence(EnglishSentenceProperties),
}

impl ProblemProperties {
    /// Parse client-supplied properties. `audio_id` is owned by the server and
    /// any value the client sends is dropped.
    pub fn from_client(problem_type: ProblemType, mut value: JsonValue) -> Result<Self, ValidationError> {
        if let Some(object) = value.as_object_mut() {
            object.remove("audio_id");
        }
        Self::parse(problem_type, value)
    }

    /// Parse properties previously written by this server.
    pub fn from_stored(problem_type: ProblemType, value: JsonValue) -> Result<Self, ValidationError> {
        Self::parse(problem_type, value)
    }

    fn parse(problem_type: ProblemType, value: JsonValue) -> Result<Self, ValidationError> {
        match problem_type {
            ProblemType::EnglishWord => {
                let mut p: EnglishWordProperties = decode(problem_type, value)?;
                p.text = required_text("text", &p.text, 100)?;
                p.translated = optional_text("translated", &p.translated, 100)?;
                Ok(Self::EnglishWord(p))
            }
            ProblemType::EnglishPhrase => {
                let mut p: EnglishPhraseProperties = decode(problem_type, value)?;
                p.text = required_text("text", &p.text, 200)?;
                p.translated = required_text("translated", &p.translated, 200)?;
                Ok(Self::EnglishPhrase(p))
            }
            ProblemType::EnglishSentence => {
                let mut p: EnglishSentenceProperties = decode(problem_type, value)?;
                p.text = required_text("text", &p.text, 400)?;
                p.translated = optional_text("translated", &p.translated, 400)?;
                p.note = optional_text("note", &p.note, 400)?;
                Ok(Self::EnglishSentence(p))
            }
        }
    }

    pub fn problem_type(&self) -> ProblemType {
        match self {
            Self::EnglishWord(_) => ProblemType::EnglishWord,
            Self::EnglishPhrase(_) => ProblemType::EnglishPhrase,
            Self::EnglishSentence(_) => ProblemType::EnglishSentence,
        }
    }

    /// Text that is read aloud for this problem.
    pub fn text(&self) -> &str {
        match self {
            Self::EnglishWord(p) => &p.text,
            Self::EnglishPhrase(p) => &p.text,
            Self::EnglishSentence(p) => &p.text,
        }
    }

    pub fn audio_id(&self) -> Option<AudioId> {
        match self {
            Self::EnglishWord(p) => p.audio_id,
            Self::EnglishPhrase(p) => p.audio_id,
            Self::EnglishSentence(p) => p.audio_id,
        }
    }

    pub fn set_audio_id(&mut self, audio_id: Option<AudioId>) {
        match self {
            Self::EnglishWord(p) => p.audio_id = audio_id,
            Self::EnglishPhrase(p) => p.audio_id = audio_id,
            Self::EnglishSentence(p) => p.audio_id = audio_id,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        // Serializing plain structs of strings and enums cannot fail.
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

fn decode<T: DeserializeOwned>(problem_type: ProblemType, value: JsonValue) -> Result<T, ValidationError> {
    serde_json::from_value(value).map_err(|e| ValidationError::InvalidProperties {
        problem_type: problem_type.as_str(),
        reason: e.to_string(),
    })
}

/// Problem row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Problem {
    pub id: ProblemId,
    pub version: Version,
    pub workbook_id: WorkbookId,
    pub number: i32,
    pub problem_type: ProblemType,
    pub properties: ProblemProperties,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw problem fields as sent by clients; properties are checked against
/// the workbook's problem type by the workbook aggregate.
#[derive(Debug, Clone, Deserialize)]
pub struct ProblemFields {
    #[serde(default)]
    pub number: Option<i32>,
    pub properties: JsonValue,
}

/// Validated insert for a problem
#[derive(Debug, Clone)]
pub struct NewProblem {
    pub number: i32,
    pub properties: ProblemProperties,
}

/// Validated update for a problem
#[derive(Debug, Clone)]
pub struct ProblemUpdate {
    pub number: i32,
    pub properties: ProblemProperties,
}

/// Problem numbers are 1-based positions within a workbook.
pub fn validate_number(number: i32) -> Result<i32, ValidationError> {
    if number < 1 {
        return Err(ValidationError::InvalidFormat {
            field: "number",
            reason: "must be a positive integer",
        });
    }
    Ok(number)
}
