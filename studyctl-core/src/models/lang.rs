//! Two-letter language codes (ISO 639-1)

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ValidationError;

static LANG2_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]{2}$").expect("invalid lang2 regex"));

/// Validated ISO 639-1 language code such as `en` or `ja`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Lang2(String);

impl Lang2 {
    /// # Example
    /// ```
    /// use studyctl_core::models::Lang2;
    ///
    /// assert!(Lang2::new("ja").is_ok());
    /// assert!(Lang2::new("JA").is_err());
    /// assert!(Lang2::new("jpn").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "lang2" });
        }
        if !LANG2_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "lang2",
                reason: "must be a two-letter lowercase ISO 639-1 code",
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn english() -> Self {
        Self("en".to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// BCP-47 tag used by speech synthesis voices.
    pub fn language_code(&self) -> &'static str {
        match self.0.as_str() {
            "en" => "en-US",
            "ja" => "ja-JP",
            "es" => "es-ES",
            "fr" => "fr-FR",
            "de" => "de-DE",
            "it" => "it-IT",
            "ko" => "ko-KR",
            "zh" => "cmn-CN",
            "pt" => "pt-BR",
            _ => "en-US",
        }
    }
}

impl TryFrom<String> for Lang2 {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Lang2> for String {
    fn from(value: Lang2) -> Self {
        value.0
    }
}

impl fmt::Display for Lang2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty() {
        assert_eq!(
            Lang2::new("").unwrap_err(),
            ValidationError::Empty { field: "lang2" }
        );
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<Lang2>("\"en\"").is_ok());
        assert!(serde_json::from_str::<Lang2>("\"english\"").is_err());
    }

    #[test]
    fn voice_language_code() {
        assert_eq!(Lang2::new("ja").unwrap().language_code(), "ja-JP");
        assert_eq!(Lang2::new("xx").unwrap().language_code(), "en-US");
    }
}
