use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::models::ProblemType;
use crate::quota::{QuotaLimit, QuotaLimits};

/// Default endpoint of the text-to-speech REST API
pub const DEFAULT_TTS_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Configuration for the studyctl server and CLI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    pub log_level: Option<String>,
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub synthesizer: SynthesizerSection,
    /// Quota overrides keyed by problem type (e.g. `[quota.english_word]`)
    pub quota: BTreeMap<String, QuotaLimit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: SocketAddr,
    pub cors_permissive: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3040)),
            cors_permissive: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesizerSection {
    pub enabled: bool,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SynthesizerSection {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: DEFAULT_TTS_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl StudyConfig {
    /// Load config from `path`, or from ~/.studyctl/config.toml when no path
    /// is given. An explicit path must exist; a missing default file yields
    /// the built-in defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    tracing::debug!(path = ?default_path, "no config file, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).context("Failed to parse config file (invalid TOML)")
    }

    /// Get config file path: ~/.studyctl/config.toml
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".studyctl/config.toml")
    }

    /// `DATABASE_URL` and `STUDYCTL_TTS_API_KEY` win over file values.
    fn apply_env(&mut self) {
        if let Ok(url) = env::var("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Ok(key) = env::var("STUDYCTL_TTS_API_KEY") {
            self.synthesizer.api_key = Some(key);
        }
    }

    /// Quota limits with the `[quota.<problem_type>]` overrides applied.
    pub fn quota_limits(&self) -> Result<QuotaLimits> {
        let overrides = self
            .quota
            .iter()
            .map(|(key, limit)| {
                let problem_type: ProblemType = key
                    .parse()
                    .with_context(|| format!("unknown problem type in [quota.{}]", key))?;
                Ok((problem_type, *limit))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(QuotaLimits::with_overrides(overrides))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::QuotaName;
    use std::io::Write;

    #[test]
    fn parses_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"

[server]
bind = "0.0.0.0:8080"

[synthesizer]
enabled = true

[quota.english_word]
size = 10
update = 3
"#
        )
        .unwrap();

        let config = StudyConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.bind.port(), 8080);
        assert!(!config.server.cors_permissive);
        assert!(config.synthesizer.enabled);
        assert_eq!(config.synthesizer.endpoint, DEFAULT_TTS_ENDPOINT);
        assert_eq!(config.database.max_connections, 5);

        let limits = config.quota_limits().unwrap();
        assert_eq!(limits.limit(QuotaName::size(ProblemType::EnglishWord)), 10);
        assert_eq!(limits.limit(QuotaName::update(ProblemType::EnglishWord)), 3);
    }

    #[test]
    fn unknown_quota_type_is_an_error() {
        let config: StudyConfig = toml::from_str(
            r#"
[quota.kanji]
size = 1
update = 1
"#,
        )
        .unwrap();
        assert!(config.quota_limits().is_err());
    }

    #[test]
    fn explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(StudyConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let rendered = StudyConfig::default().to_toml().unwrap();
        let parsed: StudyConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.server.bind, StudyConfig::default().server.bind);
    }
}
