//! Text-to-speech seam
//!
//! The HTTP client lives in the server crate; tests use in-process fakes.

use async_trait::async_trait;

use crate::models::Lang2;

/// Error from a speech synthesizer
#[derive(Debug, thiserror::Error)]
pub enum SynthesizeError {
    #[error("speech synthesis is disabled")]
    Disabled,

    #[error("request failed: {0}")]
    Request(String),

    #[error("synthesizer returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Turns text into base64-encoded MP3 audio
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, lang2: &Lang2, text: &str) -> Result<String, SynthesizeError>;
}

/// Synthesizer used when text-to-speech is turned off in configuration
pub struct DisabledSynthesizer;

#[async_trait]
impl Synthesizer for DisabledSynthesizer {
    async fn synthesize(&self, _lang2: &Lang2, _text: &str) -> Result<String, SynthesizeError> {
        Err(SynthesizeError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_always_fails() {
        let err = DisabledSynthesizer
            .synthesize(&Lang2::english(), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesizeError::Disabled));
    }
}
