//! Synthesized speech for problem text

use serde::Serialize;

use super::{AudioId, Lang2};

/// Stored audio clip; `content` is base64-encoded MP3
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Audio {
    pub id: AudioId,
    pub lang2: Lang2,
    pub text: String,
    pub content: String,
}
