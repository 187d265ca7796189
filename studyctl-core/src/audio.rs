//! Audio lookup and generation
//!
//! Audio is cached by `(lang2, text)`: two problems reading the same text
//! share one clip and the synthesizer runs once.
//!
//! Synthesis is a slow remote call. Callers holding a database transaction
//! prepare clips first with [`Presynthesized`] and hand that to the write.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::models::{Audio, Lang2};
use crate::store::AudioRepo;
use crate::synthesizer::{SynthesizeError, Synthesizer};

/// Return stored audio for the text, synthesizing and storing it if missing.
pub async fn find_or_synthesize<S>(
    store: &mut S,
    synthesizer: &dyn Synthesizer,
    lang2: &Lang2,
    text: &str,
) -> DomainResult<Audio>
where
    S: AudioRepo + ?Sized,
{
    if let Some(audio) = store.find_audio_by_text(lang2, text).await? {
        tracing::debug!(audio_id = %audio.id, lang2 = %lang2, "reusing stored audio");
        return Ok(audio);
    }

    let content = synthesizer.synthesize(lang2, text).await?;
    let audio = store.insert_audio(lang2, text, &content).await?;
    tracing::info!(audio_id = %audio.id, lang2 = %lang2, chars = text.chars().count(), "synthesized audio");
    Ok(audio)
}

/// Clips synthesized ahead of a unit of work.
///
/// Texts that were not prepared fall through to the wrapped synthesizer.
pub struct Presynthesized<'a> {
    inner: &'a dyn Synthesizer,
    clips: HashMap<(Lang2, String), String>,
}

impl<'a> Presynthesized<'a> {
    pub fn new(inner: &'a dyn Synthesizer) -> Self {
        Self {
            inner,
            clips: HashMap::new(),
        }
    }

    /// Synthesize `text` now so a later call answers without the remote trip.
    pub async fn prepare(&mut self, lang2: &Lang2, text: &str) -> DomainResult<()> {
        let content = self.inner.synthesize(lang2, text).await?;
        self.clips.insert((lang2.clone(), text.to_owned()), content);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

#[async_trait]
impl Synthesizer for Presynthesized<'_> {
    async fn synthesize(&self, lang2: &Lang2, text: &str) -> Result<String, SynthesizeError> {
        match self.clips.get(&(lang2.clone(), text.to_owned())) {
            Some(content) => Ok(content.clone()),
            None => self.inner.synthesize(lang2, text).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Synthesizer for Counting {
        async fn synthesize(&self, _lang2: &Lang2, text: &str) -> Result<String, SynthesizeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("mp3:{}", text))
        }
    }

    #[tokio::test]
    async fn prepared_text_is_not_synthesized_again() {
        let inner = Counting::default();
        let mut prepared = Presynthesized::new(&inner);
        prepared.prepare(&Lang2::english(), "apple").await.unwrap();

        let content = prepared.synthesize(&Lang2::english(), "apple").await.unwrap();
        assert_eq!(content, "mp3:apple");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unprepared_text_falls_through() {
        let inner = Counting::default();
        let prepared = Presynthesized::new(&inner);
        assert!(prepared.is_empty());

        prepared.synthesize(&Lang2::english(), "pear").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }
}
