//! HTTP text-to-speech client
//!
//! Speaks the Google Cloud Text-to-Speech `text:synthesize` JSON shape, so any
//! compatible endpoint works.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use studyctl_core::config::SynthesizerSection;
use studyctl_core::models::Lang2;
use studyctl_core::{DisabledSynthesizer, SynthesizeError, Synthesizer};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: Input<'a>,
    voice: Voice,
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct Input<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Voice {
    language_code: &'static str,
    ssml_gender: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

/// Synthesizer backed by an HTTP endpoint
pub struct HttpSynthesizer {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpSynthesizer {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SynthesizeError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SynthesizeError::Request(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

/// Build the synthesizer described by configuration.
pub fn from_config(section: &SynthesizerSection) -> Result<Arc<dyn Synthesizer>, SynthesizeError> {
    if !section.enabled {
        debug!("speech synthesis disabled");
        return Ok(Arc::new(DisabledSynthesizer));
    }
    if section.api_key.is_none() {
        warn!(endpoint = %section.endpoint, "speech synthesis enabled without an API key");
    }
    let synthesizer = HttpSynthesizer::new(
        section.endpoint.clone(),
        section.api_key.clone(),
        Duration::from_secs(section.timeout_secs),
    )?;
    Ok(Arc::new(synthesizer))
}

#[async_trait]
impl Synthesizer for HttpSynthesizer {
    async fn synthesize(&self, lang2: &Lang2, text: &str) -> Result<String, SynthesizeError> {
        let request = SynthesizeRequest {
            input: Input { text },
            voice: Voice {
                language_code: lang2.language_code(),
                ssml_gender: "FEMALE",
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        };

        let mut builder = self.http.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.query(&[("key", key)]);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SynthesizeError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesizeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| SynthesizeError::InvalidResponse(e.to_string()))?;

        if body.audio_content.is_empty() {
            return Err(SynthesizeError::InvalidResponse("empty audioContent".into()));
        }
        STANDARD
            .decode(&body.audio_content)
            .map_err(|e| SynthesizeError::InvalidResponse(format!("audioContent is not base64: {}", e)))?;

        debug!(lang2 = %lang2, chars = text.chars().count(), "synthesized speech");
        Ok(body.audio_content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/synthesize", addr)
    }

    #[tokio::test]
    async fn posts_google_request_shape() {
        let router = Router::new().route(
            "/synthesize",
            post(
                |Query(query): Query<HashMap<String, String>>, Json(body): Json<Value>| async move {
                    assert_eq!(query.get("key").map(String::as_str), Some("secret"));
                    assert_eq!(body["input"]["text"], "apple");
                    assert_eq!(body["voice"]["languageCode"], "en-US");
                    assert_eq!(body["voice"]["ssmlGender"], "FEMALE");
                    assert_eq!(body["audioConfig"]["audioEncoding"], "MP3");
                    Json(json!({ "audioContent": STANDARD.encode(b"ID3mp3") }))
                },
            ),
        );
        let endpoint = spawn(router).await;

        let synth =
            HttpSynthesizer::new(endpoint, Some("secret".into()), Duration::from_secs(5)).unwrap();
        let content = synth.synthesize(&Lang2::english(), "apple").await.unwrap();
        assert_eq!(STANDARD.decode(content).unwrap(), b"ID3mp3");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let router = Router::new().route(
            "/synthesize",
            post(|| async { (StatusCode::FORBIDDEN, "bad key") }),
        );
        let endpoint = spawn(router).await;

        let synth = HttpSynthesizer::new(endpoint, None, Duration::from_secs(5)).unwrap();
        let err = synth.synthesize(&Lang2::english(), "apple").await.unwrap_err();
        assert!(matches!(err, SynthesizeError::Status { status: 403, .. }));
    }

    #[tokio::test]
    async fn non_base64_content_is_rejected() {
        let router = Router::new().route(
            "/synthesize",
            post(|| async { Json(json!({ "audioContent": "not base64!!" })) }),
        );
        let endpoint = spawn(router).await;

        let synth = HttpSynthesizer::new(endpoint, None, Duration::from_secs(5)).unwrap();
        let err = synth.synthesize(&Lang2::english(), "apple").await.unwrap_err();
        assert!(matches!(err, SynthesizeError::InvalidResponse(_)));
    }

    #[test]
    fn disabled_config_builds_disabled_synthesizer() {
        let section = SynthesizerSection::default();
        assert!(!section.enabled);
        assert!(from_config(&section).is_ok());
    }
}
