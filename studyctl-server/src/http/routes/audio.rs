//! Problem audio endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use studyctl_core::models::{Audio, AudioId, ProblemId, WorkbookId};

use crate::http::error::ApiError;
use crate::http::extractors::{ApiPath, CurrentUser};
use crate::http::server::AppState;

/// Audio response; `content` is base64-encoded MP3
#[derive(Debug, Serialize)]
pub struct AudioResponse {
    pub id: AudioId,
    pub lang2: String,
    pub text: String,
    pub content: String,
}

impl From<Audio> for AudioResponse {
    fn from(a: Audio) -> Self {
        Self {
            id: a.id,
            lang2: a.lang2.as_str().to_owned(),
            text: a.text,
            content: a.content,
        }
    }
}

type AudioPath = (WorkbookId, ProblemId, AudioId);

/// GET /v1/workbooks/{workbook_id}/problems/{problem_id}/audio/{audio_id}
async fn get_audio(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiPath((workbook_id, problem_id, audio_id)): ApiPath<AudioPath>,
) -> Result<Json<AudioResponse>, ApiError> {
    let audio = state
        .services
        .audio()
        .get(&user, workbook_id, problem_id, audio_id)
        .await?;
    Ok(Json(AudioResponse::from(audio)))
}

/// GET /v1/workbooks/{workbook_id}/problems/{problem_id}/audio/{audio_id}/content
async fn get_audio_content(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiPath((workbook_id, problem_id, audio_id)): ApiPath<AudioPath>,
) -> Result<impl IntoResponse, ApiError> {
    let audio = state
        .services
        .audio()
        .get(&user, workbook_id, problem_id, audio_id)
        .await?;
    let bytes = STANDARD.decode(&audio.content).map_err(|e| ApiError::Internal {
        message: format!("stored audio {} is not base64: {}", audio.id, e),
    })?;
    Ok(([(CONTENT_TYPE, "audio/mpeg")], bytes))
}

/// Audio routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/v1/workbooks/{workbook_id}/problems/{problem_id}/audio/{audio_id}",
            get(get_audio),
        )
        .route(
            "/v1/workbooks/{workbook_id}/problems/{problem_id}/audio/{audio_id}/content",
            get(get_audio_content),
        )
}
