//! Recordbook and study progress endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use studyctl_core::models::{
    CompletionRate, ProblemId, Recordbook, StudyAnswer, StudyRecord, StudyType, WorkbookId,
};

use super::problems::ProblemResponse;
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiPath, CurrentUser};
use crate::http::server::AppState;

/// The caller's progress on one problem
#[derive(Debug, Serialize)]
pub struct StudyRecordResponse {
    pub result_prev1: bool,
    pub memorized: bool,
    pub level: i32,
    pub answered_count: i32,
    pub correct_count: i32,
    pub last_answered_at: String,
}

impl From<StudyRecord> for StudyRecordResponse {
    fn from(r: StudyRecord) -> Self {
        Self {
            result_prev1: r.result_prev1,
            memorized: r.memorized,
            level: r.level,
            answered_count: r.answered_count,
            correct_count: r.correct_count,
            last_answered_at: r.last_answered_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecordbookEntryResponse {
    pub problem: ProblemResponse,
    pub record: Option<StudyRecordResponse>,
}

#[derive(Debug, Serialize)]
pub struct RecordbookResponse {
    pub workbook_id: WorkbookId,
    pub study_type: StudyType,
    pub entries: Vec<RecordbookEntryResponse>,
}

impl From<Recordbook> for RecordbookResponse {
    fn from(r: Recordbook) -> Self {
        Self {
            workbook_id: r.workbook_id,
            study_type: r.study_type,
            entries: r
                .entries
                .into_iter()
                .map(|e| RecordbookEntryResponse {
                    problem: e.problem.into(),
                    record: e.record.map(Into::into),
                })
                .collect(),
        }
    }
}

/// GET /v1/study/workbooks/{workbook_id}/study-types/{study_type}/recordbook
async fn get_recordbook(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiPath((workbook_id, study_type)): ApiPath<(WorkbookId, StudyType)>,
) -> Result<Json<RecordbookResponse>, ApiError> {
    let recordbook = state
        .services
        .study()
        .recordbook(&user, workbook_id, study_type)
        .await?;
    Ok(Json(RecordbookResponse::from(recordbook)))
}

/// POST /v1/study/workbooks/{workbook_id}/study-types/{study_type}/problems/{problem_id}/result
async fn set_study_result(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiPath((workbook_id, study_type, problem_id)): ApiPath<(WorkbookId, StudyType, ProblemId)>,
    ApiJson(answer): ApiJson<StudyAnswer>,
) -> Result<StatusCode, ApiError> {
    state
        .services
        .study()
        .set_result(&user, workbook_id, study_type, problem_id, answer)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/study/workbooks/{workbook_id}/study-types/{study_type}/completion-rate
async fn get_completion_rate(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiPath((workbook_id, study_type)): ApiPath<(WorkbookId, StudyType)>,
) -> Result<Json<CompletionRate>, ApiError> {
    let rate = state
        .services
        .study()
        .completion_rate(&user, workbook_id, study_type)
        .await?;
    Ok(Json(rate))
}

/// Study routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/v1/study/workbooks/{workbook_id}/study-types/{study_type}/recordbook",
            get(get_recordbook),
        )
        .route(
            "/v1/study/workbooks/{workbook_id}/study-types/{study_type}/problems/{problem_id}/result",
            post(set_study_result),
        )
        .route(
            "/v1/study/workbooks/{workbook_id}/study-types/{study_type}/completion-rate",
            get(get_completion_rate),
        )
}
