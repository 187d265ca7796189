//! Workbook endpoints on the caller's private space

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use studyctl_core::models::{
    AppUserId, NewWorkbook, Paginated, Pagination, PaginationParams, QuestionText, Version,
    Workbook, WorkbookFields, WorkbookId, WorkbookName, WorkbookUpdate,
};

use super::{IdResponse, VersionParams, VersionResponse};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::http::server::AppState;

/// Update workbook request
#[derive(Debug, Deserialize)]
pub struct UpdateWorkbookRequest {
    pub version: i32,
    pub name: String,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub audio_enabled: bool,
}

impl UpdateWorkbookRequest {
    fn into_parts(self) -> Result<(Version, WorkbookUpdate), ApiError> {
        let version = Version::new(self.version)?;
        let update = WorkbookUpdate {
            name: WorkbookName::new(&self.name)?,
            question_text: QuestionText::new(&self.question_text)?,
            audio_enabled: self.audio_enabled,
        };
        Ok((version, update))
    }
}

/// Workbook response
#[derive(Debug, Serialize)]
pub struct WorkbookResponse {
    pub id: WorkbookId,
    pub version: i32,
    pub owner_id: AppUserId,
    pub name: String,
    pub problem_type: &'static str,
    pub question_text: String,
    pub lang2: String,
    pub audio_enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Workbook> for WorkbookResponse {
    fn from(w: Workbook) -> Self {
        Self {
            id: w.id,
            version: w.version.get(),
            owner_id: w.owner_id,
            name: w.name,
            problem_type: w.problem_type.as_str(),
            question_text: w.question_text,
            lang2: w.lang2.as_str().to_owned(),
            audio_enabled: w.audio_enabled,
            created_at: w.created_at.to_rfc3339(),
            updated_at: w.updated_at.to_rfc3339(),
        }
    }
}

/// GET /v1/workbooks - the caller's workbooks, newest first
async fn list_workbooks(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> Result<Json<Paginated<WorkbookResponse>>, ApiError> {
    let page = Pagination::from(params);
    let workbooks = state.services.workbooks().list(&user, page).await?;
    Ok(Json(workbooks.map(WorkbookResponse::from)))
}

/// POST /v1/workbooks
async fn create_workbook(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiJson(fields): ApiJson<WorkbookFields>,
) -> Result<(StatusCode, Json<IdResponse<WorkbookId>>), ApiError> {
    let new = NewWorkbook::try_from(fields)?;
    let workbook = state.services.workbooks().create(&user, new).await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id: workbook.id })))
}

/// GET /v1/workbooks/{workbook_id}
async fn get_workbook(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiPath(workbook_id): ApiPath<WorkbookId>,
) -> Result<Json<WorkbookResponse>, ApiError> {
    let workbook = state.services.workbooks().get(&user, workbook_id).await?;
    Ok(Json(WorkbookResponse::from(workbook)))
}

/// PUT /v1/workbooks/{workbook_id}
async fn update_workbook(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiPath(workbook_id): ApiPath<WorkbookId>,
    ApiJson(req): ApiJson<UpdateWorkbookRequest>,
) -> Result<Json<VersionResponse<WorkbookId>>, ApiError> {
    let (version, update) = req.into_parts()?;
    let workbook = state
        .services
        .workbooks()
        .update(&user, workbook_id, version, update)
        .await?;
    Ok(Json(VersionResponse {
        id: workbook.id,
        version: workbook.version.get(),
    }))
}

/// DELETE /v1/workbooks/{workbook_id}?version=N
async fn delete_workbook(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiPath(workbook_id): ApiPath<WorkbookId>,
    ApiQuery(params): ApiQuery<VersionParams>,
) -> Result<StatusCode, ApiError> {
    let version = Version::new(params.version)?;
    state
        .services
        .workbooks()
        .delete(&user, workbook_id, version)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Workbook routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/workbooks", get(list_workbooks).post(create_workbook))
        .route(
            "/v1/workbooks/{workbook_id}",
            get(get_workbook).put(update_workbook).delete(delete_workbook),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_validates_fields() {
        let req: UpdateWorkbookRequest =
            serde_json::from_str(r#"{"version": 2, "name": "  Travel  "}"#).unwrap();
        let (version, update) = req.into_parts().unwrap();
        assert_eq!(version.get(), 2);
        assert_eq!(update.name.as_str(), "Travel");
        assert!(!update.audio_enabled);
    }

    #[test]
    fn update_request_rejects_version_zero() {
        let req: UpdateWorkbookRequest =
            serde_json::from_str(r#"{"version": 0, "name": "Travel"}"#).unwrap();
        assert!(matches!(req.into_parts(), Err(ApiError::Validation(_))));
    }
}
