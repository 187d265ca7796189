//! Problem endpoints within a workbook

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use studyctl_core::models::{
    Paginated, Pagination, PaginationParams, Problem, ProblemFields, ProblemId, Version,
    WorkbookId,
};

use super::{IdResponse, VersionParams, VersionResponse};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::http::server::AppState;

/// Maximum ids accepted by the by-ids lookup
const MAX_IDS: usize = 100;

/// Update problem request
#[derive(Debug, Deserialize)]
pub struct UpdateProblemRequest {
    pub version: i32,
    #[serde(default)]
    pub number: Option<i32>,
    pub properties: JsonValue,
}

/// Lookup of several problems at once
#[derive(Debug, Deserialize)]
pub struct ProblemIdsRequest {
    pub ids: Vec<ProblemId>,
}

/// Problem response
#[derive(Debug, Serialize)]
pub struct ProblemResponse {
    pub id: ProblemId,
    pub version: i32,
    pub workbook_id: WorkbookId,
    pub number: i32,
    pub problem_type: &'static str,
    pub properties: JsonValue,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Problem> for ProblemResponse {
    fn from(p: Problem) -> Self {
        Self {
            id: p.id,
            version: p.version.get(),
            workbook_id: p.workbook_id,
            number: p.number,
            problem_type: p.problem_type.as_str(),
            properties: p.properties.to_json(),
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

/// Problems returned by the by-ids lookup
#[derive(Debug, Serialize)]
pub struct ProblemListResponse {
    pub items: Vec<ProblemResponse>,
}

/// GET /v1/workbooks/{workbook_id}/problems
async fn list_problems(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiPath(workbook_id): ApiPath<WorkbookId>,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> Result<Json<Paginated<ProblemResponse>>, ApiError> {
    let page = Pagination::from(params);
    let problems = state
        .services
        .problems()
        .list(&user, workbook_id, page)
        .await?;
    Ok(Json(problems.map(ProblemResponse::from)))
}

/// POST /v1/workbooks/{workbook_id}/problems
async fn create_problem(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiPath(workbook_id): ApiPath<WorkbookId>,
    ApiJson(fields): ApiJson<ProblemFields>,
) -> Result<(StatusCode, Json<IdResponse<ProblemId>>), ApiError> {
    let problem = state
        .services
        .problems()
        .create(&user, workbook_id, fields)
        .await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id: problem.id })))
}

/// POST /v1/workbooks/{workbook_id}/problems/by-ids
async fn find_problems_by_ids(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiPath(workbook_id): ApiPath<WorkbookId>,
    ApiJson(req): ApiJson<ProblemIdsRequest>,
) -> Result<Json<ProblemListResponse>, ApiError> {
    if req.ids.len() > MAX_IDS {
        return Err(ApiError::BadRequest {
            message: format!("at most {} ids per request", MAX_IDS),
        });
    }
    let problems = state
        .services
        .problems()
        .get_by_ids(&user, workbook_id, &req.ids)
        .await?;
    Ok(Json(ProblemListResponse {
        items: problems.into_iter().map(ProblemResponse::from).collect(),
    }))
}

/// GET /v1/workbooks/{workbook_id}/problems/{problem_id}
async fn get_problem(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiPath((workbook_id, problem_id)): ApiPath<(WorkbookId, ProblemId)>,
) -> Result<Json<ProblemResponse>, ApiError> {
    let problem = state
        .services
        .problems()
        .get(&user, workbook_id, problem_id)
        .await?;
    Ok(Json(ProblemResponse::from(problem)))
}

/// PUT /v1/workbooks/{workbook_id}/problems/{problem_id}
async fn update_problem(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiPath((workbook_id, problem_id)): ApiPath<(WorkbookId, ProblemId)>,
    ApiJson(req): ApiJson<UpdateProblemRequest>,
) -> Result<Json<VersionResponse<ProblemId>>, ApiError> {
    let version = Version::new(req.version)?;
    let fields = ProblemFields {
        number: req.number,
        properties: req.properties,
    };
    let problem = state
        .services
        .problems()
        .update(&user, workbook_id, problem_id, version, fields)
        .await?;
    Ok(Json(VersionResponse {
        id: problem.id,
        version: problem.version.get(),
    }))
}

/// DELETE /v1/workbooks/{workbook_id}/problems/{problem_id}?version=N
async fn delete_problem(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
    ApiPath((workbook_id, problem_id)): ApiPath<(WorkbookId, ProblemId)>,
    ApiQuery(params): ApiQuery<VersionParams>,
) -> Result<StatusCode, ApiError> {
    let version = Version::new(params.version)?;
    state
        .services
        .problems()
        .delete(&user, workbook_id, problem_id, version)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Problem routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/v1/workbooks/{workbook_id}/problems",
            get(list_problems).post(create_problem),
        )
        .route(
            "/v1/workbooks/{workbook_id}/problems/by-ids",
            post(find_problems_by_ids),
        )
        .route(
            "/v1/workbooks/{workbook_id}/problems/{problem_id}",
            get(get_problem).put(update_problem).delete(delete_problem),
        )
}
