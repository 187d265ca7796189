//! Quota usage endpoint

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use studyctl_core::quota::QuotaUsage;

use crate::http::error::ApiError;
use crate::http::extractors::CurrentUser;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct QuotaUsageResponse {
    pub name: String,
    pub problem_type: &'static str,
    pub unit: &'static str,
    pub used: i64,
    pub limit: i64,
    pub remaining: i64,
}

impl From<QuotaUsage> for QuotaUsageResponse {
    fn from(q: QuotaUsage) -> Self {
        Self {
            remaining: q.remaining(),
            problem_type: q.problem_type.as_str(),
            unit: q.unit.as_str(),
            used: q.used,
            limit: q.limit,
            name: q.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuotaListResponse {
    pub items: Vec<QuotaUsageResponse>,
}

/// GET /v1/quotas - usage of every quota for the caller
async fn list_quotas(
    CurrentUser(user): CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<QuotaListResponse>, ApiError> {
    let usages = state.services.quotas().usages(&user).await?;
    Ok(Json(QuotaListResponse {
        items: usages.into_iter().map(QuotaUsageResponse::from).collect(),
    }))
}

/// Quota routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/v1/quotas", get(list_quotas))
}
