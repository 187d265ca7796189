//! Route handlers organized by resource

pub mod audio;
pub mod health;
pub mod problems;
pub mod quotas;
pub mod study;
pub mod workbooks;

use serde::{Deserialize, Serialize};

/// Body of a 201 response
#[derive(Debug, Serialize)]
pub struct IdResponse<T> {
    pub id: T,
}

/// Body of a successful update
#[derive(Debug, Serialize)]
pub struct VersionResponse<T> {
    pub id: T,
    pub version: i32,
}

/// `?version=N` on deletes
#[derive(Debug, Deserialize)]
pub struct VersionParams {
    pub version: i32,
}
