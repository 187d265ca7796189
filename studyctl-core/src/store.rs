//! Repository traits
//!
//! One trait per concern, combined into [`StudyStore`]. Every method takes
//! `&mut self` so an implementation can wrap a single database transaction:
//! the service layer opens it, the aggregates run against it, and the
//! service commits or drops it.

use async_trait::async_trait;

use crate::models::{
    AppUserId, Audio, AudioId, Lang2, NewProblem, NewWorkbook, OrganizationId, Paginated,
    Pagination, Problem, ProblemId, ProblemUpdate, StudyRecord, StudyType, Version, Workbook,
    WorkbookId, WorkbookUpdate,
};
use crate::quota::{QuotaName, QuotaPeriod};

/// Storage error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("duplicate {resource}: {detail}")]
    Duplicate {
        resource: &'static str,
        detail: String,
    },

    /// A stored row no longer parses into the domain model
    #[error("corrupt {resource} row: {detail}")]
    Corrupt {
        resource: &'static str,
        detail: String,
    },

    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(e.into())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait WorkbookRepo: Send {
    /// Workbooks owned by `owner`, newest first.
    async fn find_workbooks_by_owner(
        &mut self,
        owner: AppUserId,
        page: Pagination,
    ) -> StoreResult<Paginated<Workbook>>;

    async fn find_workbook(&mut self, id: WorkbookId) -> StoreResult<Option<Workbook>>;

    async fn insert_workbook(
        &mut self,
        organization_id: OrganizationId,
        owner: AppUserId,
        new: &NewWorkbook,
    ) -> StoreResult<Workbook>;

    /// Returns `None` when no row with `id` at `version` exists.
    async fn update_workbook(
        &mut self,
        id: WorkbookId,
        version: Version,
        update: &WorkbookUpdate,
    ) -> StoreResult<Option<Workbook>>;

    /// Deletes the workbook with its problems and study records.
    /// Returns false when no row with `id` at `version` exists.
    async fn delete_workbook(&mut self, id: WorkbookId, version: Version) -> StoreResult<bool>;
}

#[async_trait]
pub trait ProblemRepo: Send {
    /// Problems ordered by number.
    async fn find_problems(
        &mut self,
        workbook_id: WorkbookId,
        page: Pagination,
    ) -> StoreResult<Paginated<Problem>>;

    async fn find_all_problems(&mut self, workbook_id: WorkbookId) -> StoreResult<Vec<Problem>>;

    async fn find_problem(
        &mut self,
        workbook_id: WorkbookId,
        id: ProblemId,
    ) -> StoreResult<Option<Problem>>;

    async fn find_problems_by_ids(
        &mut self,
        workbook_id: WorkbookId,
        ids: &[ProblemId],
    ) -> StoreResult<Vec<Problem>>;

    async fn count_problems(&mut self, workbook_id: WorkbookId) -> StoreResult<i64>;

    /// Highest number in the workbook plus one.
    async fn next_problem_number(&mut self, workbook_id: WorkbookId) -> StoreResult<i32>;

    async fn insert_problem(
        &mut self,
        workbook_id: WorkbookId,
        new: &NewProblem,
    ) -> StoreResult<Problem>;

    /// Returns `None` when no row with `id` at `version` exists.
    async fn update_problem(
        &mut self,
        workbook_id: WorkbookId,
        id: ProblemId,
        version: Version,
        update: &ProblemUpdate,
    ) -> StoreResult<Option<Problem>>;

    async fn delete_problem(
        &mut self,
        workbook_id: WorkbookId,
        id: ProblemId,
        version: Version,
    ) -> StoreResult<bool>;
}

#[async_trait]
pub trait StudyRecordRepo: Send {
    async fn find_study_records(
        &mut self,
        user: AppUserId,
        workbook_id: WorkbookId,
        study_type: StudyType,
    ) -> StoreResult<Vec<StudyRecord>>;

    async fn find_study_record(
        &mut self,
        user: AppUserId,
        problem_id: ProblemId,
        study_type: StudyType,
    ) -> StoreResult<Option<StudyRecord>>;

    /// Insert or replace the record for (user, problem, study type).
    async fn save_study_record(&mut self, record: &StudyRecord) -> StoreResult<()>;

    async fn count_memorized(
        &mut self,
        user: AppUserId,
        workbook_id: WorkbookId,
        study_type: StudyType,
    ) -> StoreResult<i64>;
}

#[async_trait]
pub trait QuotaRepo: Send {
    /// Stored counter value, 0 when never touched.
    async fn quota_usage(
        &mut self,
        user: AppUserId,
        name: QuotaName,
        period: QuotaPeriod,
    ) -> StoreResult<i64>;

    /// Add `delta` to the counter, clamping at zero; returns the new value.
    async fn add_quota_usage(
        &mut self,
        organization_id: OrganizationId,
        user: AppUserId,
        name: QuotaName,
        period: QuotaPeriod,
        delta: i64,
    ) -> StoreResult<i64>;

    /// Add `amount` only if the counter stays within `limit`; returns the new
    /// value, or `None` when the limit would be passed. Check and increment
    /// happen as one step, so concurrent writers cannot overshoot the limit.
    async fn try_add_quota_usage(
        &mut self,
        organization_id: OrganizationId,
        user: AppUserId,
        name: QuotaName,
        period: QuotaPeriod,
        amount: i64,
        limit: i64,
    ) -> StoreResult<Option<i64>>;
}

#[async_trait]
pub trait AudioRepo: Send {
    async fn find_audio(&mut self, id: AudioId) -> StoreResult<Option<Audio>>;

    async fn find_audio_by_text(&mut self, lang2: &Lang2, text: &str) -> StoreResult<Option<Audio>>;

    /// Store a clip; if one already exists for `(lang2, text)` it is
    /// returned unchanged instead.
    async fn insert_audio(&mut self, lang2: &Lang2, text: &str, content: &str) -> StoreResult<Audio>;
}

/// Everything the aggregates need from storage within one unit of work
pub trait StudyStore: WorkbookRepo + ProblemRepo + StudyRecordRepo + QuotaRepo + AudioRepo {}

impl<T> StudyStore for T where T: WorkbookRepo + ProblemRepo + StudyRecordRepo + QuotaRepo + AudioRepo {}
