//! Application services
//!
//! Each call is one unit of work: open a transaction, load the [`Student`]
//! acting for the caller, run the domain operation, commit. Any error drops
//! the transaction, which rolls it back.

mod audio;
mod problems;
mod quotas;
mod study;
mod workbooks;

pub use audio::AudioService;
pub use problems::ProblemService;
pub use quotas::QuotaService;
pub use study::StudyService;
pub use workbooks::WorkbookService;

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use studyctl_core::models::AppUser;
use studyctl_core::quota::QuotaLimits;
use studyctl_core::{DomainResult, Student, Synthesizer};

use crate::db::PgStore;

/// Shared dependencies of all services
#[derive(Clone)]
pub struct ServiceContext {
    pool: PgPool,
    limits: Arc<QuotaLimits>,
    synthesizer: Arc<dyn Synthesizer>,
}

impl ServiceContext {
    pub fn new(pool: PgPool, limits: QuotaLimits, synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self {
            pool,
            limits: Arc::new(limits),
            synthesizer,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn workbooks(&self) -> WorkbookService<'_> {
        WorkbookService::new(self)
    }

    pub fn problems(&self) -> ProblemService<'_> {
        ProblemService::new(self)
    }

    pub fn study(&self) -> StudyService<'_> {
        StudyService::new(self)
    }

    pub fn audio(&self) -> AudioService<'_> {
        AudioService::new(self)
    }

    pub fn quotas(&self) -> QuotaService<'_> {
        QuotaService::new(self)
    }

    pub(crate) fn synthesizer(&self) -> &dyn Synthesizer {
        self.synthesizer.as_ref()
    }

    /// Open a transaction and build the caller's `Student` for today (UTC).
    pub(crate) async fn begin(&self, user: &AppUser) -> DomainResult<(PgStore, Student)> {
        let store = PgStore::begin(&self.pool).await?;
        let student = Student::new(
            user.clone(),
            self.limits.as_ref().clone(),
            Utc::now().date_naive(),
        );
        Ok((store, student))
    }
}
