//! Student aggregate
//!
//! A `Student` is built once per request from the authenticated user. It
//! answers "may this user see or change that workbook" and keeps the user's
//! quota counters honest. Persistence goes through whatever [`StudyStore`]
//! the caller passes in, normally one wrapping the request's transaction.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{DomainError, DomainResult};
use crate::models::{
    AppUser, CompletionRate, NewWorkbook, Paginated, Pagination, ProblemId, ProblemType,
    Recordbook, RecordbookEntry, StudyAnswer, StudyRecord, StudyType, Version, Workbook,
    WorkbookId, WorkbookUpdate,
};
use crate::quota::{self, QuotaKind, QuotaLimits, QuotaName, QuotaPeriod, QuotaUsage};
use crate::store::StudyStore;
use crate::workbook::WorkbookAggregate;

pub struct Student {
    user: AppUser,
    limits: QuotaLimits,
    today: NaiveDate,
}

impl Student {
    /// `today` is the UTC date daily quotas are counted against.
    pub fn new(user: AppUser, limits: QuotaLimits, today: NaiveDate) -> Self {
        Self {
            user,
            limits,
            today,
        }
    }

    pub fn user(&self) -> &AppUser {
        &self.user
    }

    pub async fn find_workbooks_on_private_space<S>(
        &self,
        store: &mut S,
        page: Pagination,
    ) -> DomainResult<Paginated<Workbook>>
    where
        S: StudyStore + ?Sized,
    {
        Ok(store.find_workbooks_by_owner(self.user.id, page).await?)
    }

    /// Load a workbook the student may read.
    ///
    /// Workbooks of other organizations are reported as missing; workbooks of
    /// other users in the same organization are readable by organization
    /// owners only.
    pub async fn find_workbook_by_id<S>(
        &self,
        store: &mut S,
        id: WorkbookId,
    ) -> DomainResult<WorkbookAggregate>
    where
        S: StudyStore + ?Sized,
    {
        let workbook = store
            .find_workbook(id)
            .await?
            .filter(|wb| wb.organization_id == self.user.organization_id)
            .ok_or(DomainError::WorkbookNotFound(id))?;

        if workbook.owner_id != self.user.id && !self.user.is_owner() {
            return Err(DomainError::permission_denied(format!(
                "workbook '{}' belongs to another user",
                id
            )));
        }

        Ok(WorkbookAggregate::new(workbook))
    }

    /// Writes are reserved for the workbook's owner.
    pub fn ensure_owner(&self, workbook: &Workbook) -> DomainResult<()> {
        if workbook.owner_id != self.user.id {
            return Err(DomainError::permission_denied(format!(
                "workbook '{}' is not owned by the caller",
                workbook.id
            )));
        }
        Ok(())
    }

    pub async fn add_workbook<S>(&self, store: &mut S, new: NewWorkbook) -> DomainResult<Workbook>
    where
        S: StudyStore + ?Sized,
    {
        let workbook = store
            .insert_workbook(self.user.organization_id, self.user.id, &new)
            .await?;
        tracing::info!(workbook_id = %workbook.id, user_id = %self.user.id, "workbook added");
        Ok(workbook)
    }

    pub async fn update_workbook<S>(
        &self,
        store: &mut S,
        id: WorkbookId,
        version: Version,
        update: WorkbookUpdate,
    ) -> DomainResult<Workbook>
    where
        S: StudyStore + ?Sized,
    {
        let aggregate = self.find_workbook_by_id(store, id).await?;
        let current = aggregate.workbook();
        self.ensure_owner(current)?;
        check_version("workbook", version, current.version)?;

        store
            .update_workbook(id, version, &update)
            .await?
            .ok_or(DomainError::VersionConflict {
                resource: "workbook",
                expected: version.get(),
                current: current.version.get(),
            })
    }

    /// Remove a workbook and release the size quota its problems held.
    pub async fn remove_workbook<S>(
        &self,
        store: &mut S,
        id: WorkbookId,
        version: Version,
    ) -> DomainResult<()>
    where
        S: StudyStore + ?Sized,
    {
        let aggregate = self.find_workbook_by_id(store, id).await?;
        let current = aggregate.workbook();
        self.ensure_owner(current)?;
        check_version("workbook", version, current.version)?;

        let problem_count = store.count_problems(id).await?;
        if !store.delete_workbook(id, version).await? {
            return Err(DomainError::VersionConflict {
                resource: "workbook",
                expected: version.get(),
                current: current.version.get(),
            });
        }

        if problem_count > 0 {
            self.decrement_quota_usage(store, current.problem_type, QuotaKind::Size, problem_count)
                .await?;
        }
        tracing::info!(workbook_id = %id, problems = problem_count, "workbook removed");
        Ok(())
    }

    /// Fail if one more use of the named quota would pass its limit.
    pub async fn check_quota<S>(
        &self,
        store: &mut S,
        problem_type: ProblemType,
        kind: QuotaKind,
    ) -> DomainResult<()>
    where
        S: StudyStore + ?Sized,
    {
        let name = QuotaName::new(problem_type, kind);
        let used = store
            .quota_usage(self.user.id, name, self.period(kind))
            .await?;
        let limit = self.limits.limit(name);
        quota::check(name, used, limit, 1).inspect_err(|_| {
            tracing::warn!(user_id = %self.user.id, quota = %name, used, limit, "quota exceeded");
        })
    }

    /// Count one use of the named quota, failing if that passes its limit.
    ///
    /// The store checks and increments in one step, so this holds even when
    /// [`Student::check_quota`] passed for two concurrent requests.
    pub async fn increment_quota_usage<S>(
        &self,
        store: &mut S,
        problem_type: ProblemType,
        kind: QuotaKind,
    ) -> DomainResult<()>
    where
        S: StudyStore + ?Sized,
    {
        let name = QuotaName::new(problem_type, kind);
        let limit = self.limits.limit(name);
        let consumed = store
            .try_add_quota_usage(
                self.user.organization_id,
                self.user.id,
                name,
                self.period(kind),
                1,
                limit,
            )
            .await?;
        match consumed {
            Some(_) => Ok(()),
            None => {
                tracing::warn!(user_id = %self.user.id, quota = %name, limit, "quota exceeded");
                Err(DomainError::QuotaExceeded {
                    name: name.to_string(),
                    limit,
                })
            }
        }
    }

    pub async fn decrement_quota_usage<S>(
        &self,
        store: &mut S,
        problem_type: ProblemType,
        kind: QuotaKind,
        amount: i64,
    ) -> DomainResult<()>
    where
        S: StudyStore + ?Sized,
    {
        let name = QuotaName::new(problem_type, kind);
        store
            .add_quota_usage(
                self.user.organization_id,
                self.user.id,
                name,
                self.period(kind),
                -amount,
            )
            .await?;
        Ok(())
    }

    /// Usage of every quota: size counters overall, update counters for today.
    pub async fn find_quota_usages<S>(&self, store: &mut S) -> DomainResult<Vec<QuotaUsage>>
    where
        S: StudyStore + ?Sized,
    {
        let mut usages = Vec::with_capacity(ProblemType::ALL.len() * 2);
        for problem_type in ProblemType::ALL {
            for kind in [QuotaKind::Size, QuotaKind::Update] {
                let name = QuotaName::new(problem_type, kind);
                let used = store
                    .quota_usage(self.user.id, name, self.period(kind))
                    .await?;
                usages.push(QuotaUsage::new(name, used, self.limits.limit(name)));
            }
        }
        Ok(usages)
    }

    pub async fn find_recordbook<S>(
        &self,
        store: &mut S,
        workbook_id: WorkbookId,
        study_type: StudyType,
    ) -> DomainResult<Recordbook>
    where
        S: StudyStore + ?Sized,
    {
        self.find_workbook_by_id(store, workbook_id).await?;

        let problems = store.find_all_problems(workbook_id).await?;
        let mut records: HashMap<ProblemId, StudyRecord> = store
            .find_study_records(self.user.id, workbook_id, study_type)
            .await?
            .into_iter()
            .map(|r| (r.problem_id, r))
            .collect();

        let entries = problems
            .into_iter()
            .map(|problem| {
                let record = records.remove(&problem.id);
                RecordbookEntry { problem, record }
            })
            .collect();

        Ok(Recordbook {
            workbook_id,
            study_type,
            entries,
        })
    }

    pub async fn set_study_result<S>(
        &self,
        store: &mut S,
        workbook_id: WorkbookId,
        problem_id: ProblemId,
        study_type: StudyType,
        answer: StudyAnswer,
        at: DateTime<Utc>,
    ) -> DomainResult<StudyRecord>
    where
        S: StudyStore + ?Sized,
    {
        let workbook = self.find_workbook_by_id(store, workbook_id).await?;
        workbook.find_problem_by_id(store, problem_id).await?;

        let record = match store
            .find_study_record(self.user.id, problem_id, study_type)
            .await?
        {
            Some(existing) => existing.answered(answer, at),
            None => StudyRecord::first(self.user.id, workbook_id, problem_id, study_type, answer, at),
        };
        store.save_study_record(&record).await?;

        tracing::debug!(
            problem_id = %problem_id,
            study_type = %study_type,
            result = answer.result,
            level = record.level,
            "study result recorded"
        );
        Ok(record)
    }

    pub async fn completion_rate<S>(
        &self,
        store: &mut S,
        workbook_id: WorkbookId,
        study_type: StudyType,
    ) -> DomainResult<CompletionRate>
    where
        S: StudyStore + ?Sized,
    {
        self.find_workbook_by_id(store, workbook_id).await?;
        let total = store.count_problems(workbook_id).await?;
        let memorized = store
            .count_memorized(self.user.id, workbook_id, study_type)
            .await?;
        Ok(CompletionRate::new(total, memorized))
    }

    fn period(&self, kind: QuotaKind) -> QuotaPeriod {
        QuotaPeriod::for_kind(kind, self.today)
    }
}

/// Compare the version a client last saw with the stored one.
pub(crate) fn check_version(resource: &'static str, expected: Version, current: Version) -> DomainResult<()> {
    if expected != current {
        return Err(DomainError::VersionConflict {
            resource,
            expected: expected.get(),
            current: current.get(),
        });
    }
    Ok(())
}
