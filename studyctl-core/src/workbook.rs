//! Workbook aggregate: problem operations on one loaded workbook

use crate::audio;
use crate::error::{DomainError, DomainResult};
use crate::models::{
    validate_number, Audio, AudioId, NewProblem, Paginated, Pagination, Problem, ProblemFields,
    ProblemId, ProblemProperties, ProblemUpdate, Version, Workbook,
};
use crate::quota::QuotaKind;
use crate::store::StudyStore;
use crate::student::{check_version, Student};
use crate::synthesizer::Synthesizer;

/// A workbook the current student is allowed to read
#[derive(Debug, Clone)]
pub struct WorkbookAggregate {
    workbook: Workbook,
}

impl WorkbookAggregate {
    pub(crate) fn new(workbook: Workbook) -> Self {
        Self { workbook }
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn into_workbook(self) -> Workbook {
        self.workbook
    }

    pub async fn find_problems<S>(
        &self,
        store: &mut S,
        page: Pagination,
    ) -> DomainResult<Paginated<Problem>>
    where
        S: StudyStore + ?Sized,
    {
        Ok(store.find_problems(self.workbook.id, page).await?)
    }

    pub async fn find_problem_by_id<S>(&self, store: &mut S, id: ProblemId) -> DomainResult<Problem>
    where
        S: StudyStore + ?Sized,
    {
        store
            .find_problem(self.workbook.id, id)
            .await?
            .ok_or(DomainError::ProblemNotFound(id))
    }

    /// Problems of this workbook among `ids`; ids from other workbooks are skipped.
    pub async fn find_problems_by_ids<S>(
        &self,
        store: &mut S,
        ids: &[ProblemId],
    ) -> DomainResult<Vec<Problem>>
    where
        S: StudyStore + ?Sized,
    {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(store.find_problems_by_ids(self.workbook.id, ids).await?)
    }

    /// Add a problem after both quotas of the workbook's problem type pass.
    pub async fn add_problem<S>(
        &self,
        store: &mut S,
        student: &Student,
        synthesizer: &dyn Synthesizer,
        fields: ProblemFields,
    ) -> DomainResult<Problem>
    where
        S: StudyStore + ?Sized,
    {
        let problem_type = self.workbook.problem_type;
        student.ensure_owner(&self.workbook)?;
        student.check_quota(store, problem_type, QuotaKind::Size).await?;
        student.check_quota(store, problem_type, QuotaKind::Update).await?;

        let mut properties = ProblemProperties::from_client(problem_type, fields.properties)?;
        let number = match fields.number {
            Some(n) => validate_number(n)?,
            None => store.next_problem_number(self.workbook.id).await?,
        };

        if self.workbook.audio_enabled {
            let audio = self.audio_for(store, synthesizer, properties.text()).await?;
            properties.set_audio_id(Some(audio.id));
        }

        let problem = store
            .insert_problem(self.workbook.id, &NewProblem { number, properties })
            .await?;

        student.increment_quota_usage(store, problem_type, QuotaKind::Size).await?;
        student.increment_quota_usage(store, problem_type, QuotaKind::Update).await?;

        tracing::info!(
            workbook_id = %self.workbook.id,
            problem_id = %problem.id,
            number = problem.number,
            "problem added"
        );
        Ok(problem)
    }

    pub async fn update_problem<S>(
        &self,
        store: &mut S,
        student: &Student,
        synthesizer: &dyn Synthesizer,
        id: ProblemId,
        version: Version,
        fields: ProblemFields,
    ) -> DomainResult<Problem>
    where
        S: StudyStore + ?Sized,
    {
        let problem_type = self.workbook.problem_type;
        student.ensure_owner(&self.workbook)?;
        student.check_quota(store, problem_type, QuotaKind::Update).await?;

        let current = self.find_problem_by_id(store, id).await?;
        check_version("problem", version, current.version)?;

        let mut properties = ProblemProperties::from_client(problem_type, fields.properties)?;
        let number = match fields.number {
            Some(n) => validate_number(n)?,
            None => current.number,
        };

        if self.workbook.audio_enabled {
            let audio_id = match current.properties.audio_id() {
                Some(existing) if current.properties.text() == properties.text() => existing,
                _ => self.audio_for(store, synthesizer, properties.text()).await?.id,
            };
            properties.set_audio_id(Some(audio_id));
        }

        let problem = store
            .update_problem(self.workbook.id, id, version, &ProblemUpdate { number, properties })
            .await?
            .ok_or(DomainError::VersionConflict {
                resource: "problem",
                expected: version.get(),
                current: current.version.get(),
            })?;

        student.increment_quota_usage(store, problem_type, QuotaKind::Update).await?;

        tracing::info!(problem_id = %id, version = problem.version.get(), "problem updated");
        Ok(problem)
    }

    pub async fn remove_problem<S>(
        &self,
        store: &mut S,
        student: &Student,
        id: ProblemId,
        version: Version,
    ) -> DomainResult<()>
    where
        S: StudyStore + ?Sized,
    {
        student.ensure_owner(&self.workbook)?;
        let current = self.find_problem_by_id(store, id).await?;
        check_version("problem", version, current.version)?;

        if !store.delete_problem(self.workbook.id, id, version).await? {
            return Err(DomainError::VersionConflict {
                resource: "problem",
                expected: version.get(),
                current: current.version.get(),
            });
        }

        student
            .decrement_quota_usage(store, self.workbook.problem_type, QuotaKind::Size, 1)
            .await?;

        tracing::info!(problem_id = %id, "problem removed");
        Ok(())
    }

    /// Audio of a problem; the problem must reference `audio_id`.
    pub async fn find_audio<S>(
        &self,
        store: &mut S,
        problem_id: ProblemId,
        audio_id: AudioId,
    ) -> DomainResult<Audio>
    where
        S: StudyStore + ?Sized,
    {
        let problem = self.find_problem_by_id(store, problem_id).await?;
        if problem.properties.audio_id() != Some(audio_id) {
            return Err(DomainError::AudioNotFound(audio_id));
        }
        store
            .find_audio(audio_id)
            .await?
            .ok_or(DomainError::AudioNotFound(audio_id))
    }

    /// Text a write with `fields` would have to synthesize, if any.
    ///
    /// `None` when audio is off, the clip is already cached, or (for an
    /// update of `current`) the text is unchanged. Run this in a short read
    /// before the write so the remote call happens outside the write's
    /// transaction.
    pub async fn text_needing_audio<S>(
        &self,
        store: &mut S,
        fields: &ProblemFields,
        current: Option<ProblemId>,
    ) -> DomainResult<Option<String>>
    where
        S: StudyStore + ?Sized,
    {
        if !self.workbook.audio_enabled {
            return Ok(None);
        }
        let properties =
            ProblemProperties::from_client(self.workbook.problem_type, fields.properties.clone())?;
        let text = properties.text();

        if let Some(id) = current {
            let existing = self.find_problem_by_id(store, id).await?;
            if existing.properties.audio_id().is_some() && existing.properties.text() == text {
                return Ok(None);
            }
        }
        if store.find_audio_by_text(&self.workbook.lang2, text).await?.is_some() {
            return Ok(None);
        }
        Ok(Some(text.to_owned()))
    }

    async fn audio_for<S>(
        &self,
        store: &mut S,
        synthesizer: &dyn Synthesizer,
        text: &str,
    ) -> DomainResult<Audio>
    where
        S: StudyStore + ?Sized,
    {
        audio::find_or_synthesize(store, synthesizer, &self.workbook.lang2, text).await
    }
}
