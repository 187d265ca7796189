use studyctl_core::audio::Presynthesized;
use studyctl_core::models::{
    AppUser, Paginated, Pagination, Problem, ProblemFields, ProblemId, Version, WorkbookId,
};
use studyctl_core::DomainResult;

use super::ServiceContext;

pub struct ProblemService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ProblemService<'a> {
    pub(crate) fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn list(
        &self,
        user: &AppUser,
        workbook_id: WorkbookId,
        page: Pagination,
    ) -> DomainResult<Paginated<Problem>> {
        let (mut store, student) = self.ctx.begin(user).await?;
        let workbook = student.find_workbook_by_id(&mut store, workbook_id).await?;
        let problems = workbook.find_problems(&mut store, page).await?;
        store.commit().await?;
        Ok(problems)
    }

    pub async fn get(
        &self,
        user: &AppUser,
        workbook_id: WorkbookId,
        id: ProblemId,
    ) -> DomainResult<Problem> {
        let (mut store, student) = self.ctx.begin(user).await?;
        let workbook = student.find_workbook_by_id(&mut store, workbook_id).await?;
        let problem = workbook.find_problem_by_id(&mut store, id).await?;
        store.commit().await?;
        Ok(problem)
    }

    pub async fn get_by_ids(
        &self,
        user: &AppUser,
        workbook_id: WorkbookId,
        ids: &[ProblemId],
    ) -> DomainResult<Vec<Problem>> {
        let (mut store, student) = self.ctx.begin(user).await?;
        let workbook = student.find_workbook_by_id(&mut store, workbook_id).await?;
        let problems = workbook.find_problems_by_ids(&mut store, ids).await?;
        store.commit().await?;
        Ok(problems)
    }

    pub async fn create(
        &self,
        user: &AppUser,
        workbook_id: WorkbookId,
        fields: ProblemFields,
    ) -> DomainResult<Problem> {
        let audio = self.presynthesize(user, workbook_id, &fields, None).await?;
        let (mut store, student) = self.ctx.begin(user).await?;
        let workbook = student.find_workbook_by_id(&mut store, workbook_id).await?;
        let problem = workbook
            .add_problem(&mut store, &student, &audio, fields)
            .await?;
        store.commit().await?;
        Ok(problem)
    }

    pub async fn update(
        &self,
        user: &AppUser,
        workbook_id: WorkbookId,
        id: ProblemId,
        version: Version,
        fields: ProblemFields,
    ) -> DomainResult<Problem> {
        let audio = self.presynthesize(user, workbook_id, &fields, Some(id)).await?;
        let (mut store, student) = self.ctx.begin(user).await?;
        let workbook = student.find_workbook_by_id(&mut store, workbook_id).await?;
        let problem = workbook
            .update_problem(&mut store, &student, &audio, id, version, fields)
            .await?;
        store.commit().await?;
        Ok(problem)
    }

    pub async fn delete(
        &self,
        user: &AppUser,
        workbook_id: WorkbookId,
        id: ProblemId,
        version: Version,
    ) -> DomainResult<()> {
        let (mut store, student) = self.ctx.begin(user).await?;
        let workbook = student.find_workbook_by_id(&mut store, workbook_id).await?;
        workbook.remove_problem(&mut store, &student, id, version).await?;
        store.commit().await?;
        Ok(())
    }

    /// Synthesize any audio the write will need before its transaction opens,
    /// so slow speech requests do not hold a pooled connection.
    async fn presynthesize(
        &self,
        user: &AppUser,
        workbook_id: WorkbookId,
        fields: &ProblemFields,
        current: Option<ProblemId>,
    ) -> DomainResult<Presynthesized<'a>> {
        let (mut store, student) = self.ctx.begin(user).await?;
        let workbook = student.find_workbook_by_id(&mut store, workbook_id).await?;
        let pending = workbook.text_needing_audio(&mut store, fields, current).await?;
        store.commit().await?;

        let ctx: &'a ServiceContext = self.ctx;
        let mut audio = Presynthesized::new(ctx.synthesizer());
        if let Some(text) = pending {
            audio.prepare(&workbook.workbook().lang2, &text).await?;
            tracing::debug!(workbook_id = %workbook_id, "audio prepared before write");
        }
        Ok(audio)
    }
}
