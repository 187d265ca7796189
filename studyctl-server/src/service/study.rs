use chrono::Utc;
use studyctl_core::models::{
    AppUser, CompletionRate, ProblemId, Recordbook, StudyAnswer, StudyRecord, StudyType,
    WorkbookId,
};
use studyctl_core::DomainResult;

use super::ServiceContext;

pub struct StudyService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> StudyService<'a> {
    pub(crate) fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn recordbook(
        &self,
        user: &AppUser,
        workbook_id: WorkbookId,
        study_type: StudyType,
    ) -> DomainResult<Recordbook> {
        let (mut store, student) = self.ctx.begin(user).await?;
        let recordbook = student
            .find_recordbook(&mut store, workbook_id, study_type)
            .await?;
        store.commit().await?;
        Ok(recordbook)
    }

    pub async fn set_result(
        &self,
        user: &AppUser,
        workbook_id: WorkbookId,
        study_type: StudyType,
        problem_id: ProblemId,
        answer: StudyAnswer,
    ) -> DomainResult<StudyRecord> {
        let (mut store, student) = self.ctx.begin(user).await?;
        let record = student
            .set_study_result(&mut store, workbook_id, problem_id, study_type, answer, Utc::now())
            .await?;
        store.commit().await?;
        Ok(record)
    }

    pub async fn completion_rate(
        &self,
        user: &AppUser,
        workbook_id: WorkbookId,
        study_type: StudyType,
    ) -> DomainResult<CompletionRate> {
        let (mut store, student) = self.ctx.begin(user).await?;
        let rate = student
            .completion_rate(&mut store, workbook_id, study_type)
            .await?;
        store.commit().await?;
        Ok(rate)
    }
}
