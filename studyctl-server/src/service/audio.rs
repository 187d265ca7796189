use studyctl_core::models::{AppUser, Audio, AudioId, ProblemId, WorkbookId};
use studyctl_core::DomainResult;

use super::ServiceContext;

pub struct AudioService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AudioService<'a> {
    pub(crate) fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Audio attached to a problem the caller may read.
    pub async fn get(
        &self,
        user: &AppUser,
        workbook_id: WorkbookId,
        problem_id: ProblemId,
        audio_id: AudioId,
    ) -> DomainResult<Audio> {
        let (mut store, student) = self.ctx.begin(user).await?;
        let workbook = student.find_workbook_by_id(&mut store, workbook_id).await?;
        let audio = workbook.find_audio(&mut store, problem_id, audio_id).await?;
        store.commit().await?;
        Ok(audio)
    }
}
