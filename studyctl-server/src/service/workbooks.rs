use studyctl_core::models::{
    AppUser, NewWorkbook, Paginated, Pagination, Version, Workbook, WorkbookId, WorkbookUpdate,
};
use studyctl_core::DomainResult;

use super::ServiceContext;

pub struct WorkbookService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> WorkbookService<'a> {
    pub(crate) fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn list(&self, user: &AppUser, page: Pagination) -> DomainResult<Paginated<Workbook>> {
        let (mut store, student) = self.ctx.begin(user).await?;
        let workbooks = student.find_workbooks_on_private_space(&mut store, page).await?;
        store.commit().await?;
        Ok(workbooks)
    }

    pub async fn get(&self, user: &AppUser, id: WorkbookId) -> DomainResult<Workbook> {
        let (mut store, student) = self.ctx.begin(user).await?;
        let workbook = student.find_workbook_by_id(&mut store, id).await?;
        store.commit().await?;
        Ok(workbook.into_workbook())
    }

    pub async fn create(&self, user: &AppUser, new: NewWorkbook) -> DomainResult<Workbook> {
        let (mut store, student) = self.ctx.begin(user).await?;
        let workbook = student.add_workbook(&mut store, new).await?;
        store.commit().await?;
        Ok(workbook)
    }

    pub async fn update(
        &self,
        user: &AppUser,
        id: WorkbookId,
        version: Version,
        update: WorkbookUpdate,
    ) -> DomainResult<Workbook> {
        let (mut store, student) = self.ctx.begin(user).await?;
        let workbook = student.update_workbook(&mut store, id, version, update).await?;
        store.commit().await?;
        Ok(workbook)
    }

    pub async fn delete(&self, user: &AppUser, id: WorkbookId, version: Version) -> DomainResult<()> {
        let (mut store, student) = self.ctx.begin(user).await?;
        student.remove_workbook(&mut store, id, version).await?;
        store.commit().await?;
        Ok(())
    }
}
