use studyctl_core::models::AppUser;
use studyctl_core::quota::QuotaUsage;
use studyctl_core::DomainResult;

use super::ServiceContext;

pub struct QuotaService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> QuotaService<'a> {
    pub(crate) fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Current usage of every quota for the caller.
    pub async fn usages(&self, user: &AppUser) -> DomainResult<Vec<QuotaUsage>> {
        let (mut store, student) = self.ctx.begin(user).await?;
        let usages = student.find_quota_usages(&mut store).await?;
        store.commit().await?;
        Ok(usages)
    }
}
