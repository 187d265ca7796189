//! Quota counters
//!
//! Persistent counters live in a single row per (user, name) whose
//! `period_date` is the Unix epoch; daily counters get one row per UTC date.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use studyctl_core::models::{AppUserId, OrganizationId};
use studyctl_core::quota::{QuotaName, QuotaPeriod};
use studyctl_core::store::{QuotaRepo, StoreResult};

use crate::db::{store_error, PgStore};

const RESOURCE: &str = "quota";

fn period_date(period: QuotaPeriod) -> NaiveDate {
    match period {
        QuotaPeriod::Persistent => DateTime::<Utc>::UNIX_EPOCH.date_naive(),
        QuotaPeriod::Day(date) => date,
    }
}

#[async_trait]
impl QuotaRepo for PgStore {
    async fn quota_usage(
        &mut self,
        user: AppUserId,
        name: QuotaName,
        period: QuotaPeriod,
    ) -> StoreResult<i64> {
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT count FROM user_quotas
            WHERE app_user_id = $1 AND name = $2 AND unit = $3 AND period_date = $4
            "#,
        )
        .bind(user.as_uuid())
        .bind(name.to_string())
        .bind(period.unit().as_str())
        .bind(period_date(period))
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        Ok(count.unwrap_or(0))
    }

    async fn add_quota_usage(
        &mut self,
        organization_id: OrganizationId,
        user: AppUserId,
        name: QuotaName,
        period: QuotaPeriod,
        delta: i64,
    ) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO user_quotas (organization_id, app_user_id, name, unit, period_date, count)
            VALUES ($1, $2, $3, $4, $5, GREATEST($6, 0))
            ON CONFLICT (app_user_id, name, unit, period_date) DO UPDATE
            SET count = GREATEST(user_quotas.count + $6, 0)
            RETURNING count
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(user.as_uuid())
        .bind(name.to_string())
        .bind(period.unit().as_str())
        .bind(period_date(period))
        .bind(delta)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        Ok(count)
    }

    async fn try_add_quota_usage(
        &mut self,
        organization_id: OrganizationId,
        user: AppUserId,
        name: QuotaName,
        period: QuotaPeriod,
        amount: i64,
        limit: i64,
    ) -> StoreResult<Option<i64>> {
        // The conflict update takes the row lock and re-reads the committed
        // count before its WHERE, so racing writers serialize here.
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO user_quotas (organization_id, app_user_id, name, unit, period_date, count)
            SELECT $1, $2, $3, $4, $5, $6
            WHERE $6 <= $7
            ON CONFLICT (app_user_id, name, unit, period_date) DO UPDATE
            SET count = user_quotas.count + EXCLUDED.count
            WHERE user_quotas.count + EXCLUDED.count <= $7
            RETURNING count
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(user.as_uuid())
        .bind(name.to_string())
        .bind(period.unit().as_str())
        .bind(period_date(period))
        .bind(amount)
        .bind(limit)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistent_counters_share_the_epoch_bucket() {
        assert_eq!(
            period_date(QuotaPeriod::Persistent),
            NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
        );
    }

    #[test]
    fn daily_counters_use_their_date() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        assert_eq!(period_date(QuotaPeriod::Day(day)), day);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn concurrent_increments_never_pass_the_limit() {
        use studyctl_core::models::{ProblemType, UserRole};

        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.unwrap();
        crate::db::migrations::run(&pool).await.unwrap();

        let accounts = crate::db::AccountRepo::new(&pool);
        let org = accounts.create_organization("quota-race-org").await.unwrap();
        let login = format!("quota-{}", uuid::Uuid::new_v4());
        let user_id = accounts.create_user(org, &login, UserRole::User).await.unwrap().id;
        let name = QuotaName::size(ProblemType::EnglishWord);
        let period = QuotaPeriod::Persistent;

        let mut first = PgStore::begin(&pool).await.unwrap();
        let taken = first
            .try_add_quota_usage(org, user_id, name, period, 1, 1)
            .await
            .unwrap();
        assert_eq!(taken, Some(1));

        // Blocks on the first transaction's row until it commits.
        let racing_pool = pool.clone();
        let second = tokio::spawn(async move {
            let mut store = PgStore::begin(&racing_pool).await.unwrap();
            let taken = store
                .try_add_quota_usage(org, user_id, name, period, 1, 1)
                .await
                .unwrap();
            store.commit().await.unwrap();
            taken
        });
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        first.commit().await.unwrap();

        assert_eq!(second.await.unwrap(), None);

        let mut check = PgStore::begin(&pool).await.unwrap();
        assert_eq!(check.quota_usage(user_id, name, period).await.unwrap(), 1);
    }
}
