//! Workbook repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Row};
use uuid::Uuid;

use studyctl_core::models::{
    AppUserId, Lang2, NewWorkbook, OrganizationId, Paginated, Pagination, Version, Workbook,
    WorkbookId, WorkbookUpdate,
};
use studyctl_core::store::{StoreError, StoreResult, WorkbookRepo};

use crate::db::{corrupt, store_error, windowed_total, PgStore};

const RESOURCE: &str = "workbook";

const COLUMNS: &str = "id, version, organization_id, owner_id, name, problem_type, \
                       question_text, lang2, audio_enabled, created_at, updated_at";

/// Workbook record from database
#[derive(Debug, Clone, FromRow)]
pub(crate) struct WorkbookRow {
    pub id: Uuid,
    pub version: i32,
    pub organization_id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub problem_type: String,
    pub question_text: String,
    pub lang2: String,
    pub audio_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<WorkbookRow> for Workbook {
    type Error = StoreError;

    fn try_from(row: WorkbookRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: WorkbookId::from_uuid(row.id),
            version: Version::new(row.version).map_err(|e| corrupt(RESOURCE, e))?,
            organization_id: OrganizationId::from_uuid(row.organization_id),
            owner_id: AppUserId::from_uuid(row.owner_id),
            name: row.name,
            problem_type: row.problem_type.parse().map_err(|e| corrupt(RESOURCE, e))?,
            question_text: row.question_text,
            lang2: Lang2::new(&row.lang2).map_err(|e| corrupt(RESOURCE, e))?,
            audio_enabled: row.audio_enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl WorkbookRepo for PgStore {
    async fn find_workbooks_by_owner(
        &mut self,
        owner: AppUserId,
        page: Pagination,
    ) -> StoreResult<Paginated<Workbook>> {
        // Single query with COUNT(*) OVER() for total
        let rows = sqlx::query(&format!(
            r#"
            SELECT {COLUMNS}, COUNT(*) OVER() AS total
            FROM workbooks
            WHERE owner_id = $1
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner.as_uuid())
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        let total = match windowed_total(rows.first().map(|r| r.get::<i64, _>("total")), page) {
            Some(total) => total,
            None => sqlx::query_scalar("SELECT COUNT(*) FROM workbooks WHERE owner_id = $1")
                .bind(owner.as_uuid())
                .fetch_one(&mut *self.tx)
                .await
                .map_err(|e| store_error(RESOURCE, e))?,
        };
        let items = rows
            .iter()
            .map(|r| {
                WorkbookRow::from_row(r)
                    .map_err(|e| store_error(RESOURCE, e))
                    .and_then(Workbook::try_from)
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Paginated::new(items, total, page))
    }

    async fn find_workbook(&mut self, id: WorkbookId) -> StoreResult<Option<Workbook>> {
        let row: Option<WorkbookRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM workbooks WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(|e| store_error(RESOURCE, e))?;

        row.map(Workbook::try_from).transpose()
    }

    async fn insert_workbook(
        &mut self,
        organization_id: OrganizationId,
        owner: AppUserId,
        new: &NewWorkbook,
    ) -> StoreResult<Workbook> {
        let row: WorkbookRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO workbooks
                (organization_id, owner_id, name, problem_type, question_text, lang2, audio_enabled)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(organization_id.as_uuid())
        .bind(owner.as_uuid())
        .bind(new.name.as_str())
        .bind(new.problem_type.as_str())
        .bind(new.question_text.as_str())
        .bind(new.lang2.as_str())
        .bind(new.audio_enabled)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        Workbook::try_from(row)
    }

    async fn update_workbook(
        &mut self,
        id: WorkbookId,
        version: Version,
        update: &WorkbookUpdate,
    ) -> StoreResult<Option<Workbook>> {
        let row: Option<WorkbookRow> = sqlx::query_as(&format!(
            r#"
            UPDATE workbooks
            SET name = $3,
                question_text = $4,
                audio_enabled = $5,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(version.get())
        .bind(update.name.as_str())
        .bind(update.question_text.as_str())
        .bind(update.audio_enabled)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        row.map(Workbook::try_from).transpose()
    }

    async fn delete_workbook(&mut self, id: WorkbookId, version: Version) -> StoreResult<bool> {
        // problems, study records cascade
        let result = sqlx::query("DELETE FROM workbooks WHERE id = $1 AND version = $2")
            .bind(id.as_uuid())
            .bind(version.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| store_error(RESOURCE, e))?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> WorkbookRow {
        WorkbookRow {
            id: Uuid::new_v4(),
            version: 3,
            organization_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Verbs".into(),
            problem_type: "english_word".into(),
            question_text: String::new(),
            lang2: "en".into(),
            audio_enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn row_converts() {
        let wb = Workbook::try_from(row()).unwrap();
        assert_eq!(wb.version.get(), 3);
        assert_eq!(wb.lang2.as_str(), "en");
    }

    #[test]
    fn unknown_problem_type_is_corrupt() {
        let mut bad = row();
        bad.problem_type = "kanji".into();
        assert!(matches!(
            Workbook::try_from(bad),
            Err(StoreError::Corrupt { resource: "workbook", .. })
        ));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn page_past_the_end_reports_real_total() {
        use studyctl_core::models::{Lang2, ProblemType, QuestionText, UserRole, WorkbookName};

        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.unwrap();
        crate::db::migrations::run(&pool).await.unwrap();

        let accounts = crate::db::AccountRepo::new(&pool);
        let org = accounts.create_organization("paging-org").await.unwrap();
        let login = format!("paging-{}", Uuid::new_v4());
        let owner = accounts.create_user(org, &login, UserRole::User).await.unwrap().id;

        let mut store = PgStore::begin(&pool).await.unwrap();
        for name in ["Verbs", "Nouns"] {
            let new = NewWorkbook {
                name: WorkbookName::new(name).unwrap(),
                problem_type: ProblemType::EnglishWord,
                question_text: QuestionText::default(),
                lang2: Lang2::english(),
                audio_enabled: false,
            };
            store.insert_workbook(org, owner, &new).await.unwrap();
        }

        let page = store
            .find_workbooks_by_owner(owner, Pagination::new(5, 10))
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 2);
    }
}
