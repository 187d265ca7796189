//! Problem repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use studyctl_core::models::{
    NewProblem, Paginated, Pagination, Problem, ProblemId, ProblemProperties, ProblemType,
    ProblemUpdate, Version, WorkbookId,
};
use studyctl_core::store::{ProblemRepo, StoreError, StoreResult};

use crate::db::{corrupt, store_error, windowed_total, PgStore};

const RESOURCE: &str = "problem";

const COLUMNS: &str =
    "id, version, workbook_id, number, problem_type, properties, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub(crate) struct ProblemRow {
    pub id: Uuid,
    pub version: i32,
    pub workbook_id: Uuid,
    pub number: i32,
    pub problem_type: String,
    pub properties: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProblemRow> for Problem {
    type Error = StoreError;

    fn try_from(row: ProblemRow) -> Result<Self, Self::Error> {
        let problem_type: ProblemType =
            row.problem_type.parse().map_err(|e| corrupt(RESOURCE, e))?;
        Ok(Self {
            id: ProblemId::from_uuid(row.id),
            version: Version::new(row.version).map_err(|e| corrupt(RESOURCE, e))?,
            workbook_id: WorkbookId::from_uuid(row.workbook_id),
            number: row.number,
            problem_type,
            properties: ProblemProperties::from_stored(problem_type, row.properties)
                .map_err(|e| corrupt(RESOURCE, e))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_problems(rows: Vec<ProblemRow>) -> StoreResult<Vec<Problem>> {
    rows.into_iter().map(Problem::try_from).collect()
}

#[async_trait]
impl ProblemRepo for PgStore {
    async fn find_problems(
        &mut self,
        workbook_id: WorkbookId,
        page: Pagination,
    ) -> StoreResult<Paginated<Problem>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {COLUMNS}, COUNT(*) OVER() AS total
            FROM problems
            WHERE workbook_id = $1
            ORDER BY number
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(workbook_id.as_uuid())
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        let total = match windowed_total(rows.first().map(|r| r.get::<i64, _>("total")), page) {
            Some(total) => total,
            None => self.count_problems(workbook_id).await?,
        };
        let items = rows
            .iter()
            .map(|r| {
                ProblemRow::from_row(r)
                    .map_err(|e| store_error(RESOURCE, e))
                    .and_then(Problem::try_from)
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Paginated::new(items, total, page))
    }

    async fn find_all_problems(&mut self, workbook_id: WorkbookId) -> StoreResult<Vec<Problem>> {
        let rows: Vec<ProblemRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM problems WHERE workbook_id = $1 ORDER BY number"
        ))
        .bind(workbook_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        into_problems(rows)
    }

    async fn find_problem(
        &mut self,
        workbook_id: WorkbookId,
        id: ProblemId,
    ) -> StoreResult<Option<Problem>> {
        let row: Option<ProblemRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM problems WHERE workbook_id = $1 AND id = $2"
        ))
        .bind(workbook_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        row.map(Problem::try_from).transpose()
    }

    async fn find_problems_by_ids(
        &mut self,
        workbook_id: WorkbookId,
        ids: &[ProblemId],
    ) -> StoreResult<Vec<Problem>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();
        let rows: Vec<ProblemRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM problems WHERE workbook_id = $1 AND id = ANY($2) ORDER BY number"
        ))
        .bind(workbook_id.as_uuid())
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        into_problems(rows)
    }

    async fn count_problems(&mut self, workbook_id: WorkbookId) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM problems WHERE workbook_id = $1")
            .bind(workbook_id.as_uuid())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| store_error(RESOURCE, e))
    }

    async fn next_problem_number(&mut self, workbook_id: WorkbookId) -> StoreResult<i32> {
        sqlx::query_scalar("SELECT COALESCE(MAX(number), 0) + 1 FROM problems WHERE workbook_id = $1")
            .bind(workbook_id.as_uuid())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| store_error(RESOURCE, e))
    }

    async fn insert_problem(
        &mut self,
        workbook_id: WorkbookId,
        new: &NewProblem,
    ) -> StoreResult<Problem> {
        let row: ProblemRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO problems (workbook_id, number, problem_type, properties)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(workbook_id.as_uuid())
        .bind(new.number)
        .bind(new.properties.problem_type().as_str())
        .bind(new.properties.to_json())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        Problem::try_from(row)
    }

    async fn update_problem(
        &mut self,
        workbook_id: WorkbookId,
        id: ProblemId,
        version: Version,
        update: &ProblemUpdate,
    ) -> StoreResult<Option<Problem>> {
        let row: Option<ProblemRow> = sqlx::query_as(&format!(
            r#"
            UPDATE problems
            SET number = $4,
                properties = $5,
                version = version + 1,
                updated_at = NOW()
            WHERE workbook_id = $1 AND id = $2 AND version = $3
            RETURNING {COLUMNS}
            "#
        ))
        .bind(workbook_id.as_uuid())
        .bind(id.as_uuid())
        .bind(version.get())
        .bind(update.number)
        .bind(update.properties.to_json())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        row.map(Problem::try_from).transpose()
    }

    async fn delete_problem(
        &mut self,
        workbook_id: WorkbookId,
        id: ProblemId,
        version: Version,
    ) -> StoreResult<bool> {
        let result =
            sqlx::query("DELETE FROM problems WHERE workbook_id = $1 AND id = $2 AND version = $3")
                .bind(workbook_id.as_uuid())
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
    use serde_json::json;

    fn row(properties: JsonValue) -> ProblemRow {
        ProblemRow {
            id: Uuid::new_v4(),
            version: 1,
            workbook_id: Uuid::new_v4(),
            number: 4,
            problem_type: "english_word".into(),
            properties,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn stored_properties_keep_audio_id() {
        let audio_id = Uuid::new_v4();
        let problem = Problem::try_from(row(json!({
            "text": "apple",
            "translated": "ringo",
            "audio_id": audio_id,
        })))
        .unwrap();
        assert_eq!(problem.properties.text(), "apple");
        assert_eq!(problem.properties.audio_id().map(|a| a.as_uuid()), Some(audio_id));
    }

    #[test]
    fn invalid_properties_are_corrupt() {
        let err = Problem::try_from(row(json!({"translated": "ringo"}))).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { resource: "problem", .. }));
    }
}
