//! Study record repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use studyctl_core::models::{AppUserId, ProblemId, StudyRecord, StudyType, WorkbookId};
use studyctl_core::store::{StoreError, StoreResult, StudyRecordRepo};

use crate::db::{corrupt, store_error, PgStore};

const RESOURCE: &str = "study record";

const COLUMNS: &str = "app_user_id, workbook_id, problem_id, study_type, result_prev1, memorized, \
                       level, answered_count, correct_count, last_answered_at";

#[derive(Debug, Clone, FromRow)]
pub(crate) struct StudyRecordRow {
    pub app_user_id: Uuid,
    pub workbook_id: Uuid,
    pub problem_id: Uuid,
    pub study_type: String,
    pub result_prev1: bool,
    pub memorized: bool,
    pub level: i32,
    pub answered_count: i32,
    pub correct_count: i32,
    pub last_answered_at: DateTime<Utc>,
}

impl TryFrom<StudyRecordRow> for StudyRecord {
    type Error = StoreError;

    fn try_from(row: StudyRecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            app_user_id: AppUserId::from_uuid(row.app_user_id),
            workbook_id: WorkbookId::from_uuid(row.workbook_id),
            problem_id: ProblemId::from_uuid(row.problem_id),
            study_type: row.study_type.parse().map_err(|e| corrupt(RESOURCE, e))?,
            result_prev1: row.result_prev1,
            memorized: row.memorized,
            level: row.level,
            answered_count: row.answered_count,
            correct_count: row.correct_count,
            last_answered_at: row.last_answered_at,
        })
    }
}

#[async_trait]
impl StudyRecordRepo for PgStore {
    async fn find_study_records(
        &mut self,
        user: AppUserId,
        workbook_id: WorkbookId,
        study_type: StudyType,
    ) -> StoreResult<Vec<StudyRecord>> {
        let rows: Vec<StudyRecordRow> = sqlx::query_as(&format!(
            r#"
            SELECT {COLUMNS}
            FROM study_records
            WHERE app_user_id = $1 AND workbook_id = $2 AND study_type = $3
            "#
        ))
        .bind(user.as_uuid())
        .bind(workbook_id.as_uuid())
        .bind(study_type.as_str())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        rows.into_iter().map(StudyRecord::try_from).collect()
    }

    async fn find_study_record(
        &mut self,
        user: AppUserId,
        problem_id: ProblemId,
        study_type: StudyType,
    ) -> StoreResult<Option<StudyRecord>> {
        let row: Option<StudyRecordRow> = sqlx::query_as(&format!(
            r#"
            SELECT {COLUMNS}
            FROM study_records
            WHERE app_user_id = $1 AND problem_id = $2 AND study_type = $3
            "#
        ))
        .bind(user.as_uuid())
        .bind(problem_id.as_uuid())
        .bind(study_type.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        row.map(StudyRecord::try_from).transpose()
    }

    async fn save_study_record(&mut self, record: &StudyRecord) -> StoreResult<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO study_records ({COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (app_user_id, problem_id, study_type) DO UPDATE
            SET result_prev1 = EXCLUDED.result_prev1,
                memorized = EXCLUDED.memorized,
                level = EXCLUDED.level,
                answered_count = EXCLUDED.answered_count,
                correct_count = EXCLUDED.correct_count,
                last_answered_at = EXCLUDED.last_answered_at
            "#
        ))
        .bind(record.app_user_id.as_uuid())
        .bind(record.workbook_id.as_uuid())
        .bind(record.problem_id.as_uuid())
        .bind(record.study_type.as_str())
        .bind(record.result_prev1)
        .bind(record.memorized)
        .bind(record.level)
        .bind(record.answered_count)
        .bind(record.correct_count)
        .bind(record.last_answered_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        Ok(())
    }

    async fn count_memorized(
        &mut self,
        user: AppUserId,
        workbook_id: WorkbookId,
        study_type: StudyType,
    ) -> StoreResult<i64> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM study_records
            WHERE app_user_id = $1 AND workbook_id = $2 AND study_type = $3 AND memorized
            "#,
        )
        .bind(user.as_uuid())
        .bind(workbook_id.as_uuid())
        .bind(study_type.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))
    }
}
