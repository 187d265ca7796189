//! In-memory [`StudyStore`]
//!
//! Mirrors the uniqueness rules and cascades of the Postgres schema closely
//! enough to exercise the aggregates without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{
    AppUserId, Audio, AudioId, Lang2, NewProblem, NewWorkbook, OrganizationId, Paginated,
    Pagination, Problem, ProblemId, ProblemUpdate, StudyRecord, StudyType, Version, Workbook,
    WorkbookId, WorkbookUpdate,
};
use crate::quota::{self, QuotaName, QuotaPeriod};
use crate::store::{
    AudioRepo, ProblemRepo, QuotaRepo, StoreError, StoreResult, StudyRecordRepo, WorkbookRepo,
};

type QuotaKey = (AppUserId, QuotaName, QuotaPeriod);
type RecordKey = (AppUserId, ProblemId, StudyType);

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    workbooks: Vec<Workbook>,
    problems: Vec<Problem>,
    records: HashMap<RecordKey, StudyRecord>,
    quotas: HashMap<QuotaKey, i64>,
    audios: Vec<Audio>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored audio clips.
    pub fn audio_count(&self) -> usize {
        self.audios.len()
    }
}

#[async_trait]
impl WorkbookRepo for MemoryStore {
    async fn find_workbooks_by_owner(
        &mut self,
        owner: AppUserId,
        page: Pagination,
    ) -> StoreResult<Paginated<Workbook>> {
        let mut owned: Vec<Workbook> = self
            .workbooks
            .iter()
            .filter(|wb| wb.owner_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Paginated::from_full(owned, page))
    }

    async fn find_workbook(&mut self, id: WorkbookId) -> StoreResult<Option<Workbook>> {
        Ok(self.workbooks.iter().find(|wb| wb.id == id).cloned())
    }

    async fn insert_workbook(
        &mut self,
        organization_id: OrganizationId,
        owner: AppUserId,
        new: &NewWorkbook,
    ) -> StoreResult<Workbook> {
        if self
            .workbooks
            .iter()
            .any(|wb| wb.owner_id == owner && wb.name == new.name.as_str())
        {
            return Err(StoreError::Duplicate {
                resource: "workbook",
                detail: format!("name '{}' already used", new.name.as_str()),
            });
        }
        let now = Utc::now();
        let workbook = Workbook {
            id: WorkbookId::new(),
            version: Version::INITIAL,
            organization_id,
            owner_id: owner,
            name: new.name.as_str().to_owned(),
            problem_type: new.problem_type,
            question_text: new.question_text.as_str().to_owned(),
            lang2: new.lang2.clone(),
            audio_enabled: new.audio_enabled,
            created_at: now,
            updated_at: now,
        };
        self.workbooks.push(workbook.clone());
        Ok(workbook)
    }

    async fn update_workbook(
        &mut self,
        id: WorkbookId,
        version: Version,
        update: &WorkbookUpdate,
    ) -> StoreResult<Option<Workbook>> {
        let Some(owner) = self
            .workbooks
            .iter()
            .find(|wb| wb.id == id && wb.version == version)
            .map(|wb| wb.owner_id)
        else {
            return Ok(None);
        };
        if self
            .workbooks
            .iter()
            .any(|wb| wb.id != id && wb.owner_id == owner && wb.name == update.name.as_str())
        {
            return Err(StoreError::Duplicate {
                resource: "workbook",
                detail: format!("name '{}' already used", update.name.as_str()),
            });
        }
        let Some(wb) = self.workbooks.iter_mut().find(|wb| wb.id == id) else {
            return Ok(None);
        };
        wb.name = update.name.as_str().to_owned();
        wb.question_text = update.question_text.as_str().to_owned();
        wb.audio_enabled = update.audio_enabled;
        wb.version = wb.version.next();
        wb.updated_at = Utc::now();
        Ok(Some(wb.clone()))
    }

    async fn delete_workbook(&mut self, id: WorkbookId, version: Version) -> StoreResult<bool> {
        let before = self.workbooks.len();
        self.workbooks
            .retain(|wb| !(wb.id == id && wb.version == version));
        if self.workbooks.len() == before {
            return Ok(false);
        }
        self.problems.retain(|p| p.workbook_id != id);
        self.records.retain(|_, r| r.workbook_id != id);
        Ok(true)
    }
}

#[async_trait]
impl ProblemRepo for MemoryStore {
    async fn find_problems(
        &mut self,
        workbook_id: WorkbookId,
        page: Pagination,
    ) -> StoreResult<Paginated<Problem>> {
        let all = self.find_all_problems(workbook_id).await?;
        Ok(Paginated::from_full(all, page))
    }

    async fn find_all_problems(&mut self, workbook_id: WorkbookId) -> StoreResult<Vec<Problem>> {
        let mut problems: Vec<Problem> = self
            .problems
            .iter()
            .filter(|p| p.workbook_id == workbook_id)
            .cloned()
            .collect();
        problems.sort_by_key(|p| p.number);
        Ok(problems)
    }

    async fn find_problem(
        &mut self,
        workbook_id: WorkbookId,
        id: ProblemId,
    ) -> StoreResult<Option<Problem>> {
        Ok(self
            .problems
            .iter()
            .find(|p| p.workbook_id == workbook_id && p.id == id)
            .cloned())
    }

    async fn find_problems_by_ids(
        &mut self,
        workbook_id: WorkbookId,
        ids: &[ProblemId],
    ) -> StoreResult<Vec<Problem>> {
        let mut problems: Vec<Problem> = self
            .problems
            .iter()
            .filter(|p| p.workbook_id == workbook_id && ids.contains(&p.id))
            .cloned()
            .collect();
        problems.sort_by_key(|p| p.number);
        Ok(problems)
    }

    async fn count_problems(&mut self, workbook_id: WorkbookId) -> StoreResult<i64> {
        Ok(self
            .problems
            .iter()
            .filter(|p| p.workbook_id == workbook_id)
            .count() as i64)
    }

    async fn next_problem_number(&mut self, workbook_id: WorkbookId) -> StoreResult<i32> {
        Ok(self
            .problems
            .iter()
            .filter(|p| p.workbook_id == workbook_id)
            .map(|p| p.number)
            .max()
            .unwrap_or(0)
            + 1)
    }

    async fn insert_problem(
        &mut self,
        workbook_id: WorkbookId,
        new: &NewProblem,
    ) -> StoreResult<Problem> {
        self.ensure_number_free(workbook_id, None, new.number)?;
        let now = Utc::now();
        let problem = Problem {
            id: ProblemId::new(),
            version: Version::INITIAL,
            workbook_id,
            number: new.number,
            problem_type: new.properties.problem_type(),
            properties: new.properties.clone(),
            created_at: now,
            updated_at: now,
        };
        self.problems.push(problem.clone());
        Ok(problem)
    }

    async fn update_problem(
        &mut self,
        workbook_id: WorkbookId,
        id: ProblemId,
        version: Version,
        update: &ProblemUpdate,
    ) -> StoreResult<Option<Problem>> {
        if !self
            .problems
            .iter()
            .any(|p| p.workbook_id == workbook_id && p.id == id && p.version == version)
        {
            return Ok(None);
        }
        self.ensure_number_free(workbook_id, Some(id), update.number)?;
        let Some(problem) = self.problems.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        problem.number = update.number;
        problem.properties = update.properties.clone();
        problem.version = problem.version.next();
        problem.updated_at = Utc::now();
        Ok(Some(problem.clone()))
    }

    async fn delete_problem(
        &mut self,
        workbook_id: WorkbookId,
        id: ProblemId,
        version: Version,
    ) -> StoreResult<bool> {
        let before = self.problems.len();
        self.problems
            .retain(|p| !(p.workbook_id == workbook_id && p.id == id && p.version == version));
        if self.problems.len() == before {
            return Ok(false);
        }
        self.records.retain(|_, r| r.problem_id != id);
        Ok(true)
    }
}

impl MemoryStore {
    fn ensure_number_free(
        &self,
        workbook_id: WorkbookId,
        except: Option<ProblemId>,
        number: i32,
    ) -> StoreResult<()> {
        let taken = self.problems.iter().any(|p| {
            p.workbook_id == workbook_id && p.number == number && Some(p.id) != except
        });
        if taken {
            return Err(StoreError::Duplicate {
                resource: "problem",
                detail: format!("number {} already used", number),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StudyRecordRepo for MemoryStore {
    async fn find_study_records(
        &mut self,
        user: AppUserId,
        workbook_id: WorkbookId,
        study_type: StudyType,
    ) -> StoreResult<Vec<StudyRecord>> {
        Ok(self
            .records
            .values()
            .filter(|r| {
                r.app_user_id == user && r.workbook_id == workbook_id && r.study_type == study_type
            })
            .cloned()
            .collect())
    }

    async fn find_study_record(
        &mut self,
        user: AppUserId,
        problem_id: ProblemId,
        study_type: StudyType,
    ) -> StoreResult<Option<StudyRecord>> {
        Ok(self.records.get(&(user, problem_id, study_type)).cloned())
    }

    async fn save_study_record(&mut self, record: &StudyRecord) -> StoreResult<()> {
        self.records.insert(
            (record.app_user_id, record.problem_id, record.study_type),
            record.clone(),
        );
        Ok(())
    }

    async fn count_memorized(
        &mut self,
        user: AppUserId,
        workbook_id: WorkbookId,
        study_type: StudyType,
    ) -> StoreResult<i64> {
        Ok(self
            .records
            .values()
            .filter(|r| {
                r.app_user_id == user
                    && r.workbook_id == workbook_id
                    && r.study_type == study_type
                    && r.memorized
            })
            .count() as i64)
    }
}

#[async_trait]
impl QuotaRepo for MemoryStore {
    async fn quota_usage(
        &mut self,
        user: AppUserId,
        name: QuotaName,
        period: QuotaPeriod,
    ) -> StoreResult<i64> {
        Ok(self.quotas.get(&(user, name, period)).copied().unwrap_or(0))
    }

    async fn add_quota_usage(
        &mut self,
        _organization_id: OrganizationId,
        user: AppUserId,
        name: QuotaName,
        period: QuotaPeriod,
        delta: i64,
    ) -> StoreResult<i64> {
        let counter = self.quotas.entry((user, name, period)).or_insert(0);
        *counter = quota::apply_delta(*counter, delta);
        Ok(*counter)
    }

    async fn try_add_quota_usage(
        &mut self,
        _organization_id: OrganizationId,
        user: AppUserId,
        name: QuotaName,
        period: QuotaPeriod,
        amount: i64,
        limit: i64,
    ) -> StoreResult<Option<i64>> {
        let counter = self.quotas.entry((user, name, period)).or_insert(0);
        if counter.saturating_add(amount) > limit {
            return Ok(None);
        }
        *counter = quota::apply_delta(*counter, amount);
        Ok(Some(*counter))
    }
}

#[async_trait]
impl AudioRepo for MemoryStore {
    async fn find_audio(&mut self, id: AudioId) -> StoreResult<Option<Audio>> {
        Ok(self.audios.iter().find(|a| a.id == id).cloned())
    }

    async fn find_audio_by_text(&mut self, lang2: &Lang2, text: &str) -> StoreResult<Option<Audio>> {
        Ok(self
            .audios
            .iter()
            .find(|a| &a.lang2 == lang2 && a.text == text)
            .cloned())
    }

    async fn insert_audio(&mut self, lang2: &Lang2, text: &str, content: &str) -> StoreResult<Audio> {
        if let Some(existing) = self.find_audio_by_text(lang2, text).await? {
            return Ok(existing);
        }
        let audio = Audio {
            id: AudioId::new(),
            lang2: lang2.clone(),
            text: text.to_owned(),
            content: content.to_owned(),
        };
        self.audios.push(audio.clone());
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProblemType, QuestionText, WorkbookName};

    fn new_workbook(name: &str) -> NewWorkbook {
        NewWorkbook {
            name: WorkbookName::new(name).unwrap(),
            problem_type: ProblemType::EnglishWord,
            question_text: QuestionText::default(),
            lang2: Lang2::english(),
            audio_enabled: false,
        }
    }

    #[tokio::test]
    async fn workbook_name_unique_per_owner() {
        let mut store = MemoryStore::new();
        let org = OrganizationId::new();
        let alice = AppUserId::new();
        let bob = AppUserId::new();

        store.insert_workbook(org, alice, &new_workbook("Verbs")).await.unwrap();
        store.insert_workbook(org, bob, &new_workbook("Verbs")).await.unwrap();
        let err = store
            .insert_workbook(org, alice, &new_workbook("Verbs"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { resource: "workbook", .. }));
    }

    #[tokio::test]
    async fn stale_version_does_not_update() {
        let mut store = MemoryStore::new();
        let wb = store
            .insert_workbook(OrganizationId::new(), AppUserId::new(), &new_workbook("Nouns"))
            .await
            .unwrap();
        let update = WorkbookUpdate {
            name: WorkbookName::new("Nouns 2").unwrap(),
            question_text: QuestionText::default(),
            audio_enabled: true,
        };
        let stale = Version::new(7).unwrap();
        assert!(store.update_workbook(wb.id, stale, &update).await.unwrap().is_none());

        let updated = store
            .update_workbook(wb.id, wb.version, &update)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.version.get(), 2);
        assert!(updated.audio_enabled);
    }

    #[tokio::test]
    async fn quota_counter_clamps_at_zero() {
        let mut store = MemoryStore::new();
        let user = AppUserId::new();
        let name = QuotaName::size(ProblemType::EnglishWord);
        let org = OrganizationId::new();

        store
            .add_quota_usage(org, user, name, QuotaPeriod::Persistent, 2)
            .await
            .unwrap();
        let value = store
            .add_quota_usage(org, user, name, QuotaPeriod::Persistent, -5)
            .await
            .unwrap();
        assert_eq!(value, 0);
    }

    #[tokio::test]
    async fn bounded_increment_stops_at_limit() {
        let mut store = MemoryStore::new();
        let user = AppUserId::new();
        let name = QuotaName::size(ProblemType::EnglishWord);
        let org = OrganizationId::new();
        let period = QuotaPeriod::Persistent;

        assert_eq!(
            store.try_add_quota_usage(org, user, name, period, 1, 2).await.unwrap(),
            Some(1)
        );
        assert_eq!(
            store.try_add_quota_usage(org, user, name, period, 1, 2).await.unwrap(),
            Some(2)
        );
        assert_eq!(store.try_add_quota_usage(org, user, name, period, 1, 2).await.unwrap(), None);
        assert_eq!(store.quota_usage(user, name, period).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn inserting_cached_text_returns_stored_clip() {
        let mut store = MemoryStore::new();
        let lang2 = Lang2::english();
        let first = store.insert_audio(&lang2, "apple", "AAAA").await.unwrap();
        let second = store.insert_audio(&lang2, "apple", "BBBB").await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.content, "AAAA");
        assert_eq!(store.audio_count(), 1);
    }
}
