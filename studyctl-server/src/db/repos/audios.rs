//! Audio cache repository

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use studyctl_core::models::{Audio, AudioId, Lang2};
use studyctl_core::store::{AudioRepo, StoreError, StoreResult};

use crate::db::{corrupt, store_error, PgStore};

const RESOURCE: &str = "audio";

#[derive(Debug, Clone, FromRow)]
pub(crate) struct AudioRow {
    pub id: Uuid,
    pub lang2: String,
    pub text: String,
    pub content: String,
}

impl TryFrom<AudioRow> for Audio {
    type Error = StoreError;

    fn try_from(row: AudioRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: AudioId::from_uuid(row.id),
            lang2: Lang2::new(&row.lang2).map_err(|e| corrupt(RESOURCE, e))?,
            text: row.text,
            content: row.content,
        })
    }
}

#[async_trait]
impl AudioRepo for PgStore {
    async fn find_audio(&mut self, id: AudioId) -> StoreResult<Option<Audio>> {
        let row: Option<AudioRow> =
            sqlx::query_as("SELECT id, lang2, text, content FROM audios WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(|e| store_error(RESOURCE, e))?;

        row.map(Audio::try_from).transpose()
    }

    async fn find_audio_by_text(&mut self, lang2: &Lang2, text: &str) -> StoreResult<Option<Audio>> {
        let row: Option<AudioRow> = sqlx::query_as(
            "SELECT id, lang2, text, content FROM audios WHERE lang2 = $1 AND text = $2",
        )
        .bind(lang2.as_str())
        .bind(text)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        row.map(Audio::try_from).transpose()
    }

    async fn insert_audio(&mut self, lang2: &Lang2, text: &str, content: &str) -> StoreResult<Audio> {
        let row: AudioRow = sqlx::query_as(
            r#"
            INSERT INTO audios (lang2, text, content)
            VALUES ($1, $2, $3)
            ON CONFLICT (lang2, text) DO UPDATE SET lang2 = EXCLUDED.lang2
            RETURNING id, lang2, text, content
            "#,
        )
        .bind(lang2.as_str())
        .bind(text)
        .bind(content)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| store_error(RESOURCE, e))?;

        Audio::try_from(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_lang2_is_corrupt() {
        let row = AudioRow {
            id: Uuid::new_v4(),
            lang2: "english".into(),
            text: "apple".into(),
            content: "AAAA".into(),
        };
        assert!(matches!(Audio::try_from(row), Err(StoreError::Corrupt { .. })));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn racing_inserts_share_one_clip() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.unwrap();
        crate::db::migrations::run(&pool).await.unwrap();

        let lang2 = Lang2::english();
        let text = format!("race {}", Uuid::new_v4());

        let mut first = PgStore::begin(&pool).await.unwrap();
        let mut second = PgStore::begin(&pool).await.unwrap();
        assert!(first.find_audio_by_text(&lang2, &text).await.unwrap().is_none());
        assert!(second.find_audio_by_text(&lang2, &text).await.unwrap().is_none());

        let stored = first.insert_audio(&lang2, &text, "AAAA").await.unwrap();
        first.commit().await.unwrap();

        let reused = second.insert_audio(&lang2, &text, "BBBB").await.unwrap();
        second.commit().await.unwrap();

        assert_eq!(reused.id, stored.id);
        assert_eq!(reused.content, "AAAA");
    }
}
