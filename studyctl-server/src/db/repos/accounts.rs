//! Organizations, users and access tokens
//!
//! Provisioned from the CLI; the HTTP layer only resolves tokens. Tokens are
//! random 32-byte values handed out once. Only their SHA-256 hex digest is
//! stored.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use studyctl_core::models::{
    validate_login_id, AppUser, AppUserId, OrganizationId, UserRole, ValidationError,
};

/// Account repository error
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("{resource} '{id}' already exists")]
    Duplicate { resource: &'static str, id: String },
}

/// Generate a new opaque bearer token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 digest under which a token is stored.
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

#[derive(Debug, FromRow)]
struct AppUserRow {
    id: Uuid,
    organization_id: Uuid,
    login_id: String,
    role: String,
}

impl TryFrom<AppUserRow> for AppUser {
    type Error = AccountError;

    fn try_from(row: AppUserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: AppUserId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            login_id: row.login_id,
            role: row.role.parse::<UserRole>()?,
        })
    }
}

/// Account repository
pub struct AccountRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an organization, returning the existing id on conflict.
    pub async fn create_organization(&self, name: &str) -> Result<OrganizationId, AccountError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty { field: "organization" }.into());
        }

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO organizations (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(OrganizationId::from_uuid(id))
    }

    pub async fn create_user(
        &self,
        organization_id: OrganizationId,
        login_id: &str,
        role: UserRole,
    ) -> Result<AppUser, AccountError> {
        let login_id = validate_login_id(login_id)?;

        let row: AppUserRow = sqlx::query_as(
            r#"
            INSERT INTO app_users (organization_id, login_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, organization_id, login_id, role
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(&login_id)
        .bind(role.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => AccountError::Duplicate {
                resource: "user",
                id: login_id.clone(),
            },
            _ => AccountError::Sqlx(e),
        })?;

        let user = AppUser::try_from(row)?;
        tracing::info!(user_id = %user.id, login_id = %user.login_id, role = %user.role, "created user");
        Ok(user)
    }

    pub async fn find_user_by_login(
        &self,
        organization: &str,
        login_id: &str,
    ) -> Result<AppUser, AccountError> {
        let row: Option<AppUserRow> = sqlx::query_as(
            r#"
            SELECT u.id, u.organization_id, u.login_id, u.role
            FROM app_users u
            JOIN organizations o ON o.id = u.organization_id
            WHERE o.name = $1 AND u.login_id = $2
            "#,
        )
        .bind(organization)
        .bind(login_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(AppUser::try_from)
            .transpose()?
            .ok_or_else(|| AccountError::NotFound {
                resource: "user",
                id: format!("{}/{}", organization, login_id),
            })
    }

    /// Issue a token for `user`; returns the plain token, which is not stored.
    pub async fn issue_token(
        &self,
        user: AppUserId,
        ttl: Option<Duration>,
    ) -> Result<String, AccountError> {
        let token = generate_token();
        let expires_at: Option<DateTime<Utc>> = ttl.map(|ttl| Utc::now() + ttl);

        sqlx::query(
            "INSERT INTO access_tokens (token_hash, app_user_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(hash_token(&token))
        .bind(user.as_uuid())
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        tracing::info!(user_id = %user, expires_at = ?expires_at, "issued access token");
        Ok(token)
    }

    /// Resolve a bearer token to its user; expired or unknown tokens yield `None`.
    pub async fn find_user_by_token(&self, token: &str) -> Result<Option<AppUser>, AccountError> {
        let row: Option<AppUserRow> = sqlx::query_as(
            r#"
            SELECT u.id, u.organization_id, u.login_id, u.role
            FROM access_tokens t
            JOIN app_users u ON u.id = t.app_user_id
            WHERE t.token_hash = $1
              AND (t.expires_at IS NULL OR t.expires_at > NOW())
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(self.pool)
        .await?;

        row.map(AppUser::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn token_hash_is_hex_sha256() {
        let hash = hash_token("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn unknown_role_fails_conversion() {
        let row = AppUserRow {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            login_id: "alice".into(),
            role: "admin".into(),
        };
        assert!(matches!(
            AppUser::try_from(row),
            Err(AccountError::Validation(_))
        ));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn issued_token_resolves_to_user() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.unwrap();
        crate::db::migrations::run(&pool).await.unwrap();

        let repo = AccountRepo::new(&pool);
        let org = repo.create_organization("token-test-org").await.unwrap();
        let login = format!("user-{}", Uuid::new_v4());
        let user = repo.create_user(org, &login, UserRole::User).await.unwrap();
        let token = repo.issue_token(user.id, None).await.unwrap();

        let found = repo.find_user_by_token(&token).await.unwrap();
        assert_eq!(found, Some(user));
        assert_eq!(repo.find_user_by_token("nope").await.unwrap(), None);
    }
}
