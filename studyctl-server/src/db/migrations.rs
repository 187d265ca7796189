//! Schema migrations
//!
//! Every statement is idempotent (`IF NOT EXISTS`), so running them on each
//! start is safe.

use sqlx::PgPool;

const STATEMENTS: &[(&str, &str)] = &[
    (
        "organizations",
        r#"
        CREATE TABLE IF NOT EXISTS organizations (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL UNIQUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "app_users",
        r#"
        CREATE TABLE IF NOT EXISTS app_users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            login_id TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('owner', 'user')),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (organization_id, login_id)
        )
        "#,
    ),
    (
        "access_tokens",
        r#"
        CREATE TABLE IF NOT EXISTS access_tokens (
            token_hash TEXT PRIMARY KEY,
            app_user_id UUID NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            expires_at TIMESTAMPTZ
        )
        "#,
    ),
    (
        "workbooks",
        r#"
        CREATE TABLE IF NOT EXISTS workbooks (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            version INT NOT NULL DEFAULT 1,
            organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            owner_id UUID NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            problem_type TEXT NOT NULL,
            question_text TEXT NOT NULL DEFAULT '',
            lang2 TEXT NOT NULL,
            audio_enabled BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (owner_id, name)
        )
        "#,
    ),
    (
        "workbooks owner index",
        "CREATE INDEX IF NOT EXISTS idx_workbooks_owner ON workbooks (owner_id, created_at DESC)",
    ),
    (
        "problems",
        r#"
        CREATE TABLE IF NOT EXISTS problems (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            version INT NOT NULL DEFAULT 1,
            workbook_id UUID NOT NULL REFERENCES workbooks(id) ON DELETE CASCADE,
            number INT NOT NULL CHECK (number > 0),
            problem_type TEXT NOT NULL,
            properties JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (workbook_id, number)
        )
        "#,
    ),
    (
        "audios",
        r#"
        CREATE TABLE IF NOT EXISTS audios (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            lang2 TEXT NOT NULL,
            text TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (lang2, text)
        )
        "#,
    ),
    (
        "study_records",
        r#"
        CREATE TABLE IF NOT EXISTS study_records (
            app_user_id UUID NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
            workbook_id UUID NOT NULL REFERENCES workbooks(id) ON DELETE CASCADE,
            problem_id UUID NOT NULL REFERENCES problems(id) ON DELETE CASCADE,
            study_type TEXT NOT NULL,
            result_prev1 BOOLEAN NOT NULL,
            memorized BOOLEAN NOT NULL,
            level INT NOT NULL,
            answered_count INT NOT NULL,
            correct_count INT NOT NULL,
            last_answered_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (app_user_id, problem_id, study_type)
        )
        "#,
    ),
    (
        "user_quotas",
        r#"
        CREATE TABLE IF NOT EXISTS user_quotas (
            organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            app_user_id UUID NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            unit TEXT NOT NULL,
            period_date DATE NOT NULL,
            count BIGINT NOT NULL DEFAULT 0 CHECK (count >= 0),
            PRIMARY KEY (app_user_id, name, unit, period_date)
        )
        "#,
    ),
];

/// Run all migrations
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running migrations...");
    for (name, sql) in STATEMENTS {
        tracing::debug!(step = *name, "migrating");
        sqlx::query(sql).execute(pool).await?;
    }
    tracing::info!(steps = STATEMENTS.len(), "Migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_statement_is_idempotent() {
        for (name, sql) in STATEMENTS {
            assert!(sql.contains("IF NOT EXISTS"), "{} is not idempotent", name);
        }
    }

    #[test]
    fn referenced_tables_are_created_first() {
        let position = |table: &str| {
            STATEMENTS
                .iter()
                .position(|(name, _)| *name == table)
                .unwrap()
        };
        assert!(position("organizations") < position("app_users"));
        assert!(position("app_users") < position("workbooks"));
        assert!(position("workbooks") < position("problems"));
        assert!(position("problems") < position("study_records"));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn migrations_run_twice() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.unwrap();
        run(&pool).await.unwrap();
        run(&pool).await.unwrap();
    }
}
