use sqlx::PgPool;

use crate::users::repo_types::User;

const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, role, is_active, created_at, updated_at";

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Insert a new user. Relies on the unique constraint on `email` as the
    /// sole safeguard against a duplicate-registration race.
    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        full_name: Option<&str>,
        role: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, full_name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(password_hash)
        .bind(full_name)
        .bind(role)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// True when another row already holds this email.
    pub async fn email_taken_by_other(
        db: &PgPool,
        email: &str,
        user_id: i64,
    ) -> anyhow::Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM users WHERE email = $1 AND id <> $2")
                .bind(email)
                .bind(user_id)
                .fetch_optional(db)
                .await?;
        Ok(row.is_some())
    }

    pub async fn apply_update(
        db: &PgPool,
        id: i64,
        changes: UserChanges,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                full_name = COALESCE($3, full_name),
                password_hash = COALESCE($4, password_hash),
                is_active = COALESCE($5, is_active),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.email)
        .bind(changes.full_name)
        .bind(changes.password_hash)
        .bind(changes.is_active)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

/// Postgres unique-constraint violation (code 23505), used to turn a
/// registration race into a duplicate-email rejection instead of a 500.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| match e {
            sqlx::Error::Database(db) => db.code().map(|c| c == "23505"),
            _ => None,
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::{User, ROLE_USER};
    use sqlx::postgres::PgPoolOptions;
    use time::OffsetDateTime;

    // These run against a live store; they no-op unless DATABASE_URL points
    // at a reachable Postgres.
    async fn test_pool() -> Option<PgPool> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .ok()?;
        sqlx::migrate!("./migrations").run(&pool).await.ok()?;
        Some(pool)
    }

    fn unique_email(tag: &str) -> String {
        format!(
            "{tag}-{}@example.com",
            OffsetDateTime::now_utc().unix_timestamp_nanos()
        )
    }

    #[tokio::test]
    async fn second_insert_with_same_email_is_a_unique_violation() {
        let Some(pool) = test_pool().await else { return };
        let email = unique_email("dup");

        User::create(&pool, &email, "digest", None, ROLE_USER)
            .await
            .expect("first insert");
        let err = User::create(&pool, &email, "other-digest", Some("Other"), ROLE_USER)
            .await
            .expect_err("second insert must hit the unique constraint");
        assert!(is_unique_violation(&err));

        User::delete(
            &pool,
            User::find_by_email(&pool, &email)
                .await
                .expect("lookup")
                .expect("row exists")
                .id,
        )
        .await
        .expect("cleanup");
    }

    #[tokio::test]
    async fn delete_removes_record_for_subsequent_lookup() {
        let Some(pool) = test_pool().await else { return };
        let email = unique_email("del");

        let user = User::create(&pool, &email, "digest", None, ROLE_USER)
            .await
            .expect("insert");
        User::delete(&pool, user.id).await.expect("delete");

        assert!(User::find_by_email(&pool, &email)
            .await
            .expect("lookup")
            .is_none());
    }
}
