use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{NewUser, PageRequest, User, UserChanges, UserFilter};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The unique index on `email` rejected the write.
    #[error("email already taken")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence port for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// One page of users matching `filter`, newest id first.
    async fn list(&self, filter: &UserFilter, page: PageRequest) -> StoreResult<Vec<User>>;
    async fn count(&self, filter: &UserFilter) -> StoreResult<i64>;
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    /// True when another record (other than `except_id`) already uses `email`.
    async fn email_taken(&self, email: &str, except_id: Option<i64>) -> StoreResult<bool>;
    async fn insert(&self, user: NewUser) -> StoreResult<User>;
    /// Returns false when no row has `id`.
    async fn update(&self, id: i64, changes: UserChanges) -> StoreResult<bool>;
    /// Returns false when no row has `id`.
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

/// Escape LIKE metacharacters so the term is matched literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_err(e: sqlx::Error, what: &'static str) -> StoreError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::DuplicateEmail,
        _ => StoreError::Other(anyhow::Error::new(e).context(what)),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list(&self, filter: &UserFilter, page: PageRequest) -> StoreResult<Vec<User>> {
        let pattern = filter.name_contains.as_deref().map(like_pattern);
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, cpf, phone, created_at, updated_at
              FROM users
             WHERE ($1::text IS NULL OR name ILIKE $1 ESCAPE '\')
             ORDER BY id DESC
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern)
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows)
    }

    async fn count(&self, filter: &UserFilter) -> StoreResult<i64> {
        let pattern = filter.name_contains.as_deref().map(like_pattern);
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
              FROM users
             WHERE ($1::text IS NULL OR name ILIKE $1 ESCAPE '\')
            "#,
        )
        .bind(pattern)
        .fetch_one(&self.db)
        .await
        .context("count users")?;
        Ok(total)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, cpf, phone, created_at, updated_at
              FROM users
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn email_taken(&self, email: &str, except_id: Option<i64>) -> StoreResult<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                 WHERE email = $1
                   AND ($2::bigint IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(except_id)
        .fetch_one(&self.db)
        .await
        .context("check email uniqueness")?;
        Ok(taken)
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, cpf, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, cpf, phone, created_at, updated_at
            "#,
        )
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.cpf)
        .bind(user.phone)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_write_err(e, "insert user"))
    }

    async fn update(&self, id: i64, changes: UserChanges) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
               SET name          = COALESCE($2, name),
                   email         = COALESCE($3, email),
                   password_hash = COALESCE($4, password_hash),
                   cpf           = COALESCE($5, cpf),
                   phone         = COALESCE($6, phone),
                   updated_at    = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.cpf)
        .bind(changes.phone)
        .execute(&self.db)
        .await
        .map_err(|e| map_write_err(e, "update user"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(result.rows_affected() > 0)
    }
}
