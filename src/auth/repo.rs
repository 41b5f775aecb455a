use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User, UserType};

const USER_COLUMNS: &str = "id, email, username, name, password_hash, role, user_type, \
     active, is_approved, country, currency, education, created_at";

/// Raised by `UserRepository::create` when a unique column is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DuplicateKey {
    #[error("email already registered")]
    Email,
    #[error("username already taken")]
    Username,
}

/// Persistence of user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Fails with a [`DuplicateKey`] inside the `anyhow::Error` on unique violations.
    async fn create(&self, new_user: NewUser) -> anyhow::Result<User>;
    async fn list_pending_instructors(&self) -> anyhow::Result<Vec<User>>;
    async fn approve(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, column: &str, value: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }
}

fn duplicate_key(err: &sqlx::Error) -> Option<DuplicateKey> {
    let db_err = err.as_database_error()?;
    if !db_err.is_unique_violation() {
        return None;
    }
    match db_err.constraint() {
        Some("users_email_key") => Some(DuplicateKey::Email),
        Some("users_username_key") => Some(DuplicateKey::Username),
        _ => None,
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.find_one("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        self.find_one("username", username).await
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> anyhow::Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, email, username, name, password_hash, role, user_type,
                               active, is_approved, country, currency, education)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {USER_COLUMNS}
            "#
        );
        let active = new_user.starts_active();
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.email)
            .bind(&new_user.username)
            .bind(&new_user.name)
            .bind(&new_user.password_hash)
            .bind(new_user.role())
            .bind(new_user.user_type)
            .bind(active)
            .bind(active)
            .bind(&new_user.country)
            .bind(&new_user.currency)
            .bind(&new_user.education)
            .fetch_one(&self.db)
            .await;

        match result {
            Ok(user) => Ok(user),
            Err(e) => match duplicate_key(&e) {
                Some(dup) => Err(dup.into()),
                None => Err(e.into()),
            },
        }
    }

    async fn list_pending_instructors(&self) -> anyhow::Result<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE user_type = $1 AND is_approved = FALSE \
             ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, User>(&sql)
            .bind(UserType::Instructor)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn approve(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET is_approved = TRUE, active = TRUE WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<Option<User>> {
        let sql = format!("UPDATE users SET active = $2 WHERE id = $1 RETURNING {USER_COLUMNS}");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(active)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }
}
