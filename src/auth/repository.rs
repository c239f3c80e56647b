//! Credential store: persistence of `User` rows

use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, error};

use super::models::{NewUser, User};
use crate::common::safe_email_log;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("user not found")]
    NotFound,

    #[error("email is already registered")]
    DuplicateEmail,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;
    async fn find_user_by_email(&self, email: &str) -> Result<User, RepositoryError>;
}

#[derive(Clone)]
pub struct SqliteUserRepository {
    db: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let created = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password, dob) VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.dob)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    debug!(email = %safe_email_log(&user.email), "Duplicate email on insert");
                    return RepositoryError::DuplicateEmail;
                }
            }
            error!(error = %e, email = %safe_email_log(&user.email), "Failed to create user");
            RepositoryError::Database(e)
        })?;

        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| {
                error!(error = %e, email = %safe_email_log(email), "Failed to find user");
                RepositoryError::Database(e)
            })?;

        user.ok_or(RepositoryError::NotFound)
    }
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    use sqlx::sqlite::SqlitePoolOptions;

    // one connection, otherwise every connection opens its own empty database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    crate::common::migrations::run_migrations(&pool)
        .await
        .expect("migrations");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "testuser".to_string(),
            email: email.to_string(),
            password: "$argon2id$fake".to_string(),
            dob: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = SqliteUserRepository::new(memory_pool().await);

        let created = repo.create_user(new_user("test@example.com")).await.unwrap();
        assert!(created.id > 0);
        assert!(!created.created_at.is_empty());

        let found = repo.find_user_by_email("test@example.com").await.unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, "testuser");
        assert_eq!(found.dob, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(found.password, "$argon2id$fake");
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let repo = SqliteUserRepository::new(memory_pool().await);
        let err = repo.find_user_by_email("nobody@example.com").await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let pool = memory_pool().await;
        let repo = SqliteUserRepository::new(pool.clone());

        repo.create_user(new_user("test@example.com")).await.unwrap();
        let err = repo
            .create_user(new_user("test@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateEmail));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
