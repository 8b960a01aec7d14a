//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling.

use crate::errors::{AppError, Result};
use crate::db::DbPool;
use crate::db::models::*;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set, SqlErr,
};

/// Fields needed to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Paper Operations
    // ========================================================================

    /// Create a new paper
    pub async fn create_paper(
        &self,
        title: String,
        abstract_text: Option<String>,
        content: Option<String>,
    ) -> Result<Paper> {
        let paper = PaperActiveModel {
            id: NotSet,
            title: Set(title),
            abstract_text: Set(abstract_text),
            content: Set(content),
            created_at: Set(chrono::Utc::now().into()),
        };

        paper.insert(self.conn()).await.map_err(Into::into)
    }

    /// Find paper by ID
    pub async fn find_paper_by_id(&self, id: i32) -> Result<Option<Paper>> {
        PaperEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// List all papers in insertion order
    pub async fn list_papers(&self) -> Result<Vec<Paper>> {
        PaperEntity::find()
            .order_by_asc(PaperColumn::Id)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a new user. A username or email that is already taken is a
    /// validation error, even when a concurrent insert won the race.
    pub async fn create_user(&self, user: NewUser) -> Result<User> {
        let user = UserActiveModel {
            id: NotSet,
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            created_at: Set(chrono::Utc::now().into()),
        };

        user.insert(self.conn()).await.map_err(duplicate_user_error)
    }

    /// Find user by ID
    pub async fn find_user_by_id(&self, id: i32) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Find user by username
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Find user by email
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// List all users in insertion order
    pub async fn list_users(&self) -> Result<Vec<User>> {
        UserEntity::find()
            .order_by_asc(UserColumn::Id)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }
}

fn duplicate_user_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) if detail.contains("email") => {
            AppError::Validation {
                message: "Email already registered.".to_string(),
                field: Some("email".to_string()),
            }
        }
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Validation {
            message: "Username already taken.".to_string(),
            field: Some("username".to_string()),
        },
        _ => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    async fn memory_repo() -> Repository {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..DatabaseConfig::default()
        };
        let pool = DbPool::new(&config).await.unwrap();
        pool.ensure_schema().await.unwrap();
        Repository::new(pool)
    }

    #[tokio::test]
    async fn test_paper_roundtrip() {
        let repo = memory_repo().await;

        let paper = repo
            .create_paper(
                "Attention Is All You Need".to_string(),
                Some("Transformers".to_string()),
                Some("full text".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(paper.id, 1);
        let found = repo.find_paper_by_id(paper.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Attention Is All You Need");
        assert_eq!(found.abstract_text.as_deref(), Some("Transformers"));
        assert!(repo.find_paper_by_id(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_papers_in_insertion_order() {
        let repo = memory_repo().await;
        for title in ["first", "second", "third"] {
            repo.create_paper(title.to_string(), None, None).await.unwrap();
        }

        let titles: Vec<_> = repo
            .list_papers()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_user_lookups() {
        let repo = memory_repo().await;
        let user = repo
            .create_user(NewUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();

        assert!(repo.find_user_by_username("alice").await.unwrap().is_some());
        assert!(repo.find_user_by_email("alice@example.com").await.unwrap().is_some());
        assert!(repo.find_user_by_username("bob").await.unwrap().is_none());
        assert_eq!(repo.find_user_by_id(user.id).await.unwrap().unwrap().username, "alice");
        assert_eq!(repo.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_user_is_validation_error() {
        let repo = memory_repo().await;
        let new_user = NewUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
        };
        repo.create_user(new_user.clone()).await.unwrap();

        let same_name = repo
            .create_user(NewUser {
                email: "other@example.com".to_string(),
                ..new_user.clone()
            })
            .await;
        assert!(matches!(
            same_name,
            Err(AppError::Validation { field: Some(ref f), .. }) if f == "username"
        ));

        let same_email = repo
            .create_user(NewUser {
                username: "bob".to_string(),
                ..new_user
            })
            .await;
        assert!(matches!(
            same_email,
            Err(AppError::Validation { field: Some(ref f), .. }) if f == "email"
        ));

        assert_eq!(repo.list_users().await.unwrap().len(), 1);
    }
}
