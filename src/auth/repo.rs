use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::auth::repo_types::{NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The email is already taken. Raised by the store's own uniqueness check.
    #[error("email already registered: {0}")]
    DuplicateEmail(String),
    #[error("user store failure: {0}")]
    Database(#[from] sqlx::Error),
}

/// Where user accounts live. Emails are compared exactly as given.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// `Ok(None)` when nobody has this email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    /// Persist a new user and return it with its id. Fails with
    /// [`StoreError::DuplicateEmail`] if the email is taken, even when a
    /// concurrent insert got there first.
    async fn save(&self, user: NewUser) -> Result<User, StoreError>;
}

/// PostgreSQL-backed store; uniqueness rides on the `users.email` constraint.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn save(&self, user: NewUser) -> Result<User, StoreError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(saved) => Ok(saved),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::DuplicateEmail(user.email))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Default)]
struct Table {
    last_id: i64,
    by_id: HashMap<i64, User>,
    by_email: HashMap<String, i64>,
}

/// Process-local store. The email check and the insert happen under one lock.
#[derive(Default)]
pub struct InMemoryUserStore {
    table: Mutex<Table>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let table = self.lock();
        Ok(table
            .by_email
            .get(email)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.lock().by_id.get(&id).cloned())
    }

    async fn save(&self, user: NewUser) -> Result<User, StoreError> {
        let mut table = self.lock();
        if table.by_email.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }
        table.last_id += 1;
        let saved = User {
            id: table.last_id,
            email: user.email,
            password_hash: user.password_hash,
            created_at: user.created_at,
        };
        table.by_email.insert(saved.email.clone(), saved.id);
        table.by_id.insert(saved.id, saved.clone());
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use time::macros::datetime;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
            created_at: datetime!(2025-01-01 0:00 UTC),
        }
    }

    #[tokio::test]
    async fn missing_email_is_none_not_error() {
        let store = InMemoryUserStore::new();
        assert!(store.find_by_email("nobody@x.com").await.unwrap().is_none());
        assert!(store.find_by_id(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_assigns_sequential_ids() {
        let store = InMemoryUserStore::new();
        let a = store.save(new_user("a@x.com")).await.unwrap();
        let b = store.save(new_user("b@x.com")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        let found = store.find_by_email("b@x.com").await.unwrap().unwrap();
        assert_eq!(found, b);
        assert_eq!(store.find_by_id(1).await.unwrap().unwrap().email, "a@x.com");
    }

    #[tokio::test]
    async fn save_rejects_duplicate_email() {
        let store = InMemoryUserStore::new();
        store.save(new_user("a@x.com")).await.unwrap();
        let err = store.save(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(ref e) if e == "a@x.com"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn emails_are_case_sensitive_at_the_store() {
        let store = InMemoryUserStore::new();
        store.save(new_user("a@x.com")).await.unwrap();
        assert!(store.find_by_email("A@X.COM").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_saves_admit_one_winner() {
        let store = Arc::new(InMemoryUserStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.save(new_user("race@x.com")).await }));
        }
        let mut wins = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => wins += 1,
                Err(StoreError::DuplicateEmail(_)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(store.len(), 1);
    }
}
