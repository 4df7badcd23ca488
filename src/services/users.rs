use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{CreateUserRequest, User};

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, nickname, password_hash, created_at, updated_at";

/// Resolves principals for the session manager.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;

    fn verify_password(&self, user: &User, plaintext: &str) -> bool {
        match bcrypt::verify(plaintext, &user.password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::error!("bcrypt verify error for user_id={}: {}", user.id, e);
                false
            }
        }
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }
}

pub struct UserService;

impl UserService {
    /// Register a new account. Returns `Ok(None)` when the email is already taken.
    pub async fn create(pool: &PgPool, req: &CreateUserRequest) -> anyhow::Result<Option<User>> {
        let password_hash = bcrypt::hash(&req.password, 12)?;
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, first_name, last_name, nickname, password_hash)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (email) DO NOTHING
             RETURNING {USER_COLUMNS}"
        ))
        .bind(req.email.to_lowercase())
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.nickname)
        .bind(password_hash)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{user, MemoryUsers};
    use super::*;

    #[test]
    fn test_verify_password_against_bcrypt_hash() {
        let store = MemoryUsers::new(vec![]);
        let ada = user("a@x.com", "p");
        assert!(store.verify_password(&ada, "p"));
        assert!(!store.verify_password(&ada, "q"));
    }

    #[test]
    fn test_verify_password_with_corrupt_hash_is_false() {
        let store = MemoryUsers::new(vec![]);
        let mut ada = user("a@x.com", "p");
        ada.password_hash = "not-a-bcrypt-hash".into();
        assert!(!store.verify_password(&ada, "p"));
    }
}
