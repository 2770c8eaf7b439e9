//! PostgreSQL implementation of UserDirectory.
//!
//! Reads the identity service's `users` table. This service never writes it.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::{UserContact, UserDirectory};

pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    email: Option<String>,
    name: Option<String>,
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserContact>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT email, name FROM users WHERE id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Failed to look up user: {}", e))
            })?;

        Ok(row.map(|r| UserContact {
            user_id: user_id.clone(),
            email: r.email,
            name: r.name,
        }))
    }
}
