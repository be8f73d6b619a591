//! # Authentication
//!
//! Resolves an opaque session token to the manager it belongs to. The engine
//! only depends on the [`Authenticator`] trait; [`TokenAuthenticator`] is the
//! SQLite-backed implementation over the `manager_tokens` table.

use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;
use vend_core::ManagerId;

use crate::error::DbError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Blank token, or a token that does not name any manager.
    #[error("Unknown or missing session token")]
    UnknownToken,

    #[error(transparent)]
    Storage(#[from] DbError),
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Storage(err.into())
    }
}

/// Token-to-manager lookup.
///
/// Never returns a placeholder id: an unresolvable token is always
/// [`AuthError::UnknownToken`].
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<ManagerId, AuthError>;
}

#[derive(Debug, Clone)]
pub struct TokenAuthenticator {
    pool: SqlitePool,
}

impl TokenAuthenticator {
    pub fn new(pool: SqlitePool) -> Self {
        TokenAuthenticator { pool }
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<ManagerId, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::UnknownToken);
        }

        let manager_id: Option<ManagerId> =
            sqlx::query_scalar("SELECT manager_id FROM manager_tokens WHERE token = ?1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;

        manager_id.ok_or(AuthError::UnknownToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{memory_db, session};

    #[tokio::test]
    async fn test_known_token_resolves() {
        let db = memory_db().await;
        session(&db, "tok-42", 42).await;

        assert_eq!(db.authenticator().authenticate("tok-42").await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_unknown_and_blank_tokens_fail() {
        let db = memory_db().await;
        session(&db, "tok-1", 1).await;
        let auth = db.authenticator();

        assert!(matches!(auth.authenticate("nope").await, Err(AuthError::UnknownToken)));
        assert!(matches!(auth.authenticate("tok-1 ").await, Err(AuthError::UnknownToken)));
        assert!(matches!(auth.authenticate("").await, Err(AuthError::UnknownToken)));
        assert!(matches!(auth.authenticate("   ").await, Err(AuthError::UnknownToken)));
    }

    #[tokio::test]
    async fn test_storage_failure_is_not_reported_as_unknown_token() {
        let db = memory_db().await;
        let auth = db.authenticator();
        db.close().await;

        assert!(matches!(auth.authenticate("tok-1").await, Err(AuthError::Storage(_))));
    }
}
