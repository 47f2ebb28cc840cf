//! Error taxonomy for a sync pass.

use sea_orm::{DbErr, SqlErr};
use uuid::Uuid;

use crate::backend::BackendError;
use crate::credentials::CredentialError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Remote error: {0}")]
    Remote(#[from] BackendError),

    /// A local uniqueness rule rejected the write.
    #[error("Local constraint violated: {0}")]
    LocalConstraint(String),

    #[error("Malformed remote payload: {0}")]
    MalformedPayload(String),

    #[error("No local link for remote task-list {0}")]
    UnknownTasklist(String),

    #[error("Account {0} not found")]
    AccountNotFound(Uuid),

    #[error("Task {0} has no remote link for this account")]
    UnlinkedTask(Uuid),

    #[error("Database error: {0}")]
    Database(String),
}

impl SyncError {
    /// Whether a later re-run of the pass may clear this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Credential(e) => e.is_retryable(),
            SyncError::Remote(e) => e.is_retryable(),
            SyncError::Database(_) => true,
            SyncError::LocalConstraint(_)
            | SyncError::MalformedPayload(_)
            | SyncError::UnknownTasklist(_)
            | SyncError::AccountNotFound(_)
            | SyncError::UnlinkedTask(_) => false,
        }
    }
}

impl From<anyhow::Error> for SyncError {
    fn from(error: anyhow::Error) -> Self {
        if let Some(db_err) = error.downcast_ref::<DbErr>() {
            if let Some(SqlErr::UniqueConstraintViolation(message)) = db_err.sql_err() {
                return SyncError::LocalConstraint(message);
            }
        }
        SyncError::Database(format!("{:#}", error))
    }
}

impl From<DbErr> for SyncError {
    fn from(error: DbErr) -> Self {
        SyncError::from(anyhow::Error::from(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        let server = SyncError::Remote(BackendError::Api {
            status: 500,
            body: String::new(),
        });
        let client = SyncError::Remote(BackendError::Api {
            status: 400,
            body: String::new(),
        });
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(!SyncError::LocalConstraint("dup".to_string()).is_retryable());
        assert!(!SyncError::Credential(CredentialError::Unauthorized("revoked".to_string())).is_retryable());
    }

    #[test]
    fn test_plain_anyhow_maps_to_database() {
        let error = SyncError::from(anyhow::anyhow!("disk full"));
        assert!(matches!(error, SyncError::Database(ref m) if m == "disk full"));
    }
}
