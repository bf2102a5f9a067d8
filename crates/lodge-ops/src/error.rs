//! # Workflow Error Types
//!
//! A workflow fails for one of two reasons: the domain said no (a rule or
//! invariant), or the store did (I/O). Callers usually match on the
//! domain side; store errors are operational and bubble up.

use thiserror::Error;

use lodge_core::DomainError;
use lodge_db::StoreError;

/// Error type for workflow operations.
#[derive(Debug, Error)]
pub enum OpsError {
    /// A business rule or lifecycle invariant rejected the operation.
    /// The store is unchanged.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The entity store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for OpsError {
    fn from(err: sqlx::Error) -> Self {
        OpsError::Store(StoreError::from(err))
    }
}

impl OpsError {
    /// The domain rejection, if that is what this is. Convenient for
    /// callers (and tests) asserting on a specific rule.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            OpsError::Domain(err) => Some(err),
            OpsError::Store(_) => None,
        }
    }
}

/// Convenience type alias for Results with OpsError.
pub type OpsResult<T> = Result<T, OpsError>;
