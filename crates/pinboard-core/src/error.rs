use thiserror::Error;

/// Failures reported by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write, e.g. a duplicate
    /// (scope, order) pair or a second membership for the same user.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum KanbanError {
    /// Malformed input: missing or oversized fields, bad enum values.
    #[error("{0}")]
    Validation(String),

    /// Absent, or present but invisible to the actor.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Visible to the actor but beyond their role.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Storage(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, KanbanError>;

impl KanbanError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<StoreError> for KanbanError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation(what) => KanbanError::Conflict(what),
            StoreError::Backend(err) => KanbanError::Storage(err),
        }
    }
}
