//! Error types for the object pool

use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by factories and lifecycle hooks.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Shared error source, kept in an `Arc` so [`PoolError`] stays `Clone`.
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

#[derive(Error, Debug, Clone)]
pub enum PoolError {
    #[error("Invalid pool configuration: {0}")]
    Configuration(String),

    #[error("Failed to create pooled object: {0}")]
    Creation(#[source] SharedError),

    #[error("Pool is empty - no objects available")]
    PoolEmpty,

    #[error("Lifecycle hook `{hook}` failed: {source}")]
    Hook {
        hook: &'static str,
        #[source]
        source: SharedError,
    },

    #[error("No active execution context: none is set for this task, or it already ended")]
    NoContext,
}

impl PoolError {
    pub(crate) fn creation(err: BoxError) -> Self {
        PoolError::Creation(Arc::from(err))
    }

    pub(crate) fn hook(hook: &'static str, err: BoxError) -> Self {
        PoolError::Hook {
            hook,
            source: Arc::from(err),
        }
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
