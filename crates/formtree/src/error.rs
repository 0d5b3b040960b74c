use thiserror::Error;

use crate::encoded_path::EncodedPath;
use crate::registry::FieldId;

/// Errors raised by the form engine.
///
/// Apart from `UnresolvableExternalErrorPath`, every variant signals a broken
/// contract between the engine and its caller (value/tree desync, lifecycle
/// mismatch). Operations that hit one abort without producing a new state.
#[derive(Error, Debug)]
pub enum FormError {
    #[error("shape mismatch at {path}: {reason}")]
    ShapeMismatch { path: EncodedPath, reason: String },

    #[error("external error path {path:?} does not match the current value: {reason}")]
    UnresolvableExternalErrorPath { path: String, reason: String },

    #[error("custom change at {requested} started while {pending} is still pending")]
    ConcurrentCustomChange {
        pending: EncodedPath,
        requested: EncodedPath,
    },

    #[error("no validations registered at {path}")]
    MissingRegistryBucket { path: EncodedPath },

    #[error("field {field} is not registered at {path}")]
    MissingFieldEntry { path: EncodedPath, field: FieldId },

    #[error("invalid path {input:?}: {reason}")]
    InvalidPath { input: String, reason: String },

    #[error("index {index} out of bounds for array of length {len} at {path}")]
    IndexOutOfBounds {
        path: EncodedPath,
        index: usize,
        len: usize,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FormError {
    pub(crate) fn shape(path: impl Into<EncodedPath>, reason: impl Into<String>) -> Self {
        FormError::ShapeMismatch {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for the one recoverable class (reconciliation skips the entry).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FormError::UnresolvableExternalErrorPath { .. })
    }
}

pub type Result<T, E = FormError> = std::result::Result<T, E>;
