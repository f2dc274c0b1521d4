//! Resource error types.

use std::path::PathBuf;
use thiserror::Error;

use super::Lifecycle;
use crate::core::PathAddress;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("unknown content type `{content_type}` for {}", path.display())]
    UnknownContentType {
        path: PathBuf,
        content_type: &'static str,
    },

    #[error("unknown header key `{0}`")]
    UnknownHeaderKey(String),

    #[error("invalid value for header `{key}`: {value:?}")]
    InvalidHeaderValue { key: String, value: String },

    #[error("can't find image for {0}")]
    MissingImage(String),

    #[error("image {0} is referenced before it was loaded")]
    NotLoaded(String),

    #[error("{path}: can't move from {from:?} back to {to:?}")]
    Backward {
        path: PathAddress,
        from: Lifecycle,
        to: Lifecycle,
    },

    #[error("{0}: markup must be converted before it is built")]
    Unconverted(PathAddress),
}
