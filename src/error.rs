use thiserror::Error;

use crate::parse::ParseError;
use crate::AuthoringError;

/// Unified error type covering parsing, authoring validation, JSON, and I/O.
///
/// Returned by convenience methods like [`Catalog::from_dsl()`](crate::Catalog::from_dsl)
/// and [`Catalog::from_json_file()`](crate::Catalog::from_json_file).
#[derive(Debug, Error)]
pub enum OptruleError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Authoring(#[from] AuthoringError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
