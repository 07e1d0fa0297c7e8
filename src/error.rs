use std::string::FromUtf8Error;

use thiserror::Error;

/// Failures raised while shaping observations or actions.
///
/// Both variants are fatal to the current inference call.
#[derive(Error, Debug)]
pub enum TransformError {
    /// An array had an unexpected rank or dimensionality.
    #[error("shape error: {0}")]
    Shape(String),

    /// A byte-encoded prompt was not valid UTF-8.
    #[error("prompt is not valid UTF-8: {0}")]
    Encoding(#[from] FromUtf8Error),
}

impl TransformError {
    pub(crate) fn shape(message: impl Into<String>) -> Self {
        TransformError::Shape(message.into())
    }
}

/// Failures raised by a policy call, including the transforms around it.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// The model itself rejected or failed the call.
    #[error("model error: {0}")]
    Model(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("recorder error: {0}")]
    Recorder(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("recorder task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
