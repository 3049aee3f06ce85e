use crate::cli::optparser::{OptionError, SchemaError};
use crate::core::trn::TrnError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by the remote API or the transport underneath it
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("request rejected: {0}")]
    BadRequest(String),

    #[error("remote error: {0}")]
    Remote(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Tharsis CLI unified error type
#[derive(Error, Debug)]
pub enum TharsisError {
    #[error("{0}")]
    Argument(String),

    #[error(transparent)]
    Options(#[from] OptionError),

    #[error("invalid command definition: {0}")]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Identifier(#[from] TrnError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings error: {message}")]
    Settings { message: String },

    #[error("Output error: {0}")]
    Output(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("provider upload aborted {stage}: {source}")]
    Upload {
        stage: String,
        #[source]
        source: Box<TharsisError>,
    },
}

impl TharsisError {
    /// Errors caused by how the command was invoked; these get the help text
    pub fn is_argument_error(&self) -> bool {
        matches!(self, Self::Argument(_) | Self::Options(_))
    }

    /// True when the remote API reported that the resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(ApiError::NotFound(_)))
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type TharsisResult<T> = Result<T, TharsisError>;
