use pay_common::{MinorUnits, UserIdParseError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Invalid input. {0}")]
    Validation(#[from] ValidationError),
    /// The service answered with a non-success status code. `detail` is the body's `detail` field, or the whole body
    /// when the field is absent.
    #[error("{status}: {detail}")]
    Remote { status: u16, detail: String },
    #[error("Could not reach the service. {0}")]
    Transport(String),
    #[error("Could not decode the service response. {0}")]
    Decode(#[from] DecodeError),
    #[error("Invalid client configuration. {0}")]
    Configuration(String),
}

impl SessionError {
    pub fn remote<S: Into<String>>(status: u16, detail: S) -> Self {
        Self::Remote { status, detail: detail.into() }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<url::ParseError> for SessionError {
    fn from(e: url::ParseError) -> Self {
        Self::Configuration(format!("Failed to build URL: {e}"))
    }
}

/// Problems with user input that are caught before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0}")]
    InvalidUserId(#[from] UserIdParseError),
    #[error("Amount must be a positive number of minor units, but was {0}.")]
    NonPositiveAmount(MinorUnits),
    #[error("Order description must be between 1 and {max} characters, but was {len}.")]
    InvalidDescription { len: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Payload is not valid JSON. {0}")]
    Malformed(String),
    #[error("Unexpected payload shape. {0}")]
    Shape(String),
}
