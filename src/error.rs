//! Error and result types shared across the crate.
//!
//! Most code returns the boxed [`DynError`]; the backend layer has its own
//! typed [`ServiceError`] so callers can tell a refused connection from a
//! rejected request.
use std::fmt::{Display, Formatter};

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type Result<T> = std::result::Result<T, DynError>;

/// Attach a lazily built context message to an error.
pub trait Context<T> {
    fn with_ctx<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

#[derive(Debug)]
pub struct WithContextError {
    pub context: String,
    pub source: DynError,
}

impl Display for WithContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.context, self.source)
    }
}

impl std::error::Error for WithContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl<T, E> Context<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_ctx<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            Box::new(WithContextError {
                context: f(),
                source: e.into(),
            }) as DynError
        })
    }
}

/// Failure reported by a [`crate::service::UserService`] backend.
#[derive(Debug)]
pub enum ServiceError {
    /// The request never produced a response (DNS, refused, timeout).
    Transport(String),
    /// The backend answered with a non-success status.
    Status { status: u16, body: String },
    /// The response body did not match the expected shape.
    Decode(String),
    /// A user or role id the backend does not know.
    NotFound { kind: &'static str, id: String },
    /// The configured base URL can't address the API.
    InvalidEndpoint(String),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Transport(msg) => write!(f, "request failed: {msg}"),
            ServiceError::Status { status, body } if body.is_empty() => {
                write!(f, "backend returned status {status}")
            }
            ServiceError::Status { status, body } => {
                write!(f, "backend returned status {status}: {body}")
            }
            ServiceError::Decode(msg) => write!(f, "unexpected response: {msg}"),
            ServiceError::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            ServiceError::InvalidEndpoint(msg) => write!(f, "invalid endpoint: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}
