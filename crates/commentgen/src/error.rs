use crate::content::ContentId;

/// The main error type for the commentgen [`crate`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// One of the settings required to enable comment generation is empty.
    #[error("Comment generation is not configured: {0} is empty")]
    NotConfigured(&'static str),

    /// A setting was present but unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The anti-forgery token did not match the viewer's session.
    #[error("Invalid or missing anti-forgery token")]
    InvalidRequest,

    #[error("Content not found: {0}")]
    NotFound(String),

    /// A remote service answered with something we cannot use.
    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Request was cancelled")]
    Cancelled,

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    TomlError(#[from] toml::de::Error),

    /// The error type for operations interacting with environment variables.
    /// Possibly returned from [`std::env::var()`].
    #[error("Environment variable error: {0} {1}")]
    EnvVarError(String, std::env::VarError),

    #[error("Invalid header value for {0}: {1}")]
    InvalidHeaderValue(String, reqwest::header::InvalidHeaderValue),

    /// Represents [`crate::completions::CompletionRequestBuilder`] errors.
    #[error(transparent)]
    CompletionRequestBuilderError(#[from] crate::completions::CompletionRequestBuilderError),
}

impl Error {
    pub fn not_found(id: ContentId) -> Self {
        Error::NotFound(id.to_string())
    }

    /// Collapses the error into the coarse kind used for logging and tests.
    ///
    /// Callers facing end users should never show more than
    /// [`crate::action::FAILURE_MESSAGE`]; the kind exists so operators can
    /// still tell causes apart.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotConfigured(_)
            | Error::InvalidConfig(_)
            | Error::IOError(_)
            | Error::TomlError(_)
            | Error::EnvVarError(..) => ErrorKind::NotConfigured,
            Error::InvalidRequest => ErrorKind::InvalidRequest,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::UpstreamError(_)
            | Error::UnexpectedStatus { .. }
            | Error::ReqwestError(_)
            | Error::JsonError(_)
            | Error::InvalidHeaderValue(..)
            | Error::CompletionRequestBuilderError(_) => ErrorKind::Upstream,
        }
    }
}

/// Coarse classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotConfigured,
    InvalidRequest,
    NotFound,
    Upstream,
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::NotConfigured => "not_configured",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// A specialized [`Result`] type for this commentgen [`crate`].
///
/// This typedef is generally used to avoid writing out [`Error`] directly and
/// is otherwise a direct mapping to [`Result`].
///
/// # Examples
///
/// ```
/// fn load_settings() -> commentgen::Result<()> {
///     // run some code that may produce an error from the commentgen code
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;
