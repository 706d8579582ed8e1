use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, StockError>;

/// Error type covering the failures that abort a pass or stop the process
/// from starting. Row-level parse problems and missing columns are not
/// errors; they are reported through the evaluation outcome instead.
#[derive(Debug, Error)]
pub enum StockError {
    /// Wrapper for IO failures such as reading settings or the token cache.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when a required key is absent from the settings file.
    #[error("missing required setting '{0}'")]
    MissingSetting(&'static str),

    /// Raised when the settings file does not exist.
    #[error("settings file not found: {0}")]
    MissingSettings(PathBuf),

    /// Raised when no usable OAuth token can be produced from the cache.
    #[error("credential error: {0}")]
    Credentials(String),

    /// HTTP client failures (connect, TLS, timeouts, body decoding).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Raised when a remote service answers with an unexpected status or
    /// payload.
    #[error("transport error during {operation}: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    /// Raised when a URL for the spreadsheet API cannot be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Errors bubbled up from the SMTP transport.
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Raised when an email message cannot be assembled.
    #[error("invalid email: {0}")]
    Email(String),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when a workbook does not contain the requested sheet.
    #[error("sheet '{0}' not found in workbook")]
    MissingSheet(String),

    /// Raised when a cron expression cannot be parsed.
    #[error("invalid schedule '{expression}': {message}")]
    Schedule { expression: String, message: String },

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl From<lettre::error::Error> for StockError {
    fn from(error: lettre::error::Error) -> Self {
        StockError::Email(error.to_string())
    }
}

impl From<lettre::address::AddressError> for StockError {
    fn from(error: lettre::address::AddressError) -> Self {
        StockError::Email(error.to_string())
    }
}

impl StockError {
    /// Whether the failure came from talking to a remote service, as opposed
    /// to local configuration.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            StockError::Http(_)
                | StockError::Transport { .. }
                | StockError::Smtp(_)
        )
    }
}
