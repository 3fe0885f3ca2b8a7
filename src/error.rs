use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Browser initialization error: {0}")]
    BrowserInit(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Row not found: {0}")]
    RowNotFound(String),

    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Upstream process error: {0}")]
    Upstream(String),

    #[error("Invalid helper output: {0}")]
    InvalidOutput(String),

    #[error("File operation error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScrapeError {
    /// Soft failures degrade the walk but do not abort the request.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::CategoryNotFound(_) | Self::RowNotFound(_))
    }

    /// HTTP status the response contract maps this error to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Upstream(_) | Self::InvalidOutput(_) => 502,
            _ => 500,
        }
    }

    /// Message exposed in HTTP response bodies. Validation, timeout, and
    /// upstream errors carry their bare text; the rest keep the prefix.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::Timeout(msg) | Self::Upstream(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
