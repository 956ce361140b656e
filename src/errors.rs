use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Pagination control has no page links")]
    EmptyPagination,

    #[error("Last page label {label:?} is not a page number")]
    PageLabelParse { label: String },

    #[error("No pagination link with label {page}")]
    PageLinkMissing { page: u32 },

    #[error("Script evaluation failed: {0}")]
    ScriptFailed(String),

    #[error("Chrome error: {0}")]
    ChromeError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
