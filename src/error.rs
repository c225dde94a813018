use rmcp::model::{Content, IntoContents};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocsError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("{url} returned status {status}")]
    RemoteStatus { url: String, status: u16 },

    #[error("Failed to read local documentation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to decode response: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid module path '{0}'")]
    InvalidModulePath(String),
}

/// Tool failures reach the client as the error text.
impl IntoContents for DocsError {
    fn into_contents(self) -> Vec<Content> {
        vec![Content::text(self.to_string())]
    }
}

pub type Result<T> = std::result::Result<T, DocsError>;
