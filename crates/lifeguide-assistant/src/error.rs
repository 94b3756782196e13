use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Completion API returned no content")]
    EmptyCompletion,

    #[error("Completion was not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
