use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Jira API error {status}: {message} (url: {url})")]
    ApiError {
        status: u16,
        message: String,
        url: String,
    },

    #[error("Response is empty: {0}")]
    EmptyResponse(String),

    #[error("Unresolved Jira fields: {}", .0.join(", "))]
    UnresolvedFields(Vec<String>),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
