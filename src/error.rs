use thiserror::Error;

#[derive(Debug, Error)]
pub enum QcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("duplicate protein '{name}' (headers '{first}' and '{second}')")]
    DuplicateProtein {
        name: String,
        first: String,
        second: String,
    },

    #[error("empty data: {0}")]
    EmptyData(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QcError>;
