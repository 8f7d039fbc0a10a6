use thiserror::Error;

#[derive(Error, Debug)]
pub enum VicinityError {
    #[error("Search error: {0}")]
    SearchError(#[from] crate::search::SearchError),
    #[error("Storage error: {0}")]
    StoreError(#[from] crate::store::StoreError),
    #[error("Data error: {0}")]
    DataError(#[from] vicinity_data::DataError),
    #[error("DataFrame error: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("Please provide either lat+lon or a [city,] state")]
    UnderspecifiedQuery,
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VicinityError {
    /// True for errors caused by the request rather than by the system.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. } | Self::UnderspecifiedQuery
        )
    }
}

pub type Result<T> = std::result::Result<T, VicinityError>;
