use thiserror::Error;

/// Rejections produced while turning raw date parameters into a window.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("either specify both startDate and endDate, or specify neither")]
    IncompleteRange,

    #[error("invalid date format for {0:?}, expected YYYY-MM-DD")]
    InvalidDateFormat(String),

    #[error("startDate cannot be after endDate")]
    RangeInverted,

    #[error("startDate and endDate cannot be the same")]
    RangeEmpty,
}

/// Failures of the analytics query layer.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query failed: {0}")]
    QueryFailed(#[source] anyhow::Error),

    /// A stored pageview URL could not be parsed. Ingestion validates URLs, so
    /// this points at rows written by something other than the pipeline.
    #[error("stored url {url:?} is malformed: {source}")]
    MalformedStoredUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
