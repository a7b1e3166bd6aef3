use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiskmonError {
    #[error("metric already registered: {0}")]
    DuplicateMetric(String),
    #[error("label arity mismatch for {metric}: expected {expected} values, got {got}")]
    LabelArity {
        metric: String,
        expected: usize,
        got: usize,
    },
    #[error("os query failed: {0}")]
    OsQuery(String),
    #[error("scrape timed out after {0:?}")]
    ScrapeTimeout(std::time::Duration),
    #[error("internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, DiskmonError>;
