use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures that came from talking to the quiz endpoint.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            AppError::Fetch(_) | AppError::Timeout(_) | AppError::Validation(_)
        )
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else {
            AppError::Fetch(err.to_string())
        }
    }
}
impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::Persistence(err.to_string())
    }
}
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AppError::NotFound("module m1".into());
        assert_eq!(err.to_string(), "Not found: module m1");
    }

    #[test]
    fn test_fetch_failure_classification() {
        assert!(AppError::Fetch("dns".into()).is_fetch_failure());
        assert!(AppError::Timeout("slow".into()).is_fetch_failure());
        assert!(AppError::Validation("bad payload".into()).is_fetch_failure());
        assert!(!AppError::Persistence("write".into()).is_fetch_failure());
    }
}
