#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True when the database rejected a row because its referenced parent is missing.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            AppError::Database(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation()
        )
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_constraint_violations() {
        let err = AppError::Transport("connection refused".to_string());
        assert!(!err.is_foreign_key_violation());
        assert_eq!(err.to_string(), "Transport error: connection refused");
    }

    #[test]
    fn row_not_found_is_not_a_constraint_violation() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(!err.is_foreign_key_violation());
    }
}
