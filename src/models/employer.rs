use serde::{Deserialize, Serialize};
use sqlx::AnyPool;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employer {
    pub employer_id: String,
    pub employer_name: String,
    pub employer_url: Option<String>,
    pub employer_open_vacancy: i64,
}

impl Employer {
    /// Insert the employer, or overwrite every mutable column if the ID is already stored.
    pub async fn upsert(pool: &AnyPool, employer: &Employer) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO employers (employer_id, employer_name, employer_url, employer_open_vacancy)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (employer_id) DO UPDATE SET
                 employer_name = excluded.employer_name,
                 employer_url = excluded.employer_url,
                 employer_open_vacancy = excluded.employer_open_vacancy",
        )
        .bind(&employer.employer_id)
        .bind(&employer.employer_name)
        .bind(&employer.employer_url)
        .bind(employer.employer_open_vacancy)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get(pool: &AnyPool, employer_id: &str) -> Result<Employer, AppError> {
        sqlx::query_as::<_, Employer>(
            "SELECT employer_id, employer_name, employer_url, employer_open_vacancy FROM employers WHERE employer_id = $1",
        )
        .bind(employer_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employer {employer_id} not found")))
    }

    pub async fn count(pool: &AnyPool) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM employers")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}
