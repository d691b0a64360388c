use sqlx::any::AnyPoolOptions;
use sqlx::migrate::MigrateDatabase;
use sqlx::{Any, AnyPool};

use crate::error::AppError;

const CREATE_EMPLOYERS: &str = "CREATE TABLE IF NOT EXISTS employers (
    employer_id VARCHAR(25) PRIMARY KEY,
    employer_name TEXT NOT NULL,
    employer_url TEXT,
    employer_open_vacancy BIGINT NOT NULL DEFAULT 0
)";

const CREATE_VACANCIES: &str = "CREATE TABLE IF NOT EXISTS vacancies (
    vacancy_id VARCHAR(25) PRIMARY KEY,
    vacancy_name TEXT NOT NULL,
    employer_name TEXT NOT NULL,
    employer_id VARCHAR(25) NOT NULL REFERENCES employers(employer_id),
    salary_min BIGINT,
    salary_max BIGINT,
    vacancy_url TEXT,
    requirement_vacancy TEXT
)";

/// Open the session pool. A single connection serves the whole session; every
/// statement checks it out and returns it when done.
pub async fn create_pool(database_url: &str) -> Result<AnyPool, AppError> {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Create the target database if the server does not have it yet.
pub async fn ensure_database(database_url: &str) -> Result<bool, AppError> {
    sqlx::any::install_default_drivers();
    if Any::database_exists(database_url).await? {
        tracing::info!("Database already exists");
        return Ok(false);
    }
    Any::create_database(database_url).await?;
    tracing::info!("Database created");
    Ok(true)
}

/// Create the employers and vacancies tables. Safe to run repeatedly.
pub async fn create_schema(pool: &AnyPool) -> Result<(), AppError> {
    for (table, ddl) in [("employers", CREATE_EMPLOYERS), ("vacancies", CREATE_VACANCIES)] {
        sqlx::query(ddl).execute(pool).await?;
        tracing::debug!("Table '{table}' ready");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> AnyPool {
    let pool = create_pool("sqlite::memory:")
        .await
        .expect("in-memory sqlite pool");
    create_schema(&pool).await.expect("schema");
    pool
}
