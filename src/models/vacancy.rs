use serde::{Deserialize, Serialize};
use sqlx::AnyPool;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vacancy {
    pub vacancy_id: String,
    pub vacancy_name: String,
    pub employer_name: String,
    pub employer_id: String,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub vacancy_url: Option<String>,
    pub requirement_vacancy: Option<String>,
}

/// How a page of vacancies reacts to one record failing to save.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Stop at the first failing record; rows written before it stay committed.
    #[default]
    AbortPage,
    /// Log the failing record and carry on with the rest of the page.
    SkipRecord,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub upserted: usize,
    pub failed: usize,
}

/// A page abandoned part way through. `saved` rows were committed before `error`.
#[derive(Debug, thiserror::Error)]
#[error("{error} ({saved} rows saved before the failure)")]
pub struct BatchAborted {
    pub saved: usize,
    #[source]
    pub error: AppError,
}

const SELECT_VACANCY: &str = "SELECT vacancy_id, vacancy_name, employer_name, employer_id, salary_min, salary_max, vacancy_url, requirement_vacancy FROM vacancies";

impl Vacancy {
    /// Insert the vacancy, or overwrite every mutable column if the ID is already stored.
    /// Fails with a foreign key violation when the employer row does not exist.
    pub async fn upsert(pool: &AnyPool, vacancy: &Vacancy) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO vacancies (vacancy_id, vacancy_name, employer_name, employer_id, salary_min, salary_max, vacancy_url, requirement_vacancy)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (vacancy_id) DO UPDATE SET
                 vacancy_name = excluded.vacancy_name,
                 employer_name = excluded.employer_name,
                 employer_id = excluded.employer_id,
                 salary_min = excluded.salary_min,
                 salary_max = excluded.salary_max,
                 vacancy_url = excluded.vacancy_url,
                 requirement_vacancy = excluded.requirement_vacancy",
        )
        .bind(&vacancy.vacancy_id)
        .bind(&vacancy.vacancy_name)
        .bind(&vacancy.employer_name)
        .bind(&vacancy.employer_id)
        .bind(vacancy.salary_min)
        .bind(vacancy.salary_max)
        .bind(&vacancy.vacancy_url)
        .bind(&vacancy.requirement_vacancy)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Upsert one page of vacancies in order. Each row is its own statement, so
    /// nothing already written is rolled back when a later row fails.
    pub async fn upsert_batch(
        pool: &AnyPool,
        vacancies: &[Vacancy],
        policy: BatchPolicy,
    ) -> Result<BatchOutcome, BatchAborted> {
        let mut outcome = BatchOutcome::default();

        for vacancy in vacancies {
            match Self::upsert(pool, vacancy).await {
                Ok(()) => outcome.upserted += 1,
                Err(e) => match policy {
                    BatchPolicy::AbortPage => {
                        tracing::error!(
                            "Failed to save vacancy {}: {e}; abandoning the rest of the page",
                            vacancy.vacancy_id
                        );
                        return Err(BatchAborted {
                            saved: outcome.upserted,
                            error: e,
                        });
                    }
                    BatchPolicy::SkipRecord => {
                        tracing::warn!("Skipping vacancy {}: {e}", vacancy.vacancy_id);
                        outcome.failed += 1;
                    }
                },
            }
        }

        Ok(outcome)
    }

    pub async fn get(pool: &AnyPool, vacancy_id: &str) -> Result<Vacancy, AppError> {
        sqlx::query_as::<_, Vacancy>(&format!("{SELECT_VACANCY} WHERE vacancy_id = $1"))
            .bind(vacancy_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vacancy {vacancy_id} not found")))
    }

    pub async fn list_for_employer(
        pool: &AnyPool,
        employer_id: &str,
    ) -> Result<Vec<Vacancy>, AppError> {
        let vacancies = sqlx::query_as::<_, Vacancy>(&format!(
            "{SELECT_VACANCY} WHERE employer_id = $1 ORDER BY vacancy_id"
        ))
        .bind(employer_id)
        .fetch_all(pool)
        .await?;
        Ok(vacancies)
    }

    pub async fn count(pool: &AnyPool) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vacancies")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::employer::Employer;

    pub(crate) fn vacancy(id: &str, name: &str, min: i64, max: i64) -> Vacancy {
        Vacancy {
            vacancy_id: id.to_string(),
            vacancy_name: name.to_string(),
            employer_name: "Tensor".to_string(),
            employer_id: "67611".to_string(),
            salary_min: Some(min),
            salary_max: Some(max),
            vacancy_url: Some(format!("https://hh.ru/vacancy/{id}")),
            requirement_vacancy: Some("Rust, SQL".to_string()),
        }
    }

    pub(crate) async fn seed_employer(pool: &AnyPool) {
        Employer::upsert(
            pool,
            &Employer {
                employer_id: "67611".to_string(),
                employer_name: "Tensor".to_string(),
                employer_url: Some("https://hh.ru/employer/67611".to_string()),
                employer_open_vacancy: 2,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn vacancy_before_employer_violates_foreign_key() {
        let pool = test_pool().await;

        let err = Vacancy::upsert(&pool, &vacancy("1", "Rust Developer", 100, 200))
            .await
            .unwrap_err();

        assert!(err.is_foreign_key_violation(), "unexpected error: {err}");
        assert_eq!(Vacancy::count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn upsert_is_idempotent_and_updates_in_place() {
        let pool = test_pool().await;
        seed_employer(&pool).await;

        let original = vacancy("1", "Rust Developer", 100, 200);
        Vacancy::upsert(&pool, &original).await.unwrap();
        Vacancy::upsert(&pool, &original).await.unwrap();
        assert_eq!(Vacancy::count(&pool).await.unwrap(), 1);
        assert_eq!(Vacancy::get(&pool, "1").await.unwrap(), original);

        let raised = vacancy("1", "Senior Rust Developer", 150, 250);
        Vacancy::upsert(&pool, &raised).await.unwrap();
        assert_eq!(Vacancy::count(&pool).await.unwrap(), 1);
        assert_eq!(Vacancy::get(&pool, "1").await.unwrap(), raised);
    }

    #[tokio::test]
    async fn abort_page_stops_at_first_bad_record_and_keeps_earlier_rows() {
        let pool = test_pool().await;
        seed_employer(&pool).await;

        let mut orphan = vacancy("2", "Orphan", 0, 0);
        orphan.employer_id = "missing".to_string();
        let page = vec![
            vacancy("1", "First", 1, 2),
            orphan,
            vacancy("3", "Third", 1, 2),
        ];

        let aborted = Vacancy::upsert_batch(&pool, &page, BatchPolicy::AbortPage)
            .await
            .unwrap_err();

        assert!(aborted.error.is_foreign_key_violation());
        assert_eq!(aborted.saved, 1);
        let stored: Vec<String> = Vacancy::list_for_employer(&pool, "67611")
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.vacancy_id)
            .collect();
        assert_eq!(stored, vec!["1"]);
    }

    #[tokio::test]
    async fn skip_record_isolates_the_bad_vacancy() {
        let pool = test_pool().await;
        seed_employer(&pool).await;

        let mut orphan = vacancy("2", "Orphan", 0, 0);
        orphan.employer_id = "missing".to_string();
        let page = vec![
            vacancy("1", "First", 1, 2),
            orphan,
            vacancy("3", "Third", 1, 2),
        ];

        let outcome = Vacancy::upsert_batch(&pool, &page, BatchPolicy::SkipRecord)
            .await
            .unwrap();

        assert_eq!(outcome, BatchOutcome { upserted: 2, failed: 1 });
        assert_eq!(Vacancy::count(&pool).await.unwrap(), 2);
    }
}
