//! Read-only aggregate views over the ingested employers and vacancies.

use std::fmt;

use serde::Serialize;
use sqlx::AnyPool;

use crate::error::AppError;

/// Shown in place of an absent value. A stored salary of 0 means the source had none.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Both bounds present: non-null and above the zero used for a missing salary.
const HAS_SALARY: &str =
    "salary_min IS NOT NULL AND salary_max IS NOT NULL AND salary_min > 0 AND salary_max > 0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct EmployerVacancyCount {
    pub employer_name: String,
    pub employer_open_vacancy: i64,
}

impl EmployerVacancyCount {
    pub async fn list(pool: &AnyPool) -> Result<Vec<EmployerVacancyCount>, AppError> {
        let rows = sqlx::query_as::<_, EmployerVacancyCount>(
            "SELECT employer_name, employer_open_vacancy FROM employers ORDER BY employer_name",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

impl fmt::Display for EmployerVacancyCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} open vacancies",
            self.employer_name, self.employer_open_vacancy
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct VacancyListing {
    pub employer_name: String,
    pub vacancy_name: String,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub vacancy_url: Option<String>,
}

impl VacancyListing {
    /// Every stored vacancy with the name of the employer row it points at.
    pub async fn list(pool: &AnyPool) -> Result<Vec<VacancyListing>, AppError> {
        let rows = sqlx::query_as::<_, VacancyListing>(
            "SELECT employers.employer_name, vacancies.vacancy_name, vacancies.salary_min,
                    vacancies.salary_max, vacancies.vacancy_url
             FROM vacancies
             JOIN employers ON vacancies.employer_id = employers.employer_id
             ORDER BY employers.employer_name, vacancies.vacancy_name",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

impl fmt::Display for VacancyListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | from {} to {} | {}",
            self.employer_name,
            self.vacancy_name,
            format_salary(self.salary_min),
            format_salary(self.salary_max),
            self.vacancy_url.as_deref().unwrap_or(NOT_SPECIFIED)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SalaryAverages {
    pub avg_min: i64,
    pub avg_max: i64,
    pub avg_salary: i64,
}

impl SalaryAverages {
    /// Averages over vacancies that carry both salary bounds. `None` when there are none.
    pub async fn compute(pool: &AnyPool) -> Result<Option<SalaryAverages>, AppError> {
        let (avg_min, avg_max): (Option<f64>, Option<f64>) = sqlx::query_as(&format!(
            "SELECT CAST(AVG(salary_min) AS DOUBLE PRECISION), CAST(AVG(salary_max) AS DOUBLE PRECISION)
             FROM vacancies WHERE {HAS_SALARY}"
        ))
        .fetch_one(pool)
        .await?;

        Ok(match (avg_min, avg_max) {
            (Some(min), Some(max)) => Some(SalaryAverages {
                avg_min: min.round() as i64,
                avg_max: max.round() as i64,
                avg_salary: ((min + max) / 2.0).round() as i64,
            }),
            _ => None,
        })
    }
}

impl fmt::Display for SalaryAverages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Average minimum: {}, average maximum: {}, overall average: {}",
            self.avg_min, self.avg_max, self.avg_salary
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct VacancyAboveAverage {
    pub vacancy_name: String,
    pub requirement_vacancy: Option<String>,
    pub salary_min: i64,
    pub salary_max: i64,
    pub avg_vacancy_salary: i64,
}

impl VacancyAboveAverage {
    /// Vacancies whose salary midpoint beats the overall average, highest first.
    pub async fn list(pool: &AnyPool) -> Result<Vec<VacancyAboveAverage>, AppError> {
        let Some(averages) = SalaryAverages::compute(pool).await? else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, VacancyAboveAverage>(&format!(
            "SELECT vacancy_name, requirement_vacancy, salary_min, salary_max,
                    (salary_min + salary_max) / 2 AS avg_vacancy_salary
             FROM vacancies
             WHERE {HAS_SALARY} AND (salary_min + salary_max) / 2 > $1
             ORDER BY avg_vacancy_salary DESC, vacancy_name"
        ))
        .bind(averages.avg_salary)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

impl fmt::Display for VacancyAboveAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} - {} (avg {}) | {}",
            self.vacancy_name,
            self.salary_min,
            self.salary_max,
            self.avg_vacancy_salary,
            self.requirement_vacancy.as_deref().unwrap_or(NOT_SPECIFIED)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct VacancyMatch {
    pub vacancy_id: String,
    pub vacancy_name: String,
    pub requirement_vacancy: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
}

impl VacancyMatch {
    /// Case-insensitive substring search on the vacancy name.
    /// Folding happens here rather than in SQL: SQLite's `LOWER` only folds ASCII,
    /// and most hh.ru titles are Cyrillic.
    pub async fn search(pool: &AnyPool, keyword: &str) -> Result<Vec<VacancyMatch>, AppError> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Err(AppError::BadRequest("Keyword must not be empty".to_string()));
        }

        let rows = sqlx::query_as::<_, VacancyMatch>(
            "SELECT vacancy_id, vacancy_name, requirement_vacancy, salary_min, salary_max
             FROM vacancies
             ORDER BY vacancy_name",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter(|row| row.vacancy_name.to_lowercase().contains(&needle))
            .collect())
    }
}

impl fmt::Display for VacancyMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} | from {} to {} | {}",
            self.vacancy_id,
            self.vacancy_name,
            format_salary(self.salary_min),
            format_salary(self.salary_max),
            self.requirement_vacancy.as_deref().unwrap_or(NOT_SPECIFIED)
        )
    }
}

pub fn format_salary(value: Option<i64>) -> String {
    match value {
        None | Some(0) => NOT_SPECIFIED.to_string(),
        Some(v) => v.to_string(),
    }
}
