// Vacancy sources and the ingestion runner that feeds them into the store.

pub mod hh;
pub mod runner;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::employer::Employer;
use crate::models::vacancy::Vacancy;

/// Fixed page size requested from the vacancy listing.
pub const PER_PAGE: u32 = 100;

/// One slice of an employer's vacancy listing. An empty page ends pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VacancyPage {
    pub items: Vec<Vacancy>,
}

impl VacancyPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Trait that every employer/vacancy source implements.
/// Responses are normalized into storable rows before they are returned.
#[async_trait]
pub trait VacancySource: Send + Sync {
    /// Fetch an employer profile. `Ok(None)` means the source has nothing usable for this ID.
    async fn fetch_employer(&self, employer_id: &str) -> Result<Option<Employer>, AppError>;

    /// Fetch one zero-based page of the employer's vacancies.
    async fn fetch_vacancy_page(
        &self,
        employer_id: &str,
        page: u32,
    ) -> Result<VacancyPage, AppError>;
}
