use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::AnyPool;

use crate::collectors::VacancySource;
use crate::models::employer::Employer;
use crate::models::vacancy::{BatchPolicy, Vacancy};

/// Courtesy delay between successive page requests.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub page_delay: Duration,
    pub batch_policy: BatchPolicy,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            page_delay: DEFAULT_PAGE_DELAY,
            batch_policy: BatchPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EmployerOutcome {
    /// Profile saved and pages walked until the listing ran out.
    Ingested {
        pages: u32,
        vacancies: usize,
        failed_records: usize,
    },
    /// The source had no usable profile, so nothing was written.
    Skipped { reason: String },
    /// A write failed; rows saved before the failure stay in place.
    /// `pages` counts fully saved pages; `vacancies` counts every committed row.
    Failed {
        pages: u32,
        vacancies: usize,
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployerReport {
    pub employer_id: String,
    pub outcome: EmployerOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub employers: Vec<EmployerReport>,
}

impl IngestSummary {
    pub fn ingested(&self) -> usize {
        self.count(|o| matches!(o, EmployerOutcome::Ingested { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, EmployerOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, EmployerOutcome::Failed { .. }))
    }

    pub fn vacancies(&self) -> usize {
        self.employers
            .iter()
            .map(|r| match &r.outcome {
                EmployerOutcome::Ingested { vacancies, .. }
                | EmployerOutcome::Failed { vacancies, .. } => *vacancies,
                EmployerOutcome::Skipped { .. } => 0,
            })
            .sum()
    }

    fn count(&self, pred: impl Fn(&EmployerOutcome) -> bool) -> usize {
        self.employers.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Ingest every employer in `employer_ids`, once each and in order.
/// Per-employer failures are recorded in the summary and never stop the run.
pub async fn run(
    pool: &AnyPool,
    source: &dyn VacancySource,
    employer_ids: &[String],
    options: &IngestOptions,
) -> IngestSummary {
    let started_at = Utc::now();
    tracing::info!(
        "Ingesting {} employers (page delay {:?}, on record error: {:?})",
        employer_ids.len(),
        options.page_delay,
        options.batch_policy
    );

    let mut employers = Vec::with_capacity(employer_ids.len());
    for employer_id in employer_ids {
        let outcome = ingest_employer(pool, source, employer_id, options).await;
        match &outcome {
            EmployerOutcome::Ingested {
                pages,
                vacancies,
                failed_records,
            } => tracing::info!(
                "Employer {employer_id}: {vacancies} vacancies saved from {pages} pages, {failed_records} skipped"
            ),
            EmployerOutcome::Skipped { reason } => {
                tracing::warn!("Employer {employer_id} skipped: {reason}")
            }
            EmployerOutcome::Failed { error, .. } => {
                tracing::error!("Employer {employer_id} failed: {error}")
            }
        }
        employers.push(EmployerReport {
            employer_id: employer_id.clone(),
            outcome,
        });
    }

    let summary = IngestSummary {
        started_at,
        finished_at: Utc::now(),
        employers,
    };
    tracing::info!(
        "Ingest finished in {}ms: {} ingested, {} skipped, {} failed, {} vacancies saved",
        (summary.finished_at - summary.started_at).num_milliseconds(),
        summary.ingested(),
        summary.skipped(),
        summary.failed(),
        summary.vacancies()
    );
    summary
}

async fn ingest_employer(
    pool: &AnyPool,
    source: &dyn VacancySource,
    employer_id: &str,
    options: &IngestOptions,
) -> EmployerOutcome {
    let employer = match source.fetch_employer(employer_id).await {
        Ok(Some(employer)) => employer,
        Ok(None) => {
            return EmployerOutcome::Skipped {
                reason: "employer not found".to_string(),
            };
        }
        Err(e) => {
            return EmployerOutcome::Skipped {
                reason: e.to_string(),
            };
        }
    };

    if let Err(e) = Employer::upsert(pool, &employer).await {
        return EmployerOutcome::Failed {
            pages: 0,
            vacancies: 0,
            error: e.to_string(),
        };
    }

    let mut page = 0u32;
    let mut vacancies = 0usize;
    let mut failed_records = 0usize;

    loop {
        let batch = match source.fetch_vacancy_page(employer_id, page).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!("Employer {employer_id}: page {page} unavailable, stopping: {e}");
                break;
            }
        };
        if batch.is_empty() {
            break;
        }

        tracing::debug!(
            "Employer {employer_id}: page {page} has {} vacancies",
            batch.items.len()
        );
        match Vacancy::upsert_batch(pool, &batch.items, options.batch_policy).await {
            Ok(outcome) => {
                vacancies += outcome.upserted;
                failed_records += outcome.failed;
            }
            Err(aborted) => {
                return EmployerOutcome::Failed {
                    pages: page,
                    vacancies: vacancies + aborted.saved,
                    error: aborted.error.to_string(),
                };
            }
        }

        page += 1;
        tokio::time::sleep(options.page_delay).await;
    }

    EmployerOutcome::Ingested {
        pages: page,
        vacancies,
        failed_records,
    }
}
