use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::collectors::{PER_PAGE, VacancyPage, VacancySource};
use crate::error::AppError;
use crate::models::employer::Employer;
use crate::models::report::NOT_SPECIFIED;
use crate::models::vacancy::Vacancy;

pub const DEFAULT_BASE_URL: &str = "https://api.hh.ru";
pub const DEFAULT_USER_AGENT: &str = "employer-vacancies/0.1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct HhClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for HhClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// hh.ru public API client.
pub struct HhClient {
    client: Client,
    base_url: String,
}

impl HhClient {
    pub fn new(config: &HhClientConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// GET a JSON document. Non-success statuses and undecodable bodies come back as
    /// `Ok(None)`; only a failure to talk to the server is an error.
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Option<Value>, AppError> {
        let resp = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!("{url} returned {status}");
            return Ok(None);
        }

        let body = resp.bytes().await?;
        match serde_json::from_slice::<Value>(&body) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                tracing::warn!("Failed to parse response from {url}: {e}");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl VacancySource for HhClient {
    async fn fetch_employer(&self, employer_id: &str) -> Result<Option<Employer>, AppError> {
        let url = format!("{}/employers/{employer_id}", self.base_url);
        let data = self.get_json(&url, &[]).await?;
        Ok(data.as_ref().and_then(parse_employer))
    }

    async fn fetch_vacancy_page(
        &self,
        employer_id: &str,
        page: u32,
    ) -> Result<VacancyPage, AppError> {
        let url = format!("{}/vacancies", self.base_url);
        let query = [
            ("employer_id", employer_id.to_string()),
            ("page", page.to_string()),
            ("per_page", PER_PAGE.to_string()),
        ];
        let data = self.get_json(&url, &query).await?;
        Ok(data.as_ref().map(parse_vacancy_page).unwrap_or_default())
    }
}

/// Parse an `/employers/{id}` response. Requires an `id`; everything else is defaulted.
pub fn parse_employer(data: &Value) -> Option<Employer> {
    let employer_id = id_string(data.get("id")?)?;

    Some(Employer {
        employer_id,
        employer_name: str_or_placeholder(data.get("name")),
        employer_url: Some(str_or_placeholder(data.get("alternate_url"))),
        employer_open_vacancy: data
            .get("open_vacancies")
            .and_then(|v| v.as_i64())
            .unwrap_or(0),
    })
}

/// Parse a `/vacancies` response. A missing or non-array `items` is an empty page.
pub fn parse_vacancy_page(data: &Value) -> VacancyPage {
    let Some(raw_items) = data.get("items").and_then(|v| v.as_array()) else {
        return VacancyPage::default();
    };

    let mut items = Vec::with_capacity(raw_items.len());
    for raw in raw_items {
        match parse_vacancy(raw) {
            Some(vacancy) => items.push(vacancy),
            None => tracing::warn!("Dropping vacancy without an id: {raw}"),
        }
    }
    VacancyPage { items }
}

/// Parse a single vacancy item. Requires an `id`.
pub fn parse_vacancy(raw: &Value) -> Option<Vacancy> {
    let vacancy_id = id_string(raw.get("id")?)?;
    let employer = raw.get("employer");
    let (salary_min, salary_max) = extract_salary(raw.get("salary"));

    Some(Vacancy {
        vacancy_id,
        vacancy_name: str_or_placeholder(raw.get("name")),
        employer_name: str_or_placeholder(employer.and_then(|e| e.get("name"))),
        employer_id: employer
            .and_then(|e| e.get("id"))
            .and_then(id_string)
            .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        salary_min: Some(salary_min),
        salary_max: Some(salary_max),
        vacancy_url: Some(str_or_placeholder(raw.get("alternate_url"))),
        requirement_vacancy: Some(str_or_placeholder(
            raw.get("snippet").and_then(|s| s.get("requirement")),
        )),
    })
}

/// Salary bounds with absent or null values coerced to 0.
fn extract_salary(salary: Option<&Value>) -> (i64, i64) {
    let bound = |key: &str| {
        salary
            .and_then(|s| s.get(key))
            .and_then(|v| v.as_f64())
            .map(|v| v as i64)
            .unwrap_or(0)
    };
    (bound("from"), bound("to"))
}

/// IDs arrive as strings, but accept bare numbers too.
fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn str_or_placeholder(v: Option<&Value>) -> String {
    v.and_then(|v| v.as_str())
        .unwrap_or(NOT_SPECIFIED)
        .to_string()
}
