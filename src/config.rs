use std::time::Duration;

use clap::Parser;

use crate::collectors::hh::{
    DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, HhClientConfig,
};
use crate::collectors::runner::{DEFAULT_PAGE_DELAY, IngestOptions};
use crate::models::vacancy::BatchPolicy;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "employer-vacancies",
    about = "Collects hh.ru employers and vacancies into a database and reports on them"
)]
pub struct Config {
    /// Database connection URL (postgres://... or sqlite:...)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Create the database and tables on startup if they are missing
    #[arg(long, env = "CREATE_SCHEMA", default_value_t = true, action = clap::ArgAction::Set)]
    pub create_schema: bool,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the database and tables, then exit
    Init,
    /// Fetch employers and their vacancies from the API into the database
    Ingest(IngestArgs),
    /// Interactive report menu (default when no subcommand given)
    Menu,
}

#[derive(clap::Args, Debug, Clone)]
pub struct IngestArgs {
    /// Employer IDs to ingest, in order
    #[arg(
        long = "employer",
        env = "EMPLOYER_IDS",
        value_delimiter = ',',
        default_values = [
            "3007832", "6780", "5179427", "10832855", "1684993", "5179890",
            "4295296", "1840251", "10684958", "4138182", "67611",
        ]
    )]
    pub employer_ids: Vec<String>,

    /// Base URL of the vacancy API
    #[arg(long, env = "API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub api_base_url: String,

    /// User-Agent sent with every API request
    #[arg(long, env = "API_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "API_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Delay between successive vacancy page requests, in milliseconds
    #[arg(long, env = "PAGE_DELAY_MS", default_value_t = DEFAULT_PAGE_DELAY.as_millis() as u64)]
    pub page_delay_ms: u64,

    /// What to do when a single vacancy in a page fails to save
    #[arg(long, env = "ON_RECORD_ERROR", value_enum, default_value_t = BatchPolicy::AbortPage)]
    pub on_record_error: BatchPolicy,
}

impl Config {
    /// Resolve the command, defaulting to Menu if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Menu)
    }
}

impl IngestArgs {
    pub fn client_config(&self) -> HhClientConfig {
        HhClientConfig {
            base_url: self.api_base_url.trim_end_matches('/').to_string(),
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn options(&self) -> IngestOptions {
        IngestOptions {
            page_delay: Duration::from_millis(self.page_delay_ms),
            batch_policy: self.on_record_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_menu_without_subcommand() {
        let config = Config::try_parse_from(["employer-vacancies", "--database-url", "sqlite::memory:"])
            .unwrap();
        assert!(config.create_schema);
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(matches!(config.resolved_command(), Command::Menu));
    }

    #[test]
    fn ingest_defaults_cover_the_original_employer_list() {
        let config = Config::try_parse_from([
            "employer-vacancies",
            "--database-url",
            "sqlite::memory:",
            "ingest",
        ])
        .unwrap();
        let Command::Ingest(args) = config.resolved_command() else {
            panic!("expected ingest command");
        };
        assert_eq!(args.employer_ids.len(), 11);
        assert_eq!(args.employer_ids.last().map(String::as_str), Some("67611"));

        let options = args.options();
        let defaults = IngestOptions::default();
        assert_eq!(options.page_delay, Duration::from_millis(500));
        assert_eq!(options.page_delay, defaults.page_delay);
        assert_eq!(options.batch_policy, defaults.batch_policy);

        let client = args.client_config();
        let client_defaults = HhClientConfig::default();
        assert_eq!(client.base_url, "https://api.hh.ru");
        assert_eq!(client.base_url, client_defaults.base_url);
        assert_eq!(client.user_agent, client_defaults.user_agent);
        assert_eq!(client.timeout, client_defaults.timeout);
    }

    #[test]
    fn ingest_accepts_comma_separated_ids_and_overrides() {
        let config = Config::try_parse_from([
            "employer-vacancies",
            "--database-url",
            "sqlite::memory:",
            "ingest",
            "--employer",
            "1,2,3",
            "--page-delay-ms",
            "0",
            "--api-base-url",
            "http://localhost:9000/",
            "--on-record-error",
            "skip-record",
        ])
        .unwrap();
        let Command::Ingest(args) = config.resolved_command() else {
            panic!("expected ingest command");
        };
        assert_eq!(args.employer_ids, vec!["1", "2", "3"]);
        assert_eq!(args.options().page_delay, Duration::ZERO);
        assert_eq!(args.options().batch_policy, BatchPolicy::SkipRecord);
        assert_eq!(args.client_config().base_url, "http://localhost:9000");
    }
}
