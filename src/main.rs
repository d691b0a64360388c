use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use employer_vacancies::collectors::hh::HhClient;
use employer_vacancies::collectors::runner;
use employer_vacancies::config::{Command, Config, LogFormat};
use employer_vacancies::{db, menu};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("employer_vacancies=info"));
    // Logs go to stderr so they never interleave with menu output on stdout.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format);

    let command = config.resolved_command();

    if config.create_schema || matches!(command, Command::Init) {
        db::ensure_database(&config.database_url)
            .await
            .context("Failed to create database")?;
    }

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    if config.create_schema || matches!(command, Command::Init) {
        tracing::info!("Creating tables...");
        db::create_schema(&pool)
            .await
            .context("Failed to create tables")?;
    }

    match command {
        Command::Init => {
            tracing::info!("Database ready");
        }
        Command::Ingest(args) => {
            let client = HhClient::new(&args.client_config())?;
            let summary =
                runner::run(&pool, &client, &args.employer_ids, &args.options()).await;
            if config.log_format == LogFormat::Json {
                let report = serde_json::to_string(&summary)
                    .context("Failed to serialize ingest summary")?;
                tracing::info!(summary = %report, "Ingest summary");
            }
            if summary.ingested() == 0 && !summary.employers.is_empty() {
                anyhow::bail!("No employer could be ingested");
            }
        }
        Command::Menu => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            menu::run(&pool, stdin, tokio::io::stdout()).await?;
        }
    }

    pool.close().await;
    Ok(())
}
