use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use debitwatch::config::AppConfig;
use debitwatch::helpers::clock::{Clock, SystemClock};
use debitwatch::helpers::gmail_auth::GmailTokenProvider;
use debitwatch::integrations::{GmailClient, MailSource};
use debitwatch::jobs::{summarize_store, PipelineSettings, TransactionPipeline};
use debitwatch::reports::{ErrorReport, SummaryRenderer};
use debitwatch::storage::SqliteTransactionStore;
use debitwatch::Database;
use extractors::DebitNotificationExtractor;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file, defaults to the per-user config directory
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    log_file_path: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Import new debit notifications and mail the summary
    Run,
    /// Print the summary of stored transactions
    Summary,
    /// List mailbox labels with their ids
    Labels,
    /// Print the effective configuration
    Config,
}

fn init_tracing(log_file_path: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = std::path::Path::new(log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("debitwatch.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.log_file_path.as_deref());

    let (config, config_path) = match AppConfig::load(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            std::process::exit(2);
        }
    };
    tracing::info!("Using config at {:?}", config_path);

    let command = args.command.unwrap_or(Command::Run);
    let result = match command {
        Command::Run => run(&config).await,
        Command::Summary => summary(&config).await,
        Command::Labels => labels(&config).await,
        Command::Config => print_config(&config),
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn gmail_client(config: &AppConfig) -> Result<GmailClient> {
    let tokens = GmailTokenProvider::from_files(
        &config.gmail.user_id,
        &config.gmail.client_secret_path,
        &config.gmail.token_path,
    )
    .await
    .context("Failed to load Gmail credentials")?;
    GmailClient::new(tokens, &config.gmail.user_id)
}

fn transaction_store(config: &AppConfig) -> Result<SqliteTransactionStore> {
    let db_path = config.database_path()?;
    let db = Database::new(&db_path)
        .with_context(|| format!("Failed to open database at {:?}", db_path))?;
    tracing::info!("Database initialized at: {:?}", db_path);
    Ok(SqliteTransactionStore::new(db.async_connection))
}

fn extractor(config: &AppConfig, clock: &dyn Clock) -> Result<DebitNotificationExtractor> {
    let offset = *clock.now().offset();
    match config.pipeline.amount_pattern.as_deref() {
        Some(pattern) => DebitNotificationExtractor::with_pattern(pattern, offset),
        None => Ok(DebitNotificationExtractor::new(offset)),
    }
}

async fn run(config: &AppConfig) -> Result<()> {
    let mail: Arc<dyn MailSource> = Arc::new(gmail_client(config).await?);

    let outcome = async {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let pipeline = TransactionPipeline::new(
            mail.clone(),
            Arc::new(transaction_store(config)?),
            clock.clone(),
            extractor(config, clock.as_ref())?,
            PipelineSettings::from_config(config)?,
        );
        pipeline.run().await
    }
    .await;

    match outcome {
        Ok(report) => {
            tracing::info!(
                "Run finished: {} saved, {} skipped, month total {}円",
                report.processed,
                report.skipped.len(),
                report.summary.month.total
            );
            Ok(())
        }
        Err(e) => {
            send_error_report(config, mail.as_ref(), &e).await;
            Err(e)
        }
    }
}

async fn send_error_report(config: &AppConfig, mail: &dyn MailSource, error: &anyhow::Error) {
    let recipient = match config.recipient() {
        Ok(recipient) => recipient,
        Err(e) => {
            tracing::warn!("Not sending error report: {}", e);
            return;
        }
    };

    let email = ErrorReport::from_error(error).into_email(recipient, &config.notification.sender);
    match mail.send(&email).await {
        Ok(()) => tracing::info!("Sent error report to {}", recipient),
        Err(e) => tracing::error!("Failed to send error report: {:#}", e),
    }
}

async fn summary(config: &AppConfig) -> Result<()> {
    let store = transaction_store(config)?;
    let summary = summarize_store(&store, &SystemClock).await?;
    print!("{}", SummaryRenderer::to_text(&summary));
    Ok(())
}

async fn labels(config: &AppConfig) -> Result<()> {
    let client = gmail_client(config).await?;
    for label in client.list_labels().await? {
        println!(
            "{}\t{}\t{}",
            label.id,
            label.name,
            label.label_type.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn print_config(config: &AppConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
    print!("{}", rendered);
    Ok(())
}
