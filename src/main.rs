use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{error, info};

use acai_analytics::{
    analytics::Locale,
    cache::FactCache,
    config::{self, AppConfig},
    db::{self, DbPool},
    queries::LoadRequest,
    reports::{CustomerReport, OverviewReport, PaymentReport, ProductReport, TemporalReport},
    services::{IngestionService, SalesQueryService},
    ServiceError,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", failure_message(&err));
            ExitCode::FAILURE
        }
    }
}

/// Input mistakes get the short user-facing message; anything else keeps its full chain.
fn failure_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ServiceError>() {
        Some(service_err) if service_err.is_user_error() => service_err.user_message(),
        _ => format!("{err:#}"),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Migrate => {
            db::run_migrations(&context.db)
                .await
                .context("failed to run migrations")?;
            println!("Schema is up to date");
        }
        Commands::Ingest(args) => handle_ingest(&context, args).await?,
        Commands::Options => {
            let options = context
                .queries
                .filter_options()
                .await
                .context("failed to discover filter options")?;
            print_json(&options)?;
        }
        Commands::Report(args) => handle_report(&context, args, cli.locale.into()).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "acai-analytics", about = "Sales analytics for the açaí shop", version)]
struct Cli {
    /// Language of weekday and month labels
    #[arg(long, global = true, value_enum, default_value_t = LocaleArg::Pt)]
    locale: LocaleArg,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the sales schema
    Migrate,
    /// Load the flat sales ledger into storage
    Ingest(IngestArgs),
    /// List payment methods, customers and the stored date span
    Options,
    /// Print a page report as JSON
    Report(ReportArgs),
}

#[derive(Args)]
struct IngestArgs {
    /// CSV source; defaults to the configured `source_path`
    #[arg(long)]
    source: Option<PathBuf>,
}

#[derive(Args)]
struct ReportArgs {
    #[arg(value_enum)]
    kind: ReportKind,
    /// First day (YYYY-MM-DD); defaults to the earliest stored sale
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day, inclusive; defaults to the latest stored sale
    #[arg(long)]
    end: Option<NaiveDate>,
    #[arg(long = "payment")]
    payment_methods: Vec<String>,
    #[arg(long = "customer")]
    customers: Vec<String>,
    /// Product drill-down for the `products` report
    #[arg(long)]
    product: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportKind {
    Overview,
    Customers,
    Payments,
    Temporal,
    Products,
}

#[derive(Clone, Copy, ValueEnum)]
enum LocaleArg {
    En,
    Pt,
}

impl From<LocaleArg> for Locale {
    fn from(arg: LocaleArg) -> Self {
        match arg {
            LocaleArg::En => Locale::English,
            LocaleArg::Pt => Locale::Portuguese,
        }
    }
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
    queries: SalesQueryService,
    ingestion: IngestionService,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        if config.auto_migrate {
            db::run_migrations(&db_pool).await.map_err(|e| {
                error!("Failed running migrations: {}", e);
                e
            })?;
        }
        let db = Arc::new(db_pool);

        let cache = FactCache::from_config(config.cache());
        let queries = SalesQueryService::new(db.clone(), cache.clone())
            .with_window_days(config.default_window_days);
        let ingestion = IngestionService::new(db.clone(), cache, config.insert_batch_size);

        Ok(Self {
            config,
            db,
            queries,
            ingestion,
        })
    }
}

async fn handle_ingest(context: &CliContext, args: IngestArgs) -> Result<()> {
    let source = args
        .source
        .unwrap_or_else(|| context.config.source_path.clone());
    info!("Ingesting {}", source.display());

    let report = context
        .ingestion
        .ingest_file(&source)
        .await
        .with_context(|| format!("ingestion of {} failed", source.display()))?;
    print_json(&report)
}

async fn handle_report(context: &CliContext, args: ReportArgs, locale: Locale) -> Result<()> {
    let (start, end) = match (args.start, args.end) {
        (Some(start), Some(end)) => (start, end),
        (start, end) => {
            let options = context
                .queries
                .filter_options()
                .await
                .context("failed to discover the stored date span")?;
            (
                start.unwrap_or(options.min_date),
                end.unwrap_or(options.max_date),
            )
        }
    };

    let request = LoadRequest::from_parts(start, end, args.payment_methods, args.customers)?;
    let facts = context
        .queries
        .load_enriched(&request)
        .await
        .context("failed to load sales")?;

    match args.kind {
        ReportKind::Overview => print_json(&OverviewReport::build(&facts)),
        ReportKind::Customers => print_json(&CustomerReport::build(&facts)),
        ReportKind::Payments => print_json(&PaymentReport::build(&facts)),
        ReportKind::Temporal => print_json(&TemporalReport::build(&facts, locale)),
        ReportKind::Products => {
            print_json(&ProductReport::build(&facts, args.product.as_deref()))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
