//! schemaview CLI entry point.

use std::{fs, path::PathBuf, process, str::FromStr, sync::Arc};

use clap::Parser;
use log::{LevelFilter, debug, error, info, warn};

use schemaview::config::AppConfig;
use schemaview::error::AppError;
use schemaview::{
    CatalogSource, ConnectionHandle, FileStore, MemoryStore, PositionStore, SchemaSession,
    SortedSchema,
};

/// Command-line arguments for the schema layout tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON table catalog
    #[arg(help = "Path to the catalog file")]
    catalog: String,

    /// Schema to lay out (default: first in the catalog)
    #[arg(short, long)]
    schema: Option<String>,

    /// JSON file holding saved pages and positions
    #[arg(long)]
    store: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Re-layout tables that already have positions
    #[arg(long)]
    resort: bool,

    /// Restrict the re-layout to one page
    #[arg(long)]
    page: Option<i32>,

    /// Save table views and pages after layout
    #[arg(long)]
    save: bool,

    /// Output file for the JSON view model (default: stdout)
    #[arg(short, long)]
    output: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    debug!(args:?; "Parsed arguments");

    if let Err(err) = run(&args) {
        error!("{err}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), AppError> {
    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let source = CatalogSource::from_path(&args.catalog)?;
    let label = match &args.schema {
        Some(label) => label.clone(),
        None => source.schema_labels().next().unwrap_or_default().to_string(),
    };

    let store: Arc<dyn PositionStore> = match args.store.as_ref().or(config.store.path.as_ref()) {
        Some(path) => Arc::new(FileStore::new(path)),
        None => Arc::new(MemoryStore::new()),
    };

    let mut session = SchemaSession::new();
    for id in source.schema_labels() {
        session.register(id, ConnectionHandle::new(id, args.catalog.clone()));
    }

    info!(catalog = args.catalog, schema = label; "Preparing schema");
    let mut schema = SortedSchema::with_config(Arc::new(source), store, &config.layout);
    let outcome = schema.prepare_schema(&mut session, &label);
    if let Some(err) = outcome.warning {
        return Err(err.into());
    }

    if args.resort || args.page.is_some() {
        schema.resort_table_views(args.resort, args.page)?;
    }

    if args.save {
        schema.save_table_views()?;
    } else if args.store.is_none() && config.store.path.is_none() {
        warn!("No store configured; positions are not persisted");
    }

    let json = serde_json::to_string_pretty(&schema.state().view_model())?;
    match &args.output {
        Some(path) => {
            fs::write(path, json)?;
            info!(output_file = path; "View model written");
        }
        None => println!("{json}"),
    }

    Ok(())
}
