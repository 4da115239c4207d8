use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use swipr_core::domain::queue::{QueueMetadata, QueueSource, Sentiment};
use swipr_core::error::QueueError;
use swipr_core::queue::QueueStore;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "swipr")]
struct Args {
    /// Directory holding the persisted queue. Overrides SWIPR_STORAGE_DIR.
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Queue one symbol (any casing or alias).
    Add {
        symbol: String,
        #[arg(long)]
        source: Option<QueueSource>,
        #[arg(long)]
        sentiment: Option<Sentiment>,
    },
    /// Queue several symbols in order; unknowns and duplicates are skipped.
    AddMany {
        #[arg(required = true)]
        symbols: Vec<String>,
        #[arg(long)]
        source: Option<QueueSource>,
        #[arg(long)]
        sentiment: Option<Sentiment>,
    },
    Remove {
        symbol: String,
    },
    /// Empty the queue. Requires --yes.
    Clear {
        #[arg(long)]
        yes: bool,
    },
    List,
    Check {
        symbol: String,
    },
    /// Queue joined with catalog metadata.
    Stocks,
    Metrics,
    /// Move the given symbols to the front of the queue.
    Reorder {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Print the canonical symbol for a raw input, or null.
    Resolve {
        raw: String,
    },
    Catalog,
    /// Queue items joined with catalog records and summary stats.
    Export,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = swipr_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if let Some(dir) = args.storage_dir {
        settings.storage_dir = Some(dir);
    }

    let queue = settings.open_queue();
    let result = run(&queue, args.command);
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "command failed");
    }
    result
}

fn run(queue: &QueueStore, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Add {
            symbol,
            source,
            sentiment,
        } => {
            match queue.add(&symbol, QueueMetadata { source, sentiment }) {
                Ok(item) => print_json(&item),
                Err(err) => ignored(queue, err),
            }
        }
        Command::AddMany {
            symbols,
            source,
            sentiment,
        } => {
            let inserted = queue.add_many(&symbols, QueueMetadata { source, sentiment });
            print_json(&serde_json::json!({
                "inserted": inserted,
                "queue": queue.snapshot(),
            }))
        }
        Command::Remove { symbol } => {
            if let Err(err) = queue.remove(&symbol) {
                return ignored(queue, err);
            }
            print_json(&queue.snapshot())
        }
        Command::Clear { yes } => {
            anyhow::ensure!(yes, "refusing to clear the queue without --yes");
            queue.clear();
            print_json(&queue.snapshot())
        }
        Command::List => print_json(&queue.snapshot()),
        Command::Check { symbol } => print_json(&serde_json::json!({
            "symbol": symbol,
            "present": queue.is_present(&symbol),
        })),
        Command::Stocks => print_json(&queue.stocks()),
        Command::Metrics => print_json(&queue.metrics()),
        Command::Reorder { symbols } => {
            let changed = queue.reorder(symbols.as_slice());
            print_json(&serde_json::json!({
                "changed": changed,
                "queue": queue.snapshot(),
            }))
        }
        Command::Resolve { raw } => {
            let canonical = swipr_core::canonical::resolve(queue.catalog(), &raw);
            print_json(&serde_json::json!({ "raw": raw, "canonical": canonical }))
        }
        Command::Catalog => print_json(&queue.catalog().all_stocks()),
        Command::Export => print_json(&queue.export()),
    }
}

/// Unknown or absent symbols are not failures: the queue is left as it was
/// and printed unchanged.
fn ignored(queue: &QueueStore, err: QueueError) -> anyhow::Result<()> {
    match err {
        QueueError::UnknownSymbol { .. } | QueueError::NotFound { .. } => {
            tracing::debug!(error = %err, "ignoring queue input");
            print_json(&queue.snapshot())
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{out}");
    Ok(())
}

fn init_sentry(settings: &swipr_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
