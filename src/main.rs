//! cachegroup
//!
//! Looks keys up through a load-through cache group backed by a JSON or YAML
//! record file, then reports the group's statistics.
//!
//! ```text
//! cachegroup --db scores.json --cache-bytes 2048 Tom Jack Tom unknown
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cachegroup::{metrics, Exporter, Group, GroupRegistry, MapLoader};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Byte-bounded load-through cache lookups
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Record file backing the loader (.json, .yaml or .yml); built-in sample records if omitted
    #[arg(long, env = "CACHEGROUP_DB")]
    db: Option<PathBuf>,

    /// Group name
    #[arg(long, env = "CACHEGROUP_NAME", default_value = "scores")]
    name: String,

    /// Cache budget in bytes (0 or negative for unbounded)
    #[arg(
        long,
        env = "CACHEGROUP_CACHE_BYTES",
        default_value = "2048",
        allow_hyphen_values = true
    )]
    cache_bytes: i64,

    /// Number of passes over the key list
    #[arg(long, env = "CACHEGROUP_REPEAT", default_value = "1")]
    repeat: usize,

    /// Serve /metrics on this address after the lookups until Ctrl-C
    #[arg(long, env = "CACHEGROUP_METRICS_ADDR")]
    metrics_addr: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CACHEGROUP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "CACHEGROUP_LOG_JSON")]
    log_json: bool,

    /// Keys to look up
    #[arg(required = true)]
    keys: Vec<String>,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let loader = match &args.db {
        Some(path) => MapLoader::from_file(path)
            .with_context(|| format!("failed to load records from {}", path.display()))?,
        None => sample_records(),
    };

    info!("Starting cachegroup");
    info!("  Group: {}", args.name);
    info!("  Cache bytes: {}", args.cache_bytes);
    info!("  Records: {}", loader.len());

    let group = Group::new(args.name.clone(), args.cache_bytes, loader);
    let (group, _) = GroupRegistry::global().register(group);

    for _ in 0..args.repeat {
        for key in &args.keys {
            match group.get(key) {
                Ok(view) => println!("{}={}", key, view),
                Err(e) => println!("{}: {}", key, e),
            }
        }
    }

    let stats = serde_json::to_string_pretty(&group.stats()).context("failed to encode stats")?;
    println!("{}", stats);

    if let Some(addr) = &args.metrics_addr {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind metrics server on {}", addr))?;
        let exporter = Arc::new(Exporter::new()?);

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
            }
        };
        metrics::serve(listener, exporter, GroupRegistry::global(), shutdown).await?;
    }

    Ok(())
}

/// Records used when no `--db` is given
fn sample_records() -> MapLoader {
    [("Tom", "630"), ("Jack", "589"), ("Sam", "567")]
        .into_iter()
        .collect()
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    if let Ok(directive) = "hyper=warn".parse() {
        filter = filter.add_directive(directive);
    }

    // stdout carries lookup results
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
