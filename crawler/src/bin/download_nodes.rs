//! Crawl a NEM or Symbol network and save every reachable node.

use clap::Parser;
use log::LevelFilter;
use nodewatch_crawler::{writer, CrawlerBuilder, NodeCatalog, DEFAULT_WORKER_COUNT};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing the resources.toml node catalog.
    #[arg(short, long)]
    resources: PathBuf,

    /// Output file for the discovered nodes.
    #[arg(short, long, default_value = "nodes.json")]
    output: PathBuf,

    /// Number of concurrent workers.
    #[arg(short, long, default_value_t = DEFAULT_WORKER_COUNT)]
    thread_count: usize,

    /// Request timeout in seconds.
    #[arg(long, default_value = "20")]
    timeout: u64,

    /// Directory containing the client certificate (optional).
    #[arg(short, long)]
    certs: Option<PathBuf>,

    /// Log level.
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] {} - {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log_level)
        .chain(std::io::stderr())
        .apply()?;

    let catalog = NodeCatalog::load(&args.resources)?;
    log::info!("CRAWLING THE {} NETWORK", catalog.network().as_str().to_uppercase());

    let mut builder = CrawlerBuilder::new(catalog.network())
        .with_worker_count(args.thread_count)
        .with_timeout(Duration::from_secs(args.timeout))
        .with_currency_mosaic_id(catalog.currency_mosaic_id());
    if let Some(certs) = args.certs {
        log::debug!("Using client certificate from {}", certs.display());
        builder = builder.with_certificate_directory(certs);
    }

    log::debug!("Using {} concurrent workers", args.thread_count);
    let mut crawler = builder.build()?;
    crawler.seed(&catalog)?;

    let results = crawler.run().await?;
    writer::save(&results, &args.output)?;

    Ok(())
}
