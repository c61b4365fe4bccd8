//! Build a public key to endpoint map from a node's peer list.

use clap::Parser;
use log::LevelFilter;
use nodewatch_crawler::{
    CatalogError, ClientConfiguration, NodeCatalog, PeersMapBuilder, RestClient,
};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing the resources.toml node catalog.
    #[arg(short, long)]
    resources: PathBuf,

    /// Saved peer list to read instead of querying a node (optional).
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file for the peers map.
    #[arg(short, long, default_value = "peers_map.json")]
    output: PathBuf,

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
    let mut builder = PeersMapBuilder::new(catalog.network());

    match args.input {
        Some(input) => {
            builder.build_from_file(&input)?;
        }
        None => {
            let node = catalog
                .find_all_by_role(None)
                .into_iter()
                .next()
                .ok_or(CatalogError::EmptyNodeList)?;

            let mut configuration =
                ClientConfiguration::default().with_timeout(Duration::from_secs(args.timeout));
            if let Some(certs) = args.certs {
                configuration = configuration.with_certificate_directory(certs);
            }

            let client = RestClient::new(catalog.network(), &node.host, &configuration)?;
            builder.build_from_client(&client).await?;
        }
    }

    log::info!("saving peers map to {}", args.output.display());
    let mut json = serde_json::to_string_pretty(builder.peers_map())?;
    json.push('\n');
    fs::write(&args.output, json)?;

    Ok(())
}
