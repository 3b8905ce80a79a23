//! daylist server binary.

use anyhow::Result;
use clap::Parser;
use daylist::api::{AppState, start_server};
use daylist::db::Database;
use daylist::glean::GleanClient;
use daylist::store::TodoStore;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Personal daily to-do list server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(short, long, default_value = "daylist.db")]
    database: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    let db = Database::open(&cli.database)?;
    tracing::info!("opened database at {}", cli.database);

    let store: Arc<dyn TodoStore> = Arc::new(db);
    let state = AppState::new(store, GleanClient::new());

    start_server(state, cli.port).await
}
