//! Tracker MCP server binary.
//!
//! Opens (and bootstraps) the SQLite database, then serves the MCP tools
//! over Streamable HTTP.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use miette::Diagnostic;
use thiserror::Error;
use tracker::api::{self, ApiError, Config, get_db_path, init_tracing};
use tracker::db::{BUNDLED_SCHEMA, DbError, SqliteDatabase, StatementFailurePolicy};

#[derive(Error, Diagnostic, Debug)]
enum ServerError {
    #[error("Database error: {0}")]
    #[diagnostic(code(tracker::server::database))]
    Database(#[from] DbError),

    #[error("Failed to read schema file {path}: {source}")]
    #[diagnostic(code(tracker::server::schema))]
    Schema {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    #[diagnostic(code(tracker::server::api))]
    Api(#[from] ApiError),
}

#[derive(Parser)]
#[command(name = "tracker-mcp")]
#[command(author, version, about = "Project tracker MCP server", long_about = None)]
struct Cli {
    /// Host address to bind to
    #[arg(long, env = "TRACKER_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Database file path (defaults to ~/.local/share/tracker/tracker.db)
    #[arg(long, env = "DB_PATH")]
    db: Option<PathBuf>,

    /// Schema script to run at startup instead of the bundled one
    #[arg(long, env = "TRACKER_SCHEMA")]
    schema: Option<PathBuf>,

    /// Serve requests that carry no known session id
    #[arg(
        long,
        env = "TRACKER_STATELESS",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    stateless: bool,
}

fn load_schema(path: Option<&PathBuf>) -> Result<String, ServerError> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| ServerError::Schema {
            path: path.display().to_string(),
            source,
        }),
        None => Ok(BUNDLED_SCHEMA.to_string()),
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    // Before open and bootstrap so their events are not dropped.
    init_tracing();
    run(cli).await?;
    Ok(())
}

async fn run(cli: Cli) -> Result<(), ServerError> {
    let schema = load_schema(cli.schema.as_ref())?;
    let db_path = cli.db.unwrap_or_else(get_db_path);

    println!("Opening database at {}", db_path.display());
    let db = SqliteDatabase::open(&db_path).await?;

    let report = db
        .bootstrap(&schema, StatementFailurePolicy::Ignore)
        .await?;
    println!(
        "Schema applied: {} statements executed, {} ignored",
        report.executed, report.failed
    );

    api::run(
        Config {
            host: cli.host,
            port: cli.port,
            stateless: cli.stateless,
        },
        db,
    )
    .await?;

    Ok(())
}
