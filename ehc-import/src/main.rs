//! ehc-import - member and staff migration CLI
//!
//! Subcommands:
//! - `members <source>`: reconcile a member export into the database
//! - `sql-script <source> --out <file>`: write the production update script
//! - `staff <source>`: import the staff directory
//! - `grant-admin <email>`: register an active admin
//!
//! `<source>` is a file path or an http(s) URL.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use ehc_common::config::{resolve_database_path, TomlConfig};
use ehc_common::db::init_database;
use ehc_common::db::staff::add_admin_user;
use ehc_import::member_row::MemberRow;
use ehc_import::source::load_source;
use ehc_import::sql_script::generate_update_script;
use ehc_import::staff_import::import_staff;
use ehc_import::{import_members, parse_csv, CsvRow};
use tracing::{info, warn};

/// Command-line arguments for ehc-import
///
/// Database location falls back to `EHC_DATABASE`, `EHC_ROOT_FOLDER`, the
/// config file and finally the platform data directory.
#[derive(Parser, Debug)]
#[command(name = "ehc-import")]
#[command(about = "Member and staff data migration for Even House Club")]
#[command(version)]
struct Args {
    /// Database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Root folder holding ehc.db
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile a member CSV into the users table
    Members {
        source: String,

        /// Also write the production update script here
        #[arg(long, value_name = "FILE")]
        sql_out: Option<PathBuf>,
    },

    /// Generate the production update script without touching the database
    SqlScript {
        source: String,

        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },

    /// Import the staff directory CSV
    Staff {
        source: String,

        /// Email to leave out (repeatable)
        #[arg(long = "exclude", value_name = "EMAIL")]
        exclude: Vec<String>,
    },

    /// Register (or re-activate) an admin
    GrantAdmin {
        email: String,

        #[arg(long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = TomlConfig::load();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.as_str().into()),
        )
        .init();

    info!("Starting ehc-import v{}", env!("CARGO_PKG_VERSION"));

    if let Command::SqlScript { source, out } = &args.command {
        return write_sql_script(source, out).await;
    }

    let db_path = resolve_database_path(
        args.database.as_deref(),
        args.root_folder.as_deref(),
        &toml_config,
    );
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    match args.command {
        Command::Members { source, sql_out } => {
            let content = load_source(&source).await?;
            let rows = parse_csv(&content);

            let report = import_members(&pool, &rows).await?;
            if !report.errors.is_empty() {
                warn!("{} rows failed; see errors above", report.errors.len());
            }

            if let Some(out) = sql_out {
                save_sql_script(&rows, &out).await?;
            }
        }
        Command::Staff { source, exclude } => {
            let content = load_source(&source).await?;
            import_staff(&pool, &content, &exclude).await?;
        }
        Command::GrantAdmin { email, name } => {
            add_admin_user(&pool, &email, name.as_deref(), "cli").await?;
            info!("✓ {} is an active admin", email.trim().to_lowercase());
        }
        Command::SqlScript { .. } => {}
    }

    pool.close().await;
    Ok(())
}

async fn write_sql_script(source: &str, out: &Path) -> Result<()> {
    let content = load_source(source).await?;
    let rows = parse_csv(&content);
    info!("Parsed {} rows from CSV", rows.len());

    save_sql_script(&rows, out).await
}

async fn save_sql_script(rows: &[CsvRow], out: &Path) -> Result<()> {
    let members: Vec<MemberRow> = rows.iter().map(MemberRow::from_csv).collect();
    let script = generate_update_script(&members, Utc::now())?;
    tokio::fs::write(out, script)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;
    info!("Production SQL script saved to {}", out.display());

    Ok(())
}
