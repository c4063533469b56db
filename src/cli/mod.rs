use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod init;
pub mod migrate;
pub mod serve;
pub mod slots;

use crate::core::AppConfig;

#[derive(Subcommand)]
enum Command {
    /// Initialize the db
    Init {
        #[arg(long, action, default_value = "false")]
        db: bool,
    },
    /// Migrate the db schema
    Migrate {
        #[arg(long, action, default_value = "false")]
        db: bool,
    },
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "2222")]
        port: String,
    },
    /// List free appointment slots for a date
    Slots {
        #[arg(long)]
        merchant_id: String,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long)]
        employee_id: Option<String>,
        /// Service duration in minutes
        #[arg(long, default_value = "30")]
        duration: u32,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();
    let config = AppConfig::default();

    // Handle each sub command
    match args.command {
        Some(Command::Init { db }) => {
            init::run(db, &config.db_path).await?;
        }
        Some(Command::Migrate { db }) => {
            migrate::run(db, &config.db_path).await?;
        }
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::Slots {
            merchant_id,
            date,
            employee_id,
            duration,
        }) => {
            slots::run(&config.db_path, merchant_id, date, employee_id, duration).await?;
        }
        None => {}
    }

    Ok(())
}
