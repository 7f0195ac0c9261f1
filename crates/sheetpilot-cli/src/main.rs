//! sheetpilot - fixed demo flows driving spreadsheets through the
//! automation clients: a running desktop Excel (via the WINE COM bridge)
//! and a Google spreadsheet (via the REST client).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sheetpilot_excel::BridgeConfig;
use tracing_subscriber::EnvFilter;

mod excel_demo;
mod gsheets_demo;

#[derive(Parser)]
#[command(name = "sheetpilot")]
#[command(author, version, about = "Spreadsheet automation demo flows")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a running desktop Excel through the WINE COM bridge
    Excel {
        /// Workbook file that is already open in the application
        #[arg(long, default_value = "excel.xlsx")]
        workbook: PathBuf,

        /// Worksheet to operate on
        #[arg(long, default_value = "Sheet1")]
        sheet: String,

        /// Path to xl-bridge.exe (default: search next to this binary)
        #[arg(long)]
        bridge_exe: Option<PathBuf>,

        /// WINE executable
        #[arg(long, default_value = "wine")]
        wine: PathBuf,
    },

    /// Populate a Google spreadsheet with a product grid and SUM margins
    Gsheets {
        /// Service-account key file
        #[arg(long, default_value = "client_secret.json")]
        credentials: PathBuf,

        /// Exact title of the target spreadsheet
        #[arg(long)]
        title: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Excel {
            workbook,
            sheet,
            bridge_exe,
            wine,
        } => {
            let config = BridgeConfig {
                bridge_exe_path: bridge_exe,
                wine_path: wine,
                ..BridgeConfig::default()
            };
            excel_demo::run(&workbook, &sheet, config)
        }
        Commands::Gsheets { credentials, title } => tokio::runtime::Runtime::new()
            .context("failed to start async runtime")?
            .block_on(gsheets_demo::run(&credentials, &title)),
    }
}
