//! Terminal front-end for the customer lookup API.
//!
//! # Usage
//!
//! ```bash
//! # Show every customer card
//! lookup list
//!
//! # Search a customer and export the record
//! lookup search CC 1020304050 --export excel
//!
//! # Open the third card of the list
//! lookup select 3
//!
//! # Download the loyalty report
//! lookup report
//! ```
//!
//! `LOOKUP_API_URL` and `LOOKUP_DOWNLOAD_DIR` may be set in the environment
//! or in a `.env` file.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use lookup_core::{ExportFormat, LookupClient, PageController};
use tracing_subscriber::EnvFilter;

mod error;
mod host;
mod render;

use error::CliError;
use host::Host;

#[derive(Parser)]
#[command(name = "lookup")]
#[command(author, version, about = "Customer lookup client")]
struct Cli {
    /// Base URL of the lookup API
    #[arg(long, env = "LOOKUP_API_URL", default_value = "http://127.0.0.1:5000/api")]
    api_url: String,

    /// Directory where exported files are written
    #[arg(long, env = "LOOKUP_DOWNLOAD_DIR", default_value = ".")]
    download_dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, env = "LOOKUP_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all customers
    List,
    /// Search a customer by document type and number
    Search {
        /// Document type code (CC, NIT, PA)
        document_type: String,
        /// Document number
        document_number: String,
        /// Export the customer after a successful search
        #[arg(long, value_enum)]
        export: Option<Format>,
    },
    /// Open a customer card from the list (numbered from 1)
    Select {
        card: usize,
        /// Export the customer after the search
        #[arg(long, value_enum)]
        export: Option<Format>,
    },
    /// Download the loyalty-qualification report
    Report,
    /// Show the accepted document types
    Types,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Excel,
    Csv,
}

impl From<Format> for ExportFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Excel => ExportFormat::Excel,
            Format::Csv => ExportFormat::Csv,
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    if !cli.download_dir.is_dir() {
        return Err(CliError::MissingDownloadDir(cli.download_dir));
    }
    let controller = PageController::new(LookupClient::new(&cli.api_url));
    let mut host = Host::new(
        controller,
        cli.download_dir,
        Duration::from_secs(cli.timeout_secs),
    );

    match cli.command {
        Commands::List => {
            let commands = host.controller.reload_customers();
            host.run(commands)?;
            print!("{}", render::customers(&host.controller.view().customers));
        }
        Commands::Types => {
            let commands = host.controller.reload_document_types();
            host.run(commands)?;
            print!("{}", render::document_types(host.controller.document_types()));
        }
        Commands::Search {
            document_type,
            document_number,
            export,
        } => {
            host.controller.set_document_type(document_type);
            host.controller.set_document_number(document_number);
            let commands = host.controller.submit_search();
            host.run(commands)?;
            show_result(&host);
            export_if_requested(&mut host, export)?;
        }
        Commands::Select { card, export } => {
            let commands = host.controller.reload_customers();
            host.run(commands)?;
            let index = card.checked_sub(1).ok_or(CliError::UnknownCard(card))?;
            let commands = host.controller.select_customer(index);
            if commands.is_empty() {
                print!("{}", render::customers(&host.controller.view().customers));
                return Err(CliError::UnknownCard(card));
            }
            host.run(commands)?;
            show_result(&host);
            export_if_requested(&mut host, export)?;
        }
        Commands::Report => {
            let commands = host.controller.generate_loyalty_report();
            host.run(commands)?;
            show_banner(&host);
        }
    }

    for path in host.saved() {
        println!("{}", path.display());
    }
    Ok(())
}

fn show_result(host: &Host) {
    let view = host.controller.view();
    if let Some(results) = &view.results {
        print!("{}", render::result(results));
    }
    if let Some(banner) = &view.banner {
        print!("{}", render::banner(banner));
    }
}

fn show_banner(host: &Host) {
    if let Some(banner) = &host.controller.view().banner {
        print!("{}", render::banner(banner));
    }
}

fn export_if_requested(host: &mut Host, format: Option<Format>) -> Result<(), CliError> {
    let Some(format) = format else {
        return Ok(());
    };
    if host.controller.current_customer().is_none() {
        return Ok(());
    }
    let commands = host.controller.export_customer(format.into());
    host.run(commands)?;
    show_banner(host);
    Ok(())
}
