//! Salescast binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Build the HTTP client, session store, extractor and assembler
//! 3. Run the requested command: list products, show data span, or
//!    generate a report and optionally chat about it

mod cli;
mod render;

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use salescast_archive::ArchiveExtractor;
use salescast_chat::{ChatError, ChatOrchestrator};
use salescast_client::{ForecastApi, HttpForecastApi};
use salescast_core::config::SalescastConfig;
use salescast_core::session::SessionStore;
use salescast_report::{Catalog, ReportAssembler, ReportError};

use crate::cli::{CliArgs, Command, ReportArgs};

fn init_tracing(fallback_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Fetch the catalog, printing the banner on failure.
async fn bootstrap(assembler: &ReportAssembler) -> Result<Catalog, ReportError> {
    assembler.bootstrap().await.inspect_err(|_| {
        if let Some(banner) = assembler.store().banner() {
            let _ = render::render_banner(&mut io::stderr(), &banner);
        }
    })
}

async fn run_report(
    args: ReportArgs,
    assembler: &ReportAssembler,
    chat: &ChatOrchestrator,
    output_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = bootstrap(assembler).await?;
    println!("{}", catalog.availability());
    let product = catalog.select(args.product.as_deref()).inspect_err(|err| {
        if let Some(banner) = err.banner_message() {
            let _ = render::render_banner(&mut io::stderr(), &banner);
        }
    })?;

    let store = assembler.store();
    let bundle = match assembler
        .generate(&product, args.summary_range(), args.forecast_range())
        .await
    {
        Ok(bundle) => bundle,
        Err(err) => {
            if let Some(banner) = store.banner() {
                render::render_banner(&mut io::stderr(), &banner)?;
            }
            return Err(err.into());
        }
    };

    let mut stdout = io::stdout().lock();
    render::render_report(&mut stdout, &product, &store.snapshot())?;
    drop(stdout);

    if args.save {
        for path in render::save_downloads(output_dir, &product, &bundle)? {
            println!("Saved {}", path.display());
        }
    }

    if args.chat {
        chat_loop(chat, store).await?;
    }
    Ok(())
}

/// Read questions from stdin until EOF or `exit`.
async fn chat_loop(chat: &ChatOrchestrator, store: &SessionStore) -> io::Result<()> {
    println!();
    println!("Ask about this report (empty line skips, 'exit' quits).");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("you> ");
        io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        match chat.ask(question).await {
            Ok(Some(reply)) => render::render_message(&mut io::stdout(), &reply)?,
            Ok(None) => {}
            Err(ChatError::ContextNotReady) => {
                if let Some(banner) = store.banner() {
                    render::render_banner(&mut io::stdout(), &banner)?;
                }
            }
            Err(err) => render::render_banner(&mut io::stdout(), &err.to_string())?,
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = SalescastConfig::load_or_default(&config_file);

    // Tracing.
    let log_level = args
        .resolve_log_level()
        .unwrap_or_else(|| config.general.log_level.clone());
    init_tracing(&log_level);
    tracing::info!("Starting Salescast v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    config.api.base_url = args.resolve_api_url(&config.api.base_url);
    let output_dir = args.resolve_output_dir(&config.general.output_dir);
    tracing::info!(base_url = %config.api.base_url, "Forecast service");

    // Components.
    let api: Arc<dyn ForecastApi> = Arc::new(HttpForecastApi::from_config(&config.api)?);
    let store = Arc::new(SessionStore::new());
    let extractor = ArchiveExtractor::from_config(&config.archive)?;
    let assembler = ReportAssembler::new(Arc::clone(&api), Arc::clone(&store), extractor);
    let chat = ChatOrchestrator::new(api, Arc::clone(&store), config.chat.clone());

    match args.command {
        Command::Products => {
            let catalog = bootstrap(&assembler).await?;
            render::render_catalog(&mut io::stdout(), &catalog)?;
        }
        Command::Dates => {
            let catalog = bootstrap(&assembler).await?;
            println!("{}", catalog.availability());
        }
        Command::Report(report) => {
            run_report(report, &assembler, &chat, &output_dir).await?;
        }
    }

    Ok(())
}
