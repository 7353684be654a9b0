use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod mcp_handler;
mod use_cases;

use mcp_handler::{MCPHandler, stdio};
use ticket_lib::config::{self, WinningSourceKind};
use ticket_lib::database::SqliteStore;
use ticket_lib::ocr::{TesseractOcr, TextExtractor};
use ticket_lib::{StaticWinningNumbers, WinningNumberSource};
use use_cases::{TicketUseCase, WinningNumbersUseCase};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Ready to check your tickets.");

    let store = Arc::new(SqliteStore::open(&config.database_url)?);

    let source: Arc<dyn WinningNumberSource> = match config.winning_source {
        WinningSourceKind::Static => Arc::new(StaticWinningNumbers::with_demo_draws()?),
        WinningSourceKind::Database => Arc::clone(&store) as Arc<dyn WinningNumberSource>,
    };
    let ocr: Arc<dyn TextExtractor> =
        Arc::new(TesseractOcr::new(&config.tesseract_cmd, &config.tesseract_lang));

    let ticket_use_case = TicketUseCase::new(
        Arc::clone(&store),
        Arc::clone(&source),
        ocr,
        config.upload_dir.clone(),
    );
    let winning_use_case = WinningNumbersUseCase::new(store, source, config.feed_url.clone());

    let handler = MCPHandler::new(Arc::new(ticket_use_case), Arc::new(winning_use_case));

    let (reader, writer) = stdio();

    handler.serve(reader, writer).await.inspect_err(|e| {
        tracing::error!("serving error: {:?}", e);
    })?;

    Ok(())
}
