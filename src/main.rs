use anyhow::Result;
use std::env;
use tracing_subscriber::EnvFilter;

use ticket_lib::config::{self, WinningSourceKind};
use ticket_lib::database::SqliteStore;
use ticket_lib::ocr::TesseractOcr;
use ticket_lib::utils::list_ticket_images;
use ticket_lib::{CheckStore, StaticWinningNumbers, TicketChecker, WinningNumberSource};

/// Checks every ticket image in the uploads folder and records the results.
fn main() -> Result<()> {
    let config = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let is_system_bet = env::args().skip(1).any(|arg| arg == "--system-bet");

    let store = SqliteStore::open(&config.database_url)?;
    let ocr = TesseractOcr::new(&config.tesseract_cmd, &config.tesseract_lang);

    let demo_draws;
    let source: &dyn WinningNumberSource = match config.winning_source {
        WinningSourceKind::Static => {
            demo_draws = StaticWinningNumbers::with_demo_draws()?;
            &demo_draws
        }
        WinningSourceKind::Database => &store,
    };
    let checker = TicketChecker::new(&ocr, source, &store);

    let images = list_ticket_images(&config.upload_dir)?;
    if images.is_empty() {
        println!("⚠ No ticket images found in {}", config.upload_dir.display());
    }

    for image in &images {
        println!("Reading ticket: {:?}", image);
        match checker.check_image(image, is_system_bet) {
            Ok((id, check)) => {
                let verdict = if check.is_winner { "🎉 winner" } else { "no prize" };
                println!(
                    "🎟️ #{} {} {} -> {} {}",
                    id,
                    check.ticket.game_type(),
                    check.ticket.draw_date(),
                    verdict,
                    serde_json::to_string(&check.prize_results)?
                );
            }
            Err(e) if e.is_user_correctable() => println!("⚠ {}: {}", image.display(), e),
            Err(e) => println!("❌ {}: {}", image.display(), e),
        }
    }

    let history = store.list_checks()?;
    println!("\n📋 {} ticket checks on record", history.len());

    Ok(())
}
