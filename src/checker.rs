//! The ticket checking pipeline.
//!
//! `process_ticket_text` is the pure core: OCR text in, verdict out, with the
//! winning numbers supplied by an injected source. `TicketChecker` adds the
//! two I/O boundaries around it, reading the image and saving the result.

use anyhow::Result as AnyResult;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::error::CheckError;
use crate::ocr::{TextExtractor, classify_game_type, extract_draw_date, extract_numbers_from_text};
use crate::result_checker::score_ticket;
use crate::ticket::Ticket;
use crate::types::{GameType, PrizeResult, TicketCheckRow, TicketNumbers, WinningRecord};
use crate::validation::{validate_4d_number, validate_toto_numbers};
use crate::winning_numbers::WinningNumberSource;

/// Append-only record of checked tickets.
pub trait CheckStore {
    fn save_check(&self, check: &TicketCheck) -> AnyResult<i64>;

    /// Every saved check, newest first.
    fn list_checks(&self) -> AnyResult<Vec<TicketCheckRow>>;
}

/// Outcome of checking one ticket.
#[derive(Debug, Clone, Serialize)]
pub struct TicketCheck {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub winning_numbers: WinningRecord,
    pub is_winner: bool,
    pub prize_results: PrizeResult,
}

pub fn process_ticket_text(
    raw_text: &str,
    is_system_bet: bool,
    source: &dyn WinningNumberSource,
) -> Result<TicketCheck, CheckError> {
    let extracted = extract_numbers_from_text(raw_text);
    let game_type = classify_game_type(raw_text)?;
    let draw_date = extract_draw_date(raw_text);
    debug!(%game_type, %draw_date, ?extracted, "parsed OCR text");

    let numbers = match game_type {
        GameType::Toto => TicketNumbers::Toto(validate_toto_numbers(&extracted)?),
        GameType::FourD => TicketNumbers::FourD(validate_4d_number(&extracted)?),
    };
    let ticket = Ticket::with_game_type(game_type, draw_date, numbers, is_system_bet)?;

    let winning_numbers = source
        .lookup(game_type, &draw_date)
        .map_err(|e| {
            error!(%game_type, %draw_date, error = ?e, "winning number lookup failed");
            CheckError::Source(e)
        })?
        .ok_or_else(|| {
            warn!(%game_type, %draw_date, "winning numbers not available");
            CheckError::LookupMiss {
                game_type,
                draw_date,
            }
        })?;

    let prize_results = score_ticket(&ticket, &winning_numbers)?;
    let is_winner = prize_results.is_winner();
    info!(%game_type, %draw_date, is_winner, "ticket checked");

    Ok(TicketCheck {
        ticket,
        winning_numbers,
        is_winner,
        prize_results,
    })
}

/// Runs the pipeline with its I/O capabilities attached.
pub struct TicketChecker<'a> {
    ocr: &'a dyn TextExtractor,
    source: &'a dyn WinningNumberSource,
    store: &'a dyn CheckStore,
}

impl<'a> TicketChecker<'a> {
    pub fn new(
        ocr: &'a dyn TextExtractor,
        source: &'a dyn WinningNumberSource,
        store: &'a dyn CheckStore,
    ) -> Self {
        Self { ocr, source, store }
    }

    /// OCR the image, check the ticket and save the result.
    pub fn check_image(
        &self,
        image_path: &Path,
        is_system_bet: bool,
    ) -> Result<(i64, TicketCheck), CheckError> {
        let raw_text = self.ocr.extract_text(image_path).map_err(|e| {
            error!(image = %image_path.display(), error = ?e, "OCR failed");
            CheckError::Ocr(e)
        })?;
        self.check_text(&raw_text, is_system_bet)
    }

    /// Check already recognized text and save the result.
    pub fn check_text(
        &self,
        raw_text: &str,
        is_system_bet: bool,
    ) -> Result<(i64, TicketCheck), CheckError> {
        let check = process_ticket_text(raw_text, is_system_bet, self.source)?;
        let id = self.store.save_check(&check).map_err(|e| {
            error!(error = ?e, "failed to save ticket check");
            CheckError::Storage(e)
        })?;
        Ok((id, check))
    }

    pub fn history(&self) -> Result<Vec<TicketCheckRow>, CheckError> {
        self.store.list_checks().map_err(|e| {
            error!(error = ?e, "failed to load ticket history");
            CheckError::Storage(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DrawDate, FourDCategory};
    use crate::winning_numbers::StaticWinningNumbers;
    use chrono::NaiveDate;
    use serde_json::json;

    fn source() -> StaticWinningNumbers {
        StaticWinningNumbers::with_demo_draws().unwrap()
    }

    #[test]
    fn test_toto_ticket_end_to_end() {
        let text = "SINGAPORE POOLS TOTO\nDraw 20/01/2026\nA. 01 05 12 23 34 45 07";
        let check = process_ticket_text(text, false, &source()).unwrap();

        assert_eq!(check.ticket.game_type(), GameType::Toto);
        assert_eq!(
            check.ticket.draw_date(),
            DrawDate::Known(NaiveDate::from_ymd_opt(2026, 1, 20).unwrap())
        );
        // 20 and 1 from the date line are valid TOTO numbers and are kept.
        assert_eq!(
            check.ticket.numbers(),
            &TicketNumbers::Toto(vec![20, 1, 5, 12, 23, 34, 45, 7])
        );
        assert!(check.is_winner);
        let PrizeResult::Toto(counts) = &check.prize_results else {
            panic!("expected TOTO result");
        };
        assert_eq!(counts.get(6), 1);
    }

    #[test]
    fn test_four_d_ticket_end_to_end() {
        let text = "4D Big\nDRAW DATE 2026-01-20\n1234";
        let check = process_ticket_text(text, false, &source()).unwrap();
        assert_eq!(check.ticket.numbers(), &TicketNumbers::FourD("1234".into()));
        assert_eq!(
            check.prize_results,
            PrizeResult::FourD {
                prize_category: Some(FourDCategory::Second)
            }
        );

        let value = serde_json::to_value(&check).unwrap();
        assert_eq!(value["game_type"], json!("4D"));
        assert_eq!(value["numbers"], json!(["1234"]));
        assert_eq!(value["winning_numbers"]["first"], json!("4109"));
        assert_eq!(value["prize_results"], json!({"prize_category": "second"}));
        assert_eq!(value["is_winner"], json!(true));
    }

    #[test]
    fn test_unknown_date_is_a_lookup_miss() {
        let text = "4D ticket 4109";
        let err = process_ticket_text(text, false, &source()).unwrap_err();
        assert!(matches!(
            err,
            CheckError::LookupMiss {
                game_type: GameType::FourD,
                draw_date: DrawDate::Unknown
            }
        ));
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_unclassifiable_text() {
        let err = process_ticket_text("01 02 03 04 05 06 07", false, &source()).unwrap_err();
        assert!(matches!(err, CheckError::Classification));
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let text = "TOTO 2026-01-20 03 05 12 23 40 41 42";
        let first = process_ticket_text(text, true, &source()).unwrap();
        let second = process_ticket_text(text, true, &source()).unwrap();

        assert_eq!(
            serde_json::to_string(&first.prize_results).unwrap(),
            serde_json::to_string(&second.prize_results).unwrap()
        );
        assert_eq!(first.is_winner, second.is_winner);
    }
}
