use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ticket_lib::api::fetch_and_save_multiple_results;
use ticket_lib::database::SqliteStore;
use ticket_lib::ocr::TextExtractor;
use ticket_lib::utils::store_upload;
use ticket_lib::{CheckError, DrawDate, GameType, TicketChecker, WinningNumberSource};

fn required_str<'a>(arguments: &'a HashMap<String, Value>, name: &str) -> Result<&'a str> {
    arguments
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("Missing {} parameter", name))
}

fn system_bet_flag(arguments: &HashMap<String, Value>) -> bool {
    arguments
        .get("is_system_bet")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

fn game_type_arg(arguments: &HashMap<String, Value>) -> Result<GameType> {
    required_str(arguments, "game_type")?
        .parse()
        .map_err(|e: String| anyhow!(e))
}

pub struct TicketUseCase {
    store: Arc<SqliteStore>,
    source: Arc<dyn WinningNumberSource>,
    ocr: Arc<dyn TextExtractor>,
    upload_dir: PathBuf,
}

impl TicketUseCase {
    pub fn new(
        store: Arc<SqliteStore>,
        source: Arc<dyn WinningNumberSource>,
        ocr: Arc<dyn TextExtractor>,
        upload_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            source,
            ocr,
            upload_dir,
        }
    }

    fn checker(&self) -> TicketChecker<'_> {
        TicketChecker::new(self.ocr.as_ref(), self.source.as_ref(), self.store.as_ref())
    }

    pub async fn upload_image_ticket(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let image_path = required_str(arguments, "image_path")?;
        let saved = store_upload(Path::new(image_path), &self.upload_dir)?;
        let (id, check) = self.checker().check_image(&saved, system_bet_flag(arguments))?;

        Ok(json!({
            "success": true,
            "id": id,
            "result": check
        })
        .to_string())
    }

    pub async fn check_ticket_text(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let raw_text = required_str(arguments, "raw_text")?;
        let (id, check) = self.checker().check_text(raw_text, system_bet_flag(arguments))?;

        Ok(json!({
            "success": true,
            "id": id,
            "result": check
        })
        .to_string())
    }

    pub async fn get_ticket_history(&self, _arguments: &HashMap<String, Value>) -> Result<String> {
        let tickets = self.checker().history()?;

        Ok(json!({
            "count": tickets.len(),
            "tickets": tickets
        })
        .to_string())
    }
}

pub struct WinningNumbersUseCase {
    store: Arc<SqliteStore>,
    source: Arc<dyn WinningNumberSource>,
    feed_url: Option<String>,
}

impl WinningNumbersUseCase {
    pub fn new(
        store: Arc<SqliteStore>,
        source: Arc<dyn WinningNumberSource>,
        feed_url: Option<String>,
    ) -> Self {
        Self {
            store,
            source,
            feed_url,
        }
    }

    pub async fn get_winning_numbers(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let game_type = game_type_arg(arguments)?;
        let draw_date: DrawDate = required_str(arguments, "draw_date")?.parse()?;

        let record = self
            .source
            .lookup(game_type, &draw_date)
            .map_err(CheckError::Source)?
            .ok_or(CheckError::LookupMiss {
                game_type,
                draw_date,
            })?;

        Ok(json!({
            "success": true,
            "game_type": game_type,
            "draw_date": draw_date,
            "winning_numbers": record
        })
        .to_string())
    }

    pub async fn insert_winning_numbers(
        &self,
        arguments: &HashMap<String, Value>,
    ) -> Result<String> {
        let raw_json = required_str(arguments, "raw_json")?;
        let payload = self.store.insert_winning_numbers(raw_json)?;

        Ok(json!({
            "success": true,
            "message": format!(
                "Saved {} winning numbers for {}",
                payload.game_type, payload.draw_date
            )
        })
        .to_string())
    }

    pub async fn fetch_winning_numbers(
        &self,
        arguments: &HashMap<String, Value>,
    ) -> Result<String> {
        let feed_url = self
            .feed_url
            .as_deref()
            .ok_or_else(|| anyhow!("WINNING_NUMBERS_FEED_URL is not configured"))?;
        let game_type = game_type_arg(arguments)?;

        let dates_json = arguments
            .get("dates")
            .ok_or_else(|| anyhow!("Missing dates parameter"))?;
        let dates: Vec<NaiveDate> = serde_json::from_value(dates_json.clone())?;

        let results = fetch_and_save_multiple_results(&self.store, feed_url, game_type, &dates)
            .await
            .context("Failed to fetch winning numbers")?;

        Ok(json!({
            "success": true,
            "results_count": results.len(),
            "results": results
        })
        .to_string())
    }
}
