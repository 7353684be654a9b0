use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{info, warn};

use crate::database::{SqliteStore, check_existing_dates};
use crate::types::{GameType, WinningNumbersPayload, WinningNumbersRequest, WinningNumbersResponse};

pub async fn fetch_winning_numbers(
    client: &reqwest::Client,
    feed_url: &str,
    game_type: GameType,
    draw_date: NaiveDate,
) -> Result<WinningNumbersResponse> {
    let request_body = WinningNumbersRequest {
        game_type,
        draw_date: draw_date.format("%Y-%m-%d").to_string(),
    };

    let response = client
        .post(feed_url)
        .header("Content-Type", "application/json")
        .json(&request_body)
        .send()
        .await?
        .error_for_status()?;

    let winning_response: WinningNumbersResponse = response.json().await?;
    Ok(winning_response)
}

/// Pulls a usable result out of a feed response, if the feed had one.
pub fn extract_result(
    response: WinningNumbersResponse,
    game_type: GameType,
    draw_date: NaiveDate,
) -> Result<Option<WinningNumbersPayload>> {
    if !response.status || response.status_code != 200 {
        return Err(anyhow!(
            "Feed error: {} ({})",
            response.status_message,
            response.status_code
        ));
    }

    let Some(result) = response.response.and_then(|data| data.result) else {
        return Ok(None);
    };

    if result.game_type != game_type || result.draw_date != draw_date {
        return Err(anyhow!(
            "Feed returned {} {} for requested {} {}",
            result.game_type,
            result.draw_date,
            game_type,
            draw_date
        ));
    }
    Ok(Some(result))
}

/// Fetches every requested draw the store does not already hold and saves
/// the ones the feed knows about.
pub async fn fetch_and_save_multiple_results(
    store: &SqliteStore,
    feed_url: &str,
    game_type: GameType,
    dates: &[NaiveDate],
) -> Result<Vec<WinningNumbersPayload>> {
    let (dates_to_fetch, existing_dates) =
        check_existing_dates(&*store.connection()?, game_type, dates)?;

    for date in &existing_dates {
        info!("✓ {} {} (already exists)", game_type, date);
    }

    if dates_to_fetch.is_empty() {
        return Ok(Vec::new());
    }

    let client = reqwest::Client::new();
    let mut all_results = Vec::new();

    for (index, date) in dates_to_fetch.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        let fetched = fetch_winning_numbers(&client, feed_url, game_type, *date)
            .await
            .and_then(|response| extract_result(response, game_type, *date));

        match fetched {
            Ok(Some(result)) => {
                info!("✓ Results fetched for {} {}", game_type, date);
                all_results.push(result);
            }
            Ok(None) => warn!("⚠ No result found for {} {}", game_type, date),
            Err(e) => warn!("✗ Error fetching {} {}: {:#}", game_type, date, e),
        }
    }

    for result in &all_results {
        store.save_winning_payload(result)?;
    }
    if !all_results.is_empty() {
        info!("🎯 Saved {} new draw results", all_results.len());
    }

    Ok(all_results)
}
