//! OCR boundary and the text parsing that runs on its output.
//!
//! `TextExtractor` is the capability the pipeline is given to read an image;
//! `TesseractOcr` implements it by running the Tesseract CLI. The free
//! functions below interpret the raw text and never touch the filesystem.

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use regex::{Captures, Regex};
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::CheckError;
use crate::types::{DrawDate, GameType};

pub trait TextExtractor {
    fn extract_text(&self, image_path: &Path) -> Result<String>;
}

/// Runs `tesseract <image> stdout -l <lang>` and returns what it printed.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    command: String,
    lang: String,
}

impl TesseractOcr {
    pub fn new(command: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            lang: lang.into(),
        }
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl TextExtractor for TesseractOcr {
    fn extract_text(&self, image_path: &Path) -> Result<String> {
        if !image_path.is_file() {
            bail!("Image not found: {}", image_path.display());
        }

        let output = Command::new(&self.command)
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.lang)
            .output()
            .with_context(|| format!("Failed to run {}", self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(chars = text.len(), "tesseract produced text");
        Ok(text)
    }
}

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid number pattern"));

static ISO_DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{4})-([0-9]{2})-([0-9]{2})").expect("valid ISO date pattern")
});

static SLASH_DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{2})/([0-9]{2})/([0-9]{4})").expect("valid slash date pattern")
});

static MONTH_NAME_DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{2})\s+([A-Z]{3})\s+([0-9]{4})").expect("valid month name pattern")
});

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Every maximal run of digits in `text`, left to right, as an integer.
///
/// Years, dates and duplicates are all kept. Runs too long for `u64`
/// saturate so each run still yields exactly one value.
pub fn extract_numbers_from_text(text: &str) -> Vec<u64> {
    NUMBER_PATTERN
        .find_iter(text)
        .map(|m| {
            m.as_str().bytes().fold(0u64, |acc, b| {
                acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
            })
        })
        .collect()
}

/// Decides the game from keywords alone: `4D`/`4-D` first, then `TOTO`.
pub fn classify_game_type(raw_text: &str) -> Result<GameType, CheckError> {
    let text = raw_text.to_uppercase();

    if text.contains("4D") || text.contains("4-D") {
        Ok(GameType::FourD)
    } else if text.contains("TOTO") {
        Ok(GameType::Toto)
    } else {
        Err(CheckError::Classification)
    }
}

/// Best-effort draw date. Patterns are tried in a fixed order and only the
/// first match of each is considered; a match that is not a real calendar
/// date falls through to the next pattern.
pub fn extract_draw_date(raw_text: &str) -> DrawDate {
    let text = raw_text.to_uppercase();

    let parsers: [(&Regex, fn(&Captures) -> Option<NaiveDate>); 3] = [
        (&*ISO_DATE_PATTERN, parse_iso_date),
        (&*SLASH_DATE_PATTERN, parse_slash_date),
        (&*MONTH_NAME_DATE_PATTERN, parse_month_name_date),
    ];

    for (pattern, parse) in parsers {
        let Some(caps) = pattern.captures(&text) else {
            continue;
        };
        match parse(&caps) {
            Some(date) => return DrawDate::Known(date),
            None => debug!("skipping invalid draw date {}", &caps[0]),
        }
    }

    DrawDate::Unknown
}

fn field(caps: &Captures, index: usize) -> Option<u32> {
    caps.get(index)?.as_str().parse().ok()
}

fn parse_iso_date(caps: &Captures) -> Option<NaiveDate> {
    let year = field(caps, 1)?;
    NaiveDate::from_ymd_opt(year as i32, field(caps, 2)?, field(caps, 3)?)
}

fn parse_slash_date(caps: &Captures) -> Option<NaiveDate> {
    let year = field(caps, 3)?;
    NaiveDate::from_ymd_opt(year as i32, field(caps, 2)?, field(caps, 1)?)
}

fn parse_month_name_date(caps: &Captures) -> Option<NaiveDate> {
    let month = MONTHS.iter().position(|m| *m == &caps[2])? as u32 + 1;
    let year = field(caps, 3)?;
    NaiveDate::from_ymd_opt(year as i32, month, field(caps, 1)?)
}
