use anyhow::{Result, bail};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WinningSourceKind {
    Static,
    Database,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: PathBuf,
    pub upload_dir: PathBuf,
    pub tesseract_cmd: String,
    pub tesseract_lang: String,
    pub winning_source: WinningSourceKind,
    pub feed_url: Option<String>,
}

pub fn load() -> Result<Config> {
    from_lookup(|key| env::var(key).ok())
}

pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

    let winning_source = match var("WINNING_NUMBERS_SOURCE", "static").to_lowercase().as_str() {
        "static" => WinningSourceKind::Static,
        "database" => WinningSourceKind::Database,
        other => bail!("Unknown WINNING_NUMBERS_SOURCE: {}", other),
    };

    Ok(Config {
        database_url: PathBuf::from(var("TICKET_DB_PATH", "data/tickets.db")),
        upload_dir: PathBuf::from(var("TICKET_UPLOAD_DIR", "uploads")),
        tesseract_cmd: var("TESSERACT_CMD", "tesseract"),
        tesseract_lang: var("TESSERACT_LANG", "eng"),
        winning_source,
        feed_url: lookup("WINNING_NUMBERS_FEED_URL").filter(|url| !url.trim().is_empty()),
    })
}
