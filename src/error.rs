//! Error types for ticket checking

use thiserror::Error;

use crate::types::{DrawDate, GameType};

/// Failures raised while turning OCR output into a prize verdict.
///
/// The first four variants are caused by the submitted ticket and carry a
/// reason that can be shown to the user. The remaining ones wrap boundary
/// failures (OCR engine, storage, winning-number source) whose cause is
/// logged but never shown.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Unable to determine game type from OCR")]
    Classification,

    #[error("{0}")]
    InvalidTicket(String),

    #[error("{0}")]
    InvalidUpload(String),

    #[error("Winning numbers not available")]
    LookupMiss {
        game_type: GameType,
        draw_date: DrawDate,
    },

    #[error("OCR processing failed")]
    Ocr(#[source] anyhow::Error),

    #[error("Failed to save ticket")]
    Storage(#[source] anyhow::Error),

    #[error("Failed to load winning numbers")]
    Source(#[source] anyhow::Error),
}

/// How a failure should be surfaced by the calling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadInput,
    NotFound,
    Internal,
}

impl CheckError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckError::Classification
            | CheckError::InvalidTicket(_)
            | CheckError::InvalidUpload(_) => ErrorKind::BadInput,
            CheckError::LookupMiss { .. } => ErrorKind::NotFound,
            CheckError::Ocr(_) | CheckError::Storage(_) | CheckError::Source(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::BadInput => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }

    pub fn is_user_correctable(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }
}

/// Winning-number records that break the per-game shape rules.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("TOTO winning numbers must be 6 distinct values in 1-49, got {0:?}")]
    Toto(Vec<u8>),

    #[error("4D winning numbers must be 4-digit strings, got {0:?}")]
    FourD(String),

    #[error("Winning numbers for {expected} draw have the shape of a {found} record")]
    GameMismatch { expected: GameType, found: GameType },
}
