// Lottery ticket checking: OCR text in, prize verdict out.
pub mod api;
pub mod checker;
pub mod config;
pub mod database;
pub mod error;
pub mod ocr;
pub mod result_checker;
pub mod ticket;
pub mod types;
pub mod utils;
pub mod validation;
pub mod winning_numbers;

pub use checker::*;
pub use error::{CheckError, ErrorKind, RecordError};
pub use ticket::*;
pub use types::*;
pub use winning_numbers::*;
