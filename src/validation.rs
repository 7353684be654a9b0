use std::collections::HashSet;

use crate::error::CheckError;
use crate::types::{TOTO_MAX, TOTO_MIN, TOTO_PICK};

const YEAR_RANGE: std::ops::RangeInclusive<u64> = 1900..=2100;

/// Cleans OCR-extracted TOTO numbers: out-of-range values are dropped and
/// duplicates removed, keeping first-seen order.
///
/// More than six unique numbers are required; six or fewer is rejected.
pub fn validate_toto_numbers(numbers: &[u64]) -> Result<Vec<u8>, CheckError> {
    let mut seen = HashSet::new();
    let unique: Vec<u8> = numbers
        .iter()
        .filter(|n| (u64::from(TOTO_MIN)..=u64::from(TOTO_MAX)).contains(*n))
        .map(|n| *n as u8)
        .filter(|n| seen.insert(*n))
        .collect();

    if unique.len() <= TOTO_PICK {
        return Err(CheckError::InvalidTicket(format!(
            "Invalid TOTO ticket: expected more than {} numbers, found {}",
            TOTO_PICK,
            unique.len()
        )));
    }

    Ok(unique)
}

/// Rebuilds the single 4D number from OCR output.
///
/// OCR may keep the number whole (`4109`), split it into digits (`4 1 0 9`)
/// or split it unevenly (`410 9`). Values that look like the draw year are
/// ignored first.
pub fn validate_4d_number(numbers: &[u64]) -> Result<String, CheckError> {
    let cleaned: Vec<u64> = numbers
        .iter()
        .copied()
        .filter(|n| !YEAR_RANGE.contains(n))
        .collect();

    let four_digit: Vec<u64> = cleaned
        .iter()
        .copied()
        .filter(|n| (1000..=9999).contains(n))
        .collect();
    if let [number] = four_digit.as_slice() {
        return Ok(format!("{:04}", number));
    }

    let single_digits: Vec<u64> = cleaned.iter().copied().filter(|n| *n <= 9).collect();
    if single_digits.len() == 4 {
        return Ok(single_digits.iter().map(u64::to_string).collect());
    }

    let combined: String = cleaned
        .iter()
        .filter(|n| **n <= 999)
        .map(u64::to_string)
        .collect();
    if combined.len() == 4 {
        return Ok(combined);
    }

    Err(CheckError::InvalidTicket("Invalid 4D ticket format".to_string()))
}
