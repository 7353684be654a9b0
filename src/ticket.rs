use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::HashSet;

use crate::error::CheckError;
use crate::types::{
    Combination, DrawDate, GameType, TOTO_MAX, TOTO_MIN, TOTO_PICK, TicketNumbers,
    is_four_digit,
};

/// A ticket submitted for checking.
///
/// Construction re-checks the per-game invariants, so a `Ticket` holding
/// invalid numbers cannot exist even when the validator was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    draw_date: DrawDate,
    numbers: TicketNumbers,
    is_system_bet: bool,
}

impl Ticket {
    pub fn new(
        draw_date: DrawDate,
        numbers: TicketNumbers,
        is_system_bet: bool,
    ) -> Result<Self, CheckError> {
        match &numbers {
            TicketNumbers::Toto(values) => check_toto(values)?,
            TicketNumbers::FourD(value) => {
                if !is_four_digit(value) {
                    return Err(CheckError::InvalidTicket(format!(
                        "4D requires a single 4-digit number, got {:?}",
                        value
                    )));
                }
            }
        }

        Ok(Self {
            draw_date,
            numbers,
            is_system_bet,
        })
    }

    /// Same as [`Ticket::new`], but also checks the numbers belong to
    /// `game_type`.
    pub fn with_game_type(
        game_type: GameType,
        draw_date: DrawDate,
        numbers: TicketNumbers,
        is_system_bet: bool,
    ) -> Result<Self, CheckError> {
        if numbers.game_type() != game_type {
            return Err(CheckError::InvalidTicket(format!(
                "{} ticket cannot hold {} numbers",
                game_type,
                numbers.game_type()
            )));
        }
        Self::new(draw_date, numbers, is_system_bet)
    }

    pub fn game_type(&self) -> GameType {
        self.numbers.game_type()
    }

    pub fn draw_date(&self) -> DrawDate {
        self.draw_date
    }

    pub fn numbers(&self) -> &TicketNumbers {
        &self.numbers
    }

    pub fn is_system_bet(&self) -> bool {
        self.is_system_bet
    }

    /// Units to score against the draw.
    ///
    /// A TOTO system bet is scored as every 6-number subset of its numbers.
    /// Any other ticket is a single unit holding all of its numbers as-is.
    /// Units are produced lazily, so large system bets are never held in
    /// memory at once.
    pub fn expand_combinations(&self) -> Box<dyn Iterator<Item = Combination> + '_> {
        match &self.numbers {
            TicketNumbers::Toto(values) if self.is_system_bet => {
                Box::new(Combinations::new(values, TOTO_PICK).map(Combination::Toto))
            }
            TicketNumbers::Toto(values) => {
                Box::new(std::iter::once(Combination::Toto(values.clone())))
            }
            TicketNumbers::FourD(value) => {
                Box::new(std::iter::once(Combination::FourD(value.clone())))
            }
        }
    }
}

impl Serialize for Ticket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Ticket", 4)?;
        state.serialize_field("game_type", &self.game_type())?;
        state.serialize_field("draw_date", &self.draw_date)?;
        state.serialize_field("numbers", &self.numbers)?;
        state.serialize_field("is_system_bet", &self.is_system_bet)?;
        state.end()
    }
}

fn check_toto(values: &[u8]) -> Result<(), CheckError> {
    if values.len() <= TOTO_PICK {
        return Err(CheckError::InvalidTicket(format!(
            "TOTO requires more than {} numbers, got {}",
            TOTO_PICK,
            values.len()
        )));
    }

    let distinct: HashSet<&u8> = values.iter().collect();
    if distinct.len() != values.len() {
        return Err(CheckError::InvalidTicket(
            "Duplicate numbers not allowed".to_string(),
        ));
    }

    if let Some(value) = values.iter().find(|v| !(TOTO_MIN..=TOTO_MAX).contains(*v)) {
        return Err(CheckError::InvalidTicket(format!(
            "TOTO numbers must be between {} and {}, got {}",
            TOTO_MIN, TOTO_MAX, value
        )));
    }

    Ok(())
}

/// All `k`-element subsets of `items`, in lexicographic order of positions.
struct Combinations<'a> {
    items: &'a [u8],
    indices: Vec<usize>,
    done: bool,
}

impl<'a> Combinations<'a> {
    fn new(items: &'a [u8], k: usize) -> Self {
        Self {
            items,
            indices: (0..k).collect(),
            done: k > items.len(),
        }
    }
}

impl Iterator for Combinations<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        if self.done {
            return None;
        }
        let current = self.indices.iter().map(|&i| self.items[i]).collect();

        let n = self.items.len();
        let k = self.indices.len();
        // Rightmost position that has not reached its final value.
        match (0..k).rev().find(|&i| self.indices[i] != i + n - k) {
            Some(i) => {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
            }
            None => self.done = true,
        }

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn draw_date() -> DrawDate {
        DrawDate::Known(NaiveDate::from_ymd_opt(2026, 1, 20).unwrap())
    }

    fn toto(numbers: &[u8], is_system_bet: bool) -> Ticket {
        Ticket::new(draw_date(), TicketNumbers::Toto(numbers.to_vec()), is_system_bet).unwrap()
    }

    #[test]
    fn test_system_bet_expands_to_all_six_number_subsets() {
        let ticket = toto(&[1, 5, 12, 23, 34, 45, 49], true);
        let combos: Vec<_> = ticket.expand_combinations().collect();
        assert_eq!(combos.len(), 7);
        assert_eq!(combos[0], Combination::Toto(vec![1, 5, 12, 23, 34, 45]));
        assert_eq!(combos[6], Combination::Toto(vec![5, 12, 23, 34, 45, 49]));

        let distinct: HashSet<_> = combos.iter().collect();
        assert_eq!(distinct.len(), 7);
    }

    #[test]
    fn test_larger_system_bet_counts() {
        let ticket = toto(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10], true);
        // C(10, 6)
        assert_eq!(ticket.expand_combinations().count(), 210);
    }

    #[test]
    fn test_standard_ticket_is_not_truncated() {
        let ticket = toto(&[1, 5, 12, 23, 34, 45, 49], false);
        let combos: Vec<_> = ticket.expand_combinations().collect();
        assert_eq!(combos, vec![Combination::Toto(vec![1, 5, 12, 23, 34, 45, 49])]);
    }

    #[test]
    fn test_four_d_expands_to_itself() {
        let ticket = Ticket::new(draw_date(), TicketNumbers::FourD("4109".into()), true).unwrap();
        assert_eq!(ticket.game_type(), GameType::FourD);
        assert_eq!(
            ticket.expand_combinations().collect::<Vec<_>>(),
            vec![Combination::FourD("4109".into())]
        );
    }

    #[test]
    fn test_constructor_rejects_invalid_toto() {
        let cases: [&[u8]; 4] = [
            &[1, 2, 3, 4, 5, 6],
            &[1, 2, 3, 4, 5, 6, 6],
            &[0, 2, 3, 4, 5, 6, 7],
            &[1, 2, 3, 4, 5, 6, 50],
        ];
        for numbers in cases {
            let result = Ticket::new(draw_date(), TicketNumbers::Toto(numbers.to_vec()), false);
            assert!(
                matches!(result, Err(CheckError::InvalidTicket(_))),
                "{:?}",
                numbers
            );
        }
    }

    #[test]
    fn test_constructor_rejects_invalid_four_d() {
        for value in ["410", "41090", "41a9", ""] {
            let result = Ticket::new(draw_date(), TicketNumbers::FourD(value.into()), false);
            assert!(result.is_err(), "{:?}", value);
        }
    }

    #[test]
    fn test_with_game_type_rejects_mismatch() {
        let result = Ticket::with_game_type(
            GameType::Toto,
            draw_date(),
            TicketNumbers::FourD("4109".into()),
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_serializes_like_the_persisted_record() {
        let ticket = Ticket::new(DrawDate::Unknown, TicketNumbers::FourD("0001".into()), false)
            .unwrap();
        assert_eq!(
            serde_json::to_value(&ticket).unwrap(),
            json!({
                "game_type": "4D",
                "draw_date": "UNKNOWN",
                "numbers": ["0001"],
                "is_system_bet": false
            })
        );
    }

    #[test]
    fn test_combinations_edge_sizes() {
        let subsets = |k| Combinations::new(&[1, 2, 3], k).collect::<Vec<_>>();
        assert_eq!(subsets(4), Vec::<Vec<u8>>::new());
        assert_eq!(subsets(3), vec![vec![1, 2, 3]]);
        assert_eq!(subsets(2), vec![vec![1, 2], vec![1, 3], vec![2, 3]]);
    }

    #[test]
    fn test_full_system_bet_is_streamed() {
        let all: Vec<u8> = (1..=49).collect();
        let ticket = toto(&all, true);
        let mut combos = ticket.expand_combinations();
        assert_eq!(combos.next(), Some(Combination::Toto(vec![1, 2, 3, 4, 5, 6])));
        assert_eq!(combos.next(), Some(Combination::Toto(vec![1, 2, 3, 4, 5, 7])));
    }
}
