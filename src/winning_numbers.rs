//! Where winning numbers come from.
//!
//! The pipeline only sees [`WinningNumberSource`]. The in-memory table below
//! carries the demo draw; `database::SqliteStore` serves records entered by an
//! admin or cached from the results feed.

use anyhow::Result;
use chrono::NaiveDate;
use std::collections::HashMap;

use crate::types::{DrawDate, FourDWinning, GameType, TotoWinning, WinningRecord};

pub trait WinningNumberSource {
    /// Winning numbers for one draw, or `None` when the draw is not known.
    fn lookup(&self, game_type: GameType, draw_date: &DrawDate) -> Result<Option<WinningRecord>>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticWinningNumbers {
    draws: HashMap<(GameType, NaiveDate), WinningRecord>,
}

impl StaticWinningNumbers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding the 2026-01-20 demo draw for both games.
    pub fn with_demo_draws() -> Result<Self> {
        let draw_date = NaiveDate::from_ymd_opt(2026, 1, 20)
            .ok_or_else(|| anyhow::anyhow!("invalid demo draw date"))?;

        let mut table = Self::new();
        table.insert(
            draw_date,
            WinningRecord::Toto(TotoWinning::new(vec![1, 5, 12, 23, 34, 45])?),
        );
        table.insert(
            draw_date,
            WinningRecord::FourD(FourDWinning::new(
                "4109",
                "1234",
                "5678",
                vec!["0001".to_string(), "1111".to_string()],
                vec!["2222".to_string(), "3333".to_string()],
            )?),
        );
        Ok(table)
    }

    /// Adds or replaces the record for its game on `draw_date`.
    pub fn insert(&mut self, draw_date: NaiveDate, record: WinningRecord) {
        self.draws.insert((record.game_type(), draw_date), record);
    }
}

impl WinningNumberSource for StaticWinningNumbers {
    fn lookup(&self, game_type: GameType, draw_date: &DrawDate) -> Result<Option<WinningRecord>> {
        let Some(date) = draw_date.date() else {
            return Ok(None);
        };
        Ok(self.draws.get(&(game_type, date)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_draw_lookup() {
        let table = StaticWinningNumbers::with_demo_draws().unwrap();
        let date = DrawDate::Known(NaiveDate::from_ymd_opt(2026, 1, 20).unwrap());

        let toto = table.lookup(GameType::Toto, &date).unwrap().unwrap();
        assert_eq!(toto.game_type(), GameType::Toto);

        let Some(WinningRecord::FourD(four_d)) = table.lookup(GameType::FourD, &date).unwrap()
        else {
            panic!("expected 4D record");
        };
        assert_eq!(four_d.first(), "4109");
    }

    #[test]
    fn test_unknown_and_missing_dates_are_absent() {
        let table = StaticWinningNumbers::with_demo_draws().unwrap();
        assert!(table.lookup(GameType::Toto, &DrawDate::Unknown).unwrap().is_none());

        let other = DrawDate::Known(NaiveDate::from_ymd_opt(2026, 1, 21).unwrap());
        assert!(table.lookup(GameType::FourD, &other).unwrap().is_none());
    }
}
