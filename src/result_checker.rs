//! Prize checking against a draw's winning numbers.

use std::collections::HashSet;

use crate::error::{CheckError, RecordError};
use crate::ticket::Ticket;
use crate::types::{
    Combination, FourDCategory, FourDWinning, PrizeResult, TierCounts, TotoWinning,
    WinningRecord,
};

/// Counts how many TOTO combinations match 3, 4, 5 or 6 winning numbers.
pub struct ResultChecker {
    winning_numbers: HashSet<u8>,
}

impl ResultChecker {
    pub fn new(winning: &TotoWinning) -> Self {
        Self {
            winning_numbers: winning.numbers().iter().copied().collect(),
        }
    }

    pub fn check_combinations(
        &self,
        combinations: impl IntoIterator<Item = Combination>,
    ) -> TierCounts {
        let mut counts = TierCounts::new();

        for combination in combinations {
            let Combination::Toto(numbers) = combination else {
                continue;
            };
            let matched: HashSet<u8> = numbers
                .iter()
                .copied()
                .filter(|n| self.winning_numbers.contains(n))
                .collect();
            if matched.len() >= 3 {
                counts.record(matched.len());
            }
        }

        counts
    }
}

/// First prize slot the number appears in, in order first, second, third,
/// starter, consolation.
pub fn check_four_d(winning: &FourDWinning, number: &str) -> Option<FourDCategory> {
    if number == winning.first() {
        Some(FourDCategory::First)
    } else if number == winning.second() {
        Some(FourDCategory::Second)
    } else if number == winning.third() {
        Some(FourDCategory::Third)
    } else if winning.starter().iter().any(|n| n == number) {
        Some(FourDCategory::Starter)
    } else if winning.consolation().iter().any(|n| n == number) {
        Some(FourDCategory::Consolation)
    } else {
        None
    }
}

/// Scores a ticket against the winning numbers of its draw.
pub fn score_ticket(ticket: &Ticket, winning: &WinningRecord) -> Result<PrizeResult, CheckError> {
    let mut combinations = ticket.expand_combinations();

    match winning {
        WinningRecord::Toto(toto) if ticket.game_type() == winning.game_type() => {
            let checker = ResultChecker::new(toto);
            Ok(PrizeResult::Toto(checker.check_combinations(combinations)))
        }
        WinningRecord::FourD(four_d) if ticket.game_type() == winning.game_type() => {
            let prize_category = combinations.find_map(|combination| match combination {
                Combination::FourD(number) => check_four_d(four_d, &number),
                Combination::Toto(_) => None,
            });
            Ok(PrizeResult::FourD { prize_category })
        }
        _ => Err(CheckError::Source(
            RecordError::GameMismatch {
                expected: ticket.game_type(),
                found: winning.game_type(),
            }
            .into(),
        )),
    }
}
