//! Payout table
//!
//! Maps a bet category and its chosen numbers to the set of pockets it covers,
//! and a winning number to a multiplier or a loss. The same structural
//! validation runs when a bet is accepted and when it is resolved.

use crate::errors::BetError;
use crate::roulette::board::{
    self, column_members, column_of, dozen_members, dozen_of, is_on_board, row_members, row_of,
    BOARD_SIZE, MAX_NUMBER,
};
use crate::roulette::types::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Single number payout (35:1)
pub const SINGLE_MULTIPLIER: u64 = 35;
/// Split payout (17:1)
pub const SPLIT_MULTIPLIER: u64 = 17;
/// Street payout (11:1)
pub const STREET_MULTIPLIER: u64 = 11;
/// Corner payout (8:1)
pub const CORNER_MULTIPLIER: u64 = 8;
/// Six-line payout (5:1)
pub const SIX_LINE_MULTIPLIER: u64 = 5;
/// Column and dozen payout (2:1)
pub const DOZEN_COLUMN_MULTIPLIER: u64 = 2;
/// Red/black, odd/even, low/high payout (1:1)
pub const EVEN_MONEY_MULTIPLIER: u64 = 1;

/// Board-wide partitions paid at even money.
///
/// The single chosen number selects the side: `0` is low / red / odd,
/// `1` is high / black / even.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvenMoneyGroup {
    Half,
    Color,
    Parity,
}

/// Closed set of bet categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetCategory {
    Single,
    Split,
    Street,
    Corner,
    SixLine,
    Column,
    Dozen,
    EvenMoney(EvenMoneyGroup),
}

impl BetCategory {
    /// All categories in wire-code order
    pub const ALL: [BetCategory; 10] = [
        BetCategory::Single,
        BetCategory::Split,
        BetCategory::Street,
        BetCategory::Corner,
        BetCategory::SixLine,
        BetCategory::Column,
        BetCategory::Dozen,
        BetCategory::EvenMoney(EvenMoneyGroup::Half),
        BetCategory::EvenMoney(EvenMoneyGroup::Color),
        BetCategory::EvenMoney(EvenMoneyGroup::Parity),
    ];

    /// Numeric bet code used by external callers
    pub fn code(&self) -> u8 {
        match self {
            BetCategory::Single => 0,
            BetCategory::Split => 1,
            BetCategory::Street => 2,
            BetCategory::Corner => 3,
            BetCategory::SixLine => 4,
            BetCategory::Column => 5,
            BetCategory::Dozen => 6,
            BetCategory::EvenMoney(EvenMoneyGroup::Half) => 7,
            BetCategory::EvenMoney(EvenMoneyGroup::Color) => 8,
            BetCategory::EvenMoney(EvenMoneyGroup::Parity) => 9,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn multiplier(&self) -> u64 {
        match self {
            BetCategory::Single => SINGLE_MULTIPLIER,
            BetCategory::Split => SPLIT_MULTIPLIER,
            BetCategory::Street => STREET_MULTIPLIER,
            BetCategory::Corner => CORNER_MULTIPLIER,
            BetCategory::SixLine => SIX_LINE_MULTIPLIER,
            BetCategory::Column | BetCategory::Dozen => DOZEN_COLUMN_MULTIPLIER,
            BetCategory::EvenMoney(_) => EVEN_MONEY_MULTIPLIER,
        }
    }
}

impl fmt::Display for BetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BetCategory::Single => "single",
            BetCategory::Split => "split",
            BetCategory::Street => "street",
            BetCategory::Corner => "corner",
            BetCategory::SixLine => "six-line",
            BetCategory::Column => "column",
            BetCategory::Dozen => "dozen",
            BetCategory::EvenMoney(EvenMoneyGroup::Half) => "low/high",
            BetCategory::EvenMoney(EvenMoneyGroup::Color) => "red/black",
            BetCategory::EvenMoney(EvenMoneyGroup::Parity) => "odd/even",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of a single bet against a winning number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Payout {
    Win { multiplier: u64 },
    Loss,
}

impl Payout {
    pub fn is_win(&self) -> bool {
        matches!(self, Payout::Win { .. })
    }

    /// Amount credited to the staker: the stake plus winnings, or nothing
    pub fn credit(&self, stake: Amount) -> Option<Amount> {
        match self {
            Payout::Win { multiplier } => stake.checked_mul(multiplier.checked_add(1)?),
            Payout::Loss => Some(0),
        }
    }

    /// Winnings beyond the returned stake
    pub fn winnings(&self, stake: Amount) -> Option<Amount> {
        match self {
            Payout::Win { multiplier } => stake.checked_mul(*multiplier),
            Payout::Loss => Some(0),
        }
    }
}

/// Set of pockets covered by a bet, one bit per pocket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coverage(u64);

impl Coverage {
    pub fn from_numbers<I: IntoIterator<Item = u8>>(numbers: I) -> Self {
        numbers
            .into_iter()
            .filter(|n| is_on_board(*n))
            .fold(Self(0), |acc, n| Self(acc.0 | (1u64 << n)))
    }

    pub fn contains(&self, n: u8) -> bool {
        is_on_board(n) && self.0 & (1u64 << n) != 0
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn numbers(&self) -> impl Iterator<Item = u8> + '_ {
        (0..BOARD_SIZE).filter(move |n| self.contains(*n))
    }
}

fn malformed(category: BetCategory, numbers: &[u8], reason: impl Into<String>) -> BetError {
    BetError::MalformedBet {
        category: category.to_string(),
        numbers: numbers.to_vec(),
        reason: reason.into(),
    }
}

fn expect_len(category: BetCategory, numbers: &[u8], len: usize) -> Result<(), BetError> {
    if numbers.len() != len {
        return Err(malformed(
            category,
            numbers,
            format!("expected {} numbers, got {}", len, numbers.len()),
        ));
    }
    Ok(())
}

/// Resolve a 12-number group given either as a selector `[0..=2]` or its full member list
fn twelve_group(
    category: BetCategory,
    numbers: &[u8],
    sorted: &[u8],
    index_of: fn(u8) -> Option<u8>,
    members: fn(u8) -> Vec<u8>,
) -> Result<Coverage, BetError> {
    match numbers.len() {
        1 if numbers[0] < 3 => Ok(Coverage::from_numbers(members(numbers[0]))),
        1 => Err(malformed(category, numbers, "selector must be 0, 1 or 2")),
        12 => {
            let index = index_of(sorted[0])
                .ok_or_else(|| malformed(category, numbers, "zero is not part of any group"))?;
            if members(index) != sorted {
                return Err(malformed(category, numbers, "numbers do not form one group"));
            }
            Ok(Coverage::from_numbers(sorted.iter().copied()))
        }
        n => Err(malformed(
            category,
            numbers,
            format!("expected a selector or 12 numbers, got {}", n),
        )),
    }
}

fn even_money(group: EvenMoneyGroup, side: u8) -> Coverage {
    let high = side == 1;
    Coverage::from_numbers((1..=MAX_NUMBER).filter(|n| match group {
        EvenMoneyGroup::Half => (*n > 18) == high,
        EvenMoneyGroup::Color => board::is_black(*n) == high,
        EvenMoneyGroup::Parity => (n % 2 == 0) == high,
    }))
}

/// Structural validation: returns the pockets a well-formed bet covers
pub fn coverage(category: BetCategory, numbers: &[u8]) -> Result<Coverage, BetError> {
    if let Some(n) = numbers.iter().find(|n| !is_on_board(**n)) {
        return Err(malformed(category, numbers, format!("{} is not on the board", n)));
    }

    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.len() != numbers.len() {
        return Err(malformed(category, numbers, "duplicate numbers"));
    }

    let covered = Coverage::from_numbers(sorted.iter().copied());

    match category {
        BetCategory::Single => {
            expect_len(category, numbers, 1)?;
            Ok(covered)
        }
        BetCategory::Split => {
            expect_len(category, numbers, 2)?;
            let (a, b) = (sorted[0], sorted[1]);
            let zero_split = a == 0 && (1..=3).contains(&b);
            let horizontal = a != 0 && b == a + 1 && row_of(a) == row_of(b);
            let vertical = a != 0 && b == a + 3;
            if zero_split || horizontal || vertical {
                Ok(covered)
            } else {
                Err(malformed(category, numbers, "numbers are not adjacent"))
            }
        }
        BetCategory::Street => {
            expect_len(category, numbers, 3)?;
            let zero_street = sorted == [0, 1, 2] || sorted == [0, 2, 3];
            let row_street = row_of(sorted[0]).map(row_members).as_ref() == Some(&[sorted[0], sorted[1], sorted[2]]);
            if zero_street || row_street {
                Ok(covered)
            } else {
                Err(malformed(category, numbers, "numbers do not form a row"))
            }
        }
        BetCategory::Corner => {
            expect_len(category, numbers, 4)?;
            let n = sorted[0];
            let first_four = sorted == [0, 1, 2, 3];
            let block = n != 0
                && column_of(n) != Some(2)
                && n + 4 <= MAX_NUMBER
                && sorted == [n, n + 1, n + 3, n + 4];
            if first_four || block {
                Ok(covered)
            } else {
                Err(malformed(category, numbers, "numbers do not form a 2x2 block"))
            }
        }
        BetCategory::SixLine => {
            expect_len(category, numbers, 6)?;
            let n = sorted[0];
            let line = n != 0
                && column_of(n) == Some(0)
                && n + 5 <= MAX_NUMBER
                && sorted.iter().copied().eq(n..n + 6);
            if line {
                Ok(covered)
            } else {
                Err(malformed(category, numbers, "numbers do not form two adjacent rows"))
            }
        }
        BetCategory::Column => twelve_group(category, numbers, &sorted, column_of, column_members),
        BetCategory::Dozen => twelve_group(category, numbers, &sorted, dozen_of, dozen_members),
        BetCategory::EvenMoney(group) => {
            expect_len(category, numbers, 1)?;
            if numbers[0] > 1 {
                return Err(malformed(category, numbers, "side must be 0 or 1"));
            }
            Ok(even_money(group, numbers[0]))
        }
    }
}

/// Validate a bet without resolving it
pub fn validate(category: BetCategory, numbers: &[u8]) -> Result<(), BetError> {
    coverage(category, numbers).map(|_| ())
}

/// Resolve a bet against the winning number
pub fn resolve(category: BetCategory, numbers: &[u8], winning_number: u8) -> Result<Payout, BetError> {
    let covered = coverage(category, numbers)?;
    if covered.contains(winning_number) {
        Ok(Payout::Win { multiplier: category.multiplier() })
    } else {
        Ok(Payout::Loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_malformed(result: Result<Payout, BetError>) -> bool {
        matches!(result, Err(BetError::MalformedBet { .. }))
    }

    #[test]
    fn test_single_zero_payout() {
        let win = resolve(BetCategory::Single, &[0], 0).unwrap();
        assert_eq!(win, Payout::Win { multiplier: 35 });
        assert_eq!(win.credit(1), Some(36));

        let loss = resolve(BetCategory::Single, &[0], 1).unwrap();
        assert_eq!(loss, Payout::Loss);
        assert_eq!(loss.credit(1), Some(0));
    }

    #[test]
    fn test_inside_bets_around_28() {
        assert!(resolve(BetCategory::Split, &[28, 31], 28).unwrap().is_win());
        assert!(resolve(BetCategory::Split, &[28, 29], 29).unwrap().is_win());
        assert!(resolve(BetCategory::Street, &[28, 29, 30], 30).unwrap().is_win());
        assert!(resolve(BetCategory::Corner, &[28, 29, 31, 32], 32).unwrap().is_win());
        assert!(resolve(BetCategory::SixLine, &[25, 26, 27, 28, 29, 30], 25).unwrap().is_win());
        assert_eq!(resolve(BetCategory::Street, &[28, 29, 30], 31).unwrap(), Payout::Loss);
    }

    #[test]
    fn test_rejects_non_adjacent_groupings() {
        assert!(is_malformed(resolve(BetCategory::Split, &[3, 4], 3)));
        assert!(is_malformed(resolve(BetCategory::Split, &[0, 4], 0)));
        assert!(is_malformed(resolve(BetCategory::Street, &[2, 3, 4], 2)));
        assert!(is_malformed(resolve(BetCategory::Corner, &[1, 2, 3, 4], 1)));
        assert!(is_malformed(resolve(BetCategory::Corner, &[3, 4, 6, 7], 3)));
        assert!(is_malformed(resolve(BetCategory::SixLine, &[2, 3, 4, 5, 6, 7], 2)));
        assert!(is_malformed(resolve(BetCategory::SixLine, &[34, 35, 36, 37, 38, 39], 34)));
    }

    #[test]
    fn test_rejects_wrong_cardinality_and_range() {
        assert!(is_malformed(resolve(
            BetCategory::EvenMoney(EvenMoneyGroup::Parity),
            &[0, 1],
            1
        )));
        assert!(is_malformed(resolve(BetCategory::Single, &[37], 0)));
        assert!(is_malformed(resolve(BetCategory::Single, &[], 0)));
        assert!(is_malformed(resolve(BetCategory::Split, &[5, 5], 5)));
        assert!(is_malformed(resolve(BetCategory::Column, &[3], 3)));
    }

    #[test]
    fn test_zero_groupings() {
        assert!(validate(BetCategory::Split, &[0, 2]).is_ok());
        assert!(validate(BetCategory::Street, &[2, 0, 3]).is_ok());
        assert!(validate(BetCategory::Corner, &[0, 1, 2, 3]).is_ok());
    }

    #[test]
    fn test_column_and_dozen_forms() {
        assert!(resolve(BetCategory::Column, &[0], 28).unwrap().is_win());
        assert_eq!(resolve(BetCategory::Column, &[1], 31).unwrap(), Payout::Loss);
        assert!(resolve(BetCategory::Dozen, &[2], 28).unwrap().is_win());

        let column: Vec<u8> = column_members(2).into_iter().rev().collect();
        assert!(resolve(BetCategory::Column, &column, 36).unwrap().is_win());

        let mut not_a_dozen = dozen_members(0);
        not_a_dozen[11] = 14;
        assert!(is_malformed(resolve(BetCategory::Dozen, &not_a_dozen, 1)));
    }

    #[test]
    fn test_even_money_sides() {
        let color = BetCategory::EvenMoney(EvenMoneyGroup::Color);
        let parity = BetCategory::EvenMoney(EvenMoneyGroup::Parity);
        let half = BetCategory::EvenMoney(EvenMoneyGroup::Half);

        assert!(resolve(color, &[1], 28).unwrap().is_win());
        assert_eq!(resolve(color, &[0], 28).unwrap(), Payout::Loss);
        assert!(resolve(parity, &[1], 12).unwrap().is_win());
        assert!(resolve(half, &[1], 28).unwrap().is_win());
        assert_eq!(resolve(half, &[0], 31).unwrap(), Payout::Loss);

        for category in [color, parity, half] {
            assert_eq!(resolve(category, &[0], 0).unwrap(), Payout::Loss);
            assert_eq!(resolve(category, &[1], 0).unwrap(), Payout::Loss);
        }
    }

    #[test]
    fn test_codes_round_trip_and_multipliers() {
        for category in BetCategory::ALL {
            assert_eq!(BetCategory::from_code(category.code()), Some(category));
        }
        assert_eq!(BetCategory::from_code(10), None);
        assert_eq!(BetCategory::Corner.multiplier(), 8);
        assert_eq!(BetCategory::Dozen.multiplier(), 2);
    }

    #[test]
    fn test_coverage_counts() {
        assert_eq!(coverage(BetCategory::SixLine, &[1, 2, 3, 4, 5, 6]).unwrap().count(), 6);
        assert_eq!(coverage(BetCategory::Dozen, &[1]).unwrap().count(), 12);
        assert_eq!(
            coverage(BetCategory::EvenMoney(EvenMoneyGroup::Color), &[0]).unwrap().count(),
            18
        );
    }
}
