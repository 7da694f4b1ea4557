//! Single-zero board layout
//!
//! Numbers 1..=36 are laid out in 12 rows of three. Row `r` (0-based) holds
//! `3r+1, 3r+2, 3r+3`; column `c` holds every `n` with `(n - 1) % 3 == c`.

/// Number of pockets on the wheel (0 and 1..=36)
pub const BOARD_SIZE: u8 = 37;

/// Highest number on the layout
pub const MAX_NUMBER: u8 = 36;

/// Rows on the layout
pub const ROWS: u8 = 12;

/// Red pockets of the single-zero wheel
pub const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

pub fn is_on_board(n: u8) -> bool {
    n < BOARD_SIZE
}

pub fn is_red(n: u8) -> bool {
    RED_NUMBERS.contains(&n)
}

pub fn is_black(n: u8) -> bool {
    n != 0 && is_on_board(n) && !is_red(n)
}

/// Row index of a non-zero number
pub fn row_of(n: u8) -> Option<u8> {
    (1..=MAX_NUMBER).contains(&n).then(|| (n - 1) / 3)
}

/// Column index (0..3) of a non-zero number
pub fn column_of(n: u8) -> Option<u8> {
    (1..=MAX_NUMBER).contains(&n).then(|| (n - 1) % 3)
}

/// Dozen index (0..3) of a non-zero number
pub fn dozen_of(n: u8) -> Option<u8> {
    (1..=MAX_NUMBER).contains(&n).then(|| (n - 1) / 12)
}

/// The three numbers of a row
pub fn row_members(row: u8) -> [u8; 3] {
    let first = row * 3 + 1;
    [first, first + 1, first + 2]
}

/// The twelve numbers of a column, ascending
pub fn column_members(column: u8) -> Vec<u8> {
    (0..ROWS).map(|row| row * 3 + 1 + column).collect()
}

/// The twelve numbers of a dozen, ascending
pub fn dozen_members(dozen: u8) -> Vec<u8> {
    let first = dozen * 12 + 1;
    (first..first + 12).collect()
}
