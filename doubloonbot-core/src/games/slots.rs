//! 3x3 slot machine: grid sampling and line evaluation.
//!
//! A "line" is any of 8 fixed triples: 3 rows, 3 columns, 2 diagonals,
//! checked in that order. The first monochrome line decides the outcome;
//! simultaneous winning lines do not combine.

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotSymbol {
    Cherry,
    Lemon,
    Grape,
    Melon,
    Bell,
    Star,
    Diamond,
    Seven,
}

/// The full symbol alphabet, sampled uniformly per cell.
pub const SYMBOLS: [SlotSymbol; 8] = [
    SlotSymbol::Cherry,
    SlotSymbol::Lemon,
    SlotSymbol::Grape,
    SlotSymbol::Melon,
    SlotSymbol::Bell,
    SlotSymbol::Star,
    SlotSymbol::Diamond,
    SlotSymbol::Seven,
];

impl SlotSymbol {
    /// Fixed payout for a line of three. The table is total over the
    /// alphabet; a symbol missing from it would pay 0.
    pub fn payout(self) -> i64 {
        match self {
            SlotSymbol::Cherry => 10,
            SlotSymbol::Lemon => 15,
            SlotSymbol::Grape => 20,
            SlotSymbol::Melon => 25,
            SlotSymbol::Bell => 40,
            SlotSymbol::Star => 60,
            SlotSymbol::Diamond => 100,
            SlotSymbol::Seven => 250,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            SlotSymbol::Cherry => "\u{1F352}",
            SlotSymbol::Lemon => "\u{1F34B}",
            SlotSymbol::Grape => "\u{1F347}",
            SlotSymbol::Melon => "\u{1F349}",
            SlotSymbol::Bell => "\u{1F514}",
            SlotSymbol::Star => "\u{2B50}",
            SlotSymbol::Diamond => "\u{1F48E}",
            SlotSymbol::Seven => "7\u{FE0F}\u{20E3}",
        }
    }
}

/// `grid[row][column]`.
pub type SlotGrid = [[SlotSymbol; 3]; 3];

/// The 8 paylines as (row, column) triples: rows, then columns, then the
/// two diagonals. Evaluation order is part of the contract.
const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinOutcome {
    pub win: bool,
    pub symbol: Option<SlotSymbol>,
    pub payout: i64,
}

impl SpinOutcome {
    fn lose() -> Self {
        Self { win: false, symbol: None, payout: 0 }
    }
}

/// Sample a fresh grid, every cell independent and uniform.
pub fn spin(rng: &mut impl Rng) -> SlotGrid {
    let mut grid = [[SlotSymbol::Cherry; 3]; 3];
    for row in grid.iter_mut() {
        for cell in row.iter_mut() {
            *cell = SYMBOLS[rng.random_range(0..SYMBOLS.len())];
        }
    }
    grid
}

/// Walk the 8 lines in fixed order; the first one with three identical
/// symbols wins and its symbol's payout is returned. No line, no payout.
pub fn evaluate(grid: &SlotGrid) -> SpinOutcome {
    for line in LINES {
        let [a, b, c] = line.map(|(r, col)| grid[r][col]);
        if a == b && b == c {
            return SpinOutcome { win: true, symbol: Some(a), payout: a.payout() };
        }
    }
    SpinOutcome::lose()
}
