//! Mask patterns and the structural penalty used to choose between them.

use crate::error::{QrError, Result};
use crate::grid::ModuleGrid;

/// A mask pattern (0–7).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct Mask(u8);

impl Mask {
    /// All eight masks in id order.
    pub const ALL: [Mask; 8] = [
        Mask(0),
        Mask(1),
        Mask(2),
        Mask(3),
        Mask(4),
        Mask(5),
        Mask(6),
        Mask(7),
    ];

    /// Creates a mask object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [0, 7].
    pub const fn new(mask: u8) -> Self {
        assert!(mask <= 7, "Mask value out of range");
        Self(mask)
    }

    /// Creates a mask object, failing with [`QrError::InvalidConfiguration`]
    /// if the number is outside the range [0, 7].
    pub fn try_new(mask: u8) -> Result<Self> {
        if mask <= 7 {
            Ok(Self(mask))
        } else {
            Err(QrError::InvalidConfiguration(format!("mask {} is outside 0..=7", mask)))
        }
    }

    /// Returns the value, which is in the range [0, 7].
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Returns whether this mask inverts the module at column `x`, row `y`.
    pub fn inverts(self, x: u8, y: u8) -> bool {
        let x = i32::from(x);
        let y = i32::from(y);
        match self.0 {
            0 => (x + y) % 2 == 0,
            1 => y % 2 == 0,
            2 => x % 3 == 0,
            3 => (x + y) % 3 == 0,
            4 => (x / 3 + y / 2) % 2 == 0,
            5 => ((x * y) % 2) + ((x * y) % 3) == 0,
            6 => (((x * y) % 2) + ((x * y) % 3)) % 2 == 0,
            7 => (((x + y) % 2) + ((x * y) % 3)) % 2 == 0,
            _ => unreachable!(),
        }
    }

    /// XORs every non-function module with this mask's pattern.
    ///
    /// Applying the same mask twice restores the grid.
    pub fn apply(self, modules: &mut ModuleGrid, functionmodules: &ModuleGrid) {
        let size = modules.size();
        for y in 0..size {
            for x in 0..size {
                if !functionmodules.get_bounded(x, y) && self.inverts(x, y) {
                    modules.toggle(x, y);
                }
            }
        }
    }
}

const PENALTY_N1: i32 = 3;
const PENALTY_N2: i32 = 3;
const PENALTY_N3: i32 = 40;
const PENALTY_N4: i32 = 10;

/// Computes the penalty score of a finished (masked, format-drawn) grid.
///
/// Sums four components: runs of five or more same-colored modules in a row or
/// column, 2×2 same-colored blocks, finder-like 1:1:3:1:1 patterns with four light
/// modules on either side, and the deviation of the dark proportion from 50%.
pub fn penalty_score(modules: &ModuleGrid) -> i32 {
    let mut result: i32 = 0;
    let size: u8 = modules.size();

    // Adjacent modules in row having same color, and finder-like patterns
    for y in 0..size {
        result += line_penalty(size, |i| modules.get_bounded(i, y));
    }
    // Adjacent modules in column having same color, and finder-like patterns
    for x in 0..size {
        result += line_penalty(size, |i| modules.get_bounded(x, i));
    }

    // 2*2 blocks of modules having same color
    for y in 0..size - 1 {
        for x in 0..size - 1 {
            let color: bool = modules.get_bounded(x, y);
            if
                color == modules.get_bounded(x + 1, y) &&
                color == modules.get_bounded(x, y + 1) &&
                color == modules.get_bounded(x + 1, y + 1)
            {
                result += PENALTY_N2;
            }
        }
    }

    // Balance of dark and light modules
    let dark = modules.count_dark() as i32;
    let total = i32::from(size) * i32::from(size);
    // Smallest k >= 0 such that (45-5k)% <= dark/total <= (55+5k)%
    let k: i32 = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
    result += k * PENALTY_N4;
    result
}

fn line_penalty(size: u8, module: impl Fn(u8) -> bool) -> i32 {
    let mut result: i32 = 0;
    let mut runcolor = false;
    let mut runlen: i32 = 0;
    let mut runhistory = FinderPenalty::new(size);
    for i in 0..size {
        if module(i) == runcolor {
            runlen += 1;
            if runlen == 5 {
                result += PENALTY_N1;
            } else if runlen > 5 {
                result += 1;
            }
        } else {
            runhistory.add_history(runlen);
            if !runcolor {
                result += runhistory.count_patterns() * PENALTY_N3;
            }
            runcolor = module(i);
            runlen = 1;
        }
    }
    result + runhistory.terminate_and_count(runcolor, runlen) * PENALTY_N3
}

/// Picks the mask with the lowest score, the lowest id winning ties.
pub fn select_best(scores: &[(Mask, i32)]) -> Option<Mask> {
    scores
        .iter()
        .min_by_key(|&&(mask, penalty)| (penalty, mask))
        .map(|&(mask, _)| mask)
}

/// Recent run lengths of one row or column, used to detect finder-like patterns.
struct FinderPenalty {
    qr_size: i32,
    run_history: [i32; 7],
}

impl FinderPenalty {
    fn new(size: u8) -> Self {
        Self {
            qr_size: i32::from(size),
            run_history: [0; 7],
        }
    }

    // Pushes the given run length to the front, treating the light border as one long run.
    fn add_history(&mut self, mut currentrunlength: i32) {
        if self.run_history[0] == 0 {
            currentrunlength += self.qr_size;
        }
        let len: usize = self.run_history.len();
        self.run_history.copy_within(0..len - 1, 1);
        self.run_history[0] = currentrunlength;
    }

    // Can only be called immediately after a light run is added; returns 0, 1 or 2.
    fn count_patterns(&self) -> i32 {
        let rh = &self.run_history;
        let n = rh[1];
        debug_assert!(n <= self.qr_size * 3);
        let core = n > 0 && rh[2] == n && rh[3] == n * 3 && rh[4] == n && rh[5] == n;
        i32::from(core && rh[0] >= n * 4 && rh[6] >= n) +
            i32::from(core && rh[6] >= n * 4 && rh[0] >= n)
    }

    fn terminate_and_count(mut self, currentruncolor: bool, mut currentrunlength: i32) -> i32 {
        if currentruncolor {
            // Terminate dark run
            self.add_history(currentrunlength);
            currentrunlength = 0;
        }
        // Add light border to final run
        currentrunlength += self.qr_size;
        self.add_history(currentrunlength);
        self.count_patterns()
    }
}
