//! Grid sample records.

use glam::DVec2;

/// Stamp carried by a node that was never sampled or claimed. Frame
/// generations start at `UNSTAMPED + 1` so a fresh node is always stale.
pub const UNSTAMPED: u64 = 0;

/// One node of a layer grid.
///
/// `magnitude` is `x² + y²`, precomputed so the field sum needs no square
/// roots. `force` is the last sampled field value; `sampled` is the frame
/// generation it was sampled in and `computed` the generation in which a
/// contour walk last claimed the cell whose top-left corner this node is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub pos: DVec2,
    pub magnitude: f64,
    pub force: f64,
    pub sampled: u64,
    pub computed: u64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            pos: DVec2::new(x, y),
            magnitude: x * x + y * y,
            force: 0.0,
            sampled: UNSTAMPED,
            computed: UNSTAMPED,
        }
    }

    /// True once the field value has been resolved in frame `generation`.
    pub fn is_sampled_in(&self, generation: u64) -> bool {
        self.sampled == generation
    }

    /// True once a walk has claimed this cell in frame `generation`.
    pub fn is_claimed_in(&self, generation: u64) -> bool {
        self.computed == generation
    }
}
