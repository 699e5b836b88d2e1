//! Marching-squares contour walker.
//!
//! Starting from the cell under a ball's center, the walker climbs upward
//! through fully-inside cells until it reaches the blob boundary, then
//! follows the boundary cell by cell. Each step classifies the cell by which
//! of its four corners are inside (`|force| > 1`), picks an exit edge from a
//! fixed table and emits the interpolated crossing on that edge. The walk
//! ends when it re-enters a cell already claimed this frame, which is also
//! how a second ball inside an already traced blob produces nothing.

use glam::DVec2;
use log::{debug, trace};
use serde::Serialize;

use crate::ball::BallId;
use crate::grid::{FieldSampler, INSIDE_THRESHOLD};

/// Exit direction of a marching step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Cell offset to the neighbour across this edge.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    /// Corner offsets `(from, to)` of the exit edge. The crossing is
    /// interpolated starting at `from`.
    fn edge(self) -> ((isize, isize), (isize, isize)) {
        match self {
            Direction::Up => ((0, 0), (1, 0)),
            Direction::Right => ((1, 0), (1, 1)),
            Direction::Down => ((1, 1), (0, 1)),
            Direction::Left => ((0, 1), (0, 0)),
        }
    }
}

/// Corner offsets in mask-bit order: top-left, top-right, bottom-right,
/// bottom-left.
const CORNERS: [(isize, isize); 4] = [(0, 0), (1, 0), (1, 1), (0, 1)];

/// Mask of a cell whose four corners are all inside.
const FULL: u8 = 15;
const SADDLE_TL_BR: u8 = 5;
const SADDLE_TR_BL: u8 = 10;

/// Exit direction per corner mask. Entries 5 and 10 are the saddle defaults
/// used when the previous exit does not pick a side; 15 never exits.
const EXITS: [Direction; 16] = {
    use Direction::*;
    [
        Up, Left, Up, Left, Right, Right, Up, Left, Down, Down, Down, Down, Right, Right, Up, Up,
    ]
};

/// Exit for `mask`, resolving the two saddles by the previous exit.
pub fn exit_for(mask: u8, previous: Option<Direction>) -> Direction {
    match (mask, previous) {
        (SADDLE_TL_BR, Some(Direction::Down)) => Direction::Left,
        (SADDLE_TR_BL, Some(Direction::Left)) => Direction::Up,
        _ => EXITS[usize::from(mask & FULL)],
    }
}

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceOutcome {
    /// Re-entered a cell claimed this frame.
    Closed,
    /// Needed a cell or corner outside the grid.
    OutOfBounds,
    /// Hit the step cap without closing; the points are dropped.
    Degenerate,
}

/// The boundary traced from one ball.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub ball: BallId,
    pub points: Vec<DVec2>,
    pub outcome: TraceOutcome,
    /// Cells examined, including the one that ended the walk.
    pub steps: usize,
}

impl Contour {
    /// True if there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Even-odd point-in-polygon test against the closed outline.
    pub fn contains(&self, p: DVec2) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (self.points[i], self.points[j]);
            if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

enum Step {
    Exit(Direction, DVec2),
    Climb,
    Stop(TraceOutcome),
}

/// Walks the contour around `ball`, stamping cells in the sampler's grid.
pub fn trace(sampler: &mut FieldSampler<'_>, ball: BallId) -> Contour {
    let Some(center) = sampler.balls().get(ball).map(|b| b.pos) else {
        return Contour {
            ball,
            points: Vec::new(),
            outcome: TraceOutcome::OutOfBounds,
            steps: 0,
        };
    };
    let mut cell = sampler.grid().cell_at(center);
    let limit = 4 * sampler.grid().len();
    let mut previous = None;
    let mut points = Vec::new();

    for steps in 1..=limit {
        match march(sampler, cell, previous) {
            Step::Exit(dir, p) => {
                points.push(p);
                let (dc, dr) = dir.delta();
                cell = (cell.0 + dc, cell.1 + dr);
                previous = Some(dir);
            }
            Step::Climb => {
                cell.1 -= 1;
                previous = None;
            }
            Step::Stop(outcome) => {
                if outcome == TraceOutcome::OutOfBounds {
                    trace!("ball {ball}: walk left the grid at {cell:?} after {steps} steps");
                }
                return Contour {
                    ball,
                    points,
                    outcome,
                    steps,
                };
            }
        }
    }
    debug!(
        "ball {ball}: no closure after {limit} steps, dropping {} points",
        points.len()
    );
    Contour {
        ball,
        points: Vec::new(),
        outcome: TraceOutcome::Degenerate,
        steps: limit,
    }
}

fn march(
    sampler: &mut FieldSampler<'_>,
    (col, row): (isize, isize),
    previous: Option<Direction>,
) -> Step {
    let Some(index) = sampler.grid().index(col, row) else {
        return Step::Stop(TraceOutcome::OutOfBounds);
    };
    if sampler.is_claimed(index) {
        return Step::Stop(TraceOutcome::Closed);
    }

    let mask = CORNERS
        .iter()
        .enumerate()
        .filter(|(_, (dc, dr))| sampler.is_inside(col + dc, row + dr))
        .fold(0u8, |mask, (bit, _)| mask | (1 << bit));
    if mask == FULL {
        return Step::Climb;
    }

    let dir = exit_for(mask, previous);
    if mask != SADDLE_TL_BR && mask != SADDLE_TR_BL {
        sampler.claim(index);
    }

    match crossing(sampler, col, row, dir) {
        Some(p) => Step::Exit(dir, p),
        None => Step::Stop(TraceOutcome::OutOfBounds),
    }
}

/// Interpolated threshold crossing on the `dir` edge of cell `(col, row)`.
fn crossing(
    sampler: &mut FieldSampler<'_>,
    col: isize,
    row: isize,
    dir: Direction,
) -> Option<DVec2> {
    let ((fc, fr), (tc, tr)) = dir.edge();
    let (from_col, from_row) = (col + fc, row + fr);
    let (to_col, to_row) = (col + tc, row + tr);
    let from_force = sampler.force(from_col, from_row)?;
    let to_force = sampler.force(to_col, to_row)?;
    let from = sampler.grid().node(from_col, from_row)?.pos;
    let to = sampler.grid().node(to_col, to_row)?.pos;

    let a_from = (from_force.abs() - INSIDE_THRESHOLD).abs();
    let a_to = (to_force.abs() - INSIDE_THRESHOLD).abs();
    let sum = a_from + a_to;
    let t = if sum > 0.0 { a_from / sum } else { 0.5 };
    Some(from.lerp(to, t))
}
