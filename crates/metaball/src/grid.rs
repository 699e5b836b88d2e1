//! Sample grid and the lazy field sampler.
//!
//! A layer owns one [`Grid`] of `(sx + 2) x (sy + 2)` nodes spaced `step`
//! device pixels apart, where `sx = floor(width / step)`. Node `(col, row)`
//! sits at `(col * step, row * step)`. Nodes are stored row-major in one
//! contiguous arena and addressed by `(col, row)` pairs that may be negative
//! or past the end; [`Grid::index`] turns those into `None` instead of
//! aliasing neighbouring rows.

use glam::DVec2;
use log::trace;

use lava_lamp_core::EngineError;

use crate::ball::Ball;
use crate::point::Point;

/// Scale applied to the raw `Σ r² / d²` sum.
pub const FORCE_SCALE: f64 = 0.85;
/// Field magnitude a node must exceed to count as inside a blob.
pub const INSIDE_THRESHOLD: f64 = 1.0;
/// Fixed field magnitude of nodes on the outer border.
pub const BORDER_FORCE: f64 = 0.6;
/// Lower bound for a squared distance in the field sum.
const MIN_DISTANCE_SQ: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    step: f64,
    sx: usize,
    sy: usize,
    nodes: Vec<Point>,
}

impl Grid {
    /// Builds the node arena for a `width` x `height` drawable.
    ///
    /// Callers validate `width`, `height` and `step` beforehand. Returns
    /// `EngineError::InvalidDimensions` when the node count or the arena's
    /// byte size overflows `usize`, or when the arena cannot be allocated.
    pub fn new(width: f64, height: f64, step: f64) -> Result<Self, EngineError> {
        let sx = whole_steps(width, step)?;
        let sy = whole_steps(height, step)?;
        let cols = sx.checked_add(2).ok_or(EngineError::InvalidDimensions)?;
        let rows = sy.checked_add(2).ok_or(EngineError::InvalidDimensions)?;
        let len = cols
            .checked_mul(rows)
            .filter(|n| {
                n.checked_mul(std::mem::size_of::<Point>())
                    .is_some_and(|bytes| bytes <= isize::MAX as usize)
            })
            .ok_or(EngineError::InvalidDimensions)?;
        let mut nodes = Vec::new();
        nodes
            .try_reserve_exact(len)
            .map_err(|_| EngineError::InvalidDimensions)?;
        for row in 0..rows {
            for col in 0..cols {
                nodes.push(Point::new(col as f64 * step, row as f64 * step));
            }
        }
        Ok(Self {
            step,
            sx,
            sy,
            nodes,
        })
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// `(sx, sy)`: whole steps that fit in the drawable.
    pub fn steps(&self) -> (usize, usize) {
        (self.sx, self.sy)
    }

    pub fn cols(&self) -> usize {
        self.sx + 2
    }

    pub fn rows(&self) -> usize {
        self.sy + 2
    }

    /// Total node count.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Arena index of `(col, row)`, or `None` outside the grid.
    pub fn index(&self, col: isize, row: isize) -> Option<usize> {
        let col = usize::try_from(col).ok()?;
        let row = usize::try_from(row).ok()?;
        (col < self.cols() && row < self.rows()).then(|| row * self.cols() + col)
    }

    pub fn node(&self, col: isize, row: isize) -> Option<&Point> {
        self.index(col, row).map(|i| &self.nodes[i])
    }

    pub(crate) fn node_mut(&mut self, index: usize) -> &mut Point {
        &mut self.nodes[index]
    }

    pub fn nodes(&self) -> &[Point] {
        &self.nodes
    }

    /// True for nodes whose field is pinned to the border constant.
    ///
    /// That is row 0, column 0 and everything from column `sx` / row `sy`
    /// outwards, including the extra outer ring.
    pub fn is_border(&self, col: usize, row: usize) -> bool {
        col == 0 || row == 0 || col >= self.sx || row >= self.sy
    }

    /// Cell containing `p`, rounded to the nearest node.
    pub fn cell_at(&self, p: DVec2) -> (isize, isize) {
        let cell = (p / self.step).round();
        (cell.x as isize, cell.y as isize)
    }
}

/// `floor(extent / step)` as a node count.
fn whole_steps(extent: f64, step: f64) -> Result<usize, EngineError> {
    let steps = (extent / step).floor();
    if steps.is_finite() && steps >= 0.0 && steps < usize::MAX as f64 {
        Ok(steps as usize)
    } else {
        Err(EngineError::InvalidDimensions)
    }
}

/// Unsigned field strength at `p`: `0.85 * Σ r² / |p - ball|²`.
pub fn field_at(balls: &[Ball], p: DVec2) -> f64 {
    let magnitude = p.length_squared();
    FORCE_SCALE * balls.iter().map(|b| contribution(b, p, magnitude)).sum::<f64>()
}

/// One ball's term, using the expanded `|b|² + |p|² - 2 b·p` form so the
/// node magnitudes cached in the grid can be reused.
fn contribution(ball: &Ball, p: DVec2, magnitude: f64) -> f64 {
    let d2 = ball.magnitude() + magnitude - 2.0 * ball.pos.dot(p);
    ball.radius * ball.radius / d2.max(MIN_DISTANCE_SQ)
}

/// Per-frame identity: which generation is current and the sign every
/// sampled value carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStamp {
    pub generation: u64,
    pub polarity: f64,
}

/// Lazily evaluates the field at grid nodes for one frame.
///
/// Each node is computed at most once per generation; repeated queries
/// return the cached value.
pub struct FieldSampler<'a> {
    grid: &'a mut Grid,
    balls: &'a [Ball],
    stamp: FrameStamp,
}

impl<'a> FieldSampler<'a> {
    pub fn new(grid: &'a mut Grid, balls: &'a [Ball], stamp: FrameStamp) -> Self {
        Self { grid, balls, stamp }
    }

    pub fn grid(&self) -> &Grid {
        self.grid
    }

    pub fn balls(&self) -> &[Ball] {
        self.balls
    }

    pub fn stamp(&self) -> FrameStamp {
        self.stamp
    }

    /// Signed field value at `(col, row)`, or `None` outside the grid.
    pub fn force(&mut self, col: isize, row: isize) -> Option<f64> {
        let Some(index) = self.grid.index(col, row) else {
            trace!("field query outside grid at ({col}, {row})");
            return None;
        };
        let generation = self.stamp.generation;
        let border = self.grid.is_border(col as usize, row as usize);
        let node = self.grid.node_mut(index);
        if node.is_sampled_in(generation) {
            return Some(node.force);
        }
        let polarity = self.stamp.polarity;
        node.force = if border {
            BORDER_FORCE * polarity
        } else {
            let raw: f64 = self
                .balls
                .iter()
                .map(|b| contribution(b, node.pos, node.magnitude))
                .sum();
            polarity * FORCE_SCALE * raw
        };
        node.sampled = generation;
        Some(node.force)
    }

    /// True if `(col, row)` lies in the grid and its field exceeds the
    /// inside threshold. Out-of-range corners count as outside.
    pub fn is_inside(&mut self, col: isize, row: isize) -> bool {
        self.force(col, row).is_some_and(|f| f.abs() > INSIDE_THRESHOLD)
    }

    /// True if a walk already claimed the cell this generation.
    pub fn is_claimed(&self, index: usize) -> bool {
        self.grid.nodes[index].is_claimed_in(self.stamp.generation)
    }

    pub fn claim(&mut self, index: usize) {
        let generation = self.stamp.generation;
        self.grid.node_mut(index).computed = generation;
    }
}
