//! One independently animated metaball layer.
//!
//! A layer owns its grid, its balls and its gradient; nothing is shared
//! between layers. Each frame it moves the balls, advances the generation
//! (flipping the polarity), traces one contour per ball and fills every
//! non-empty contour twice: once under a dark drop shadow and once under a
//! light inset highlight.

use glam::DVec2;
use log::debug;
use serde::Serialize;
use serde_json::{json, Value};

use lava_lamp_core::{
    Engine, EngineError, LayerConfig, RadialGradient, Shadow, Surface, Xorshift64,
};

use crate::ball::{Ball, BallId, Confinement};
use crate::grid::{FieldSampler, FrameStamp, Grid};
use crate::point::UNSTAMPED;
use crate::tracer::{self, Contour, TraceOutcome};

/// Per-frame tally of walk outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TraceStats {
    /// Contours that produced a path.
    pub drawn: usize,
    pub closed: usize,
    pub out_of_bounds: usize,
    pub degenerate: usize,
}

impl TraceStats {
    pub fn from_contours(contours: &[Contour]) -> Self {
        contours.iter().fold(Self::default(), |mut stats, c| {
            if !c.is_empty() {
                stats.drawn += 1;
            }
            match c.outcome {
                TraceOutcome::Closed => stats.closed += 1,
                TraceOutcome::OutOfBounds => stats.out_of_bounds += 1,
                TraceOutcome::Degenerate => stats.degenerate += 1,
            }
            stats
        })
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            drawn: self.drawn + other.drawn,
            closed: self.closed + other.closed,
            out_of_bounds: self.out_of_bounds + other.out_of_bounds,
            degenerate: self.degenerate + other.degenerate,
        }
    }
}

pub(crate) fn check_dimensions(width: f64, height: f64) -> Result<(), EngineError> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidDimensions)
    }
}

fn check_grid_step(step: f64) -> Result<(), EngineError> {
    if step.is_finite() && step >= 1.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidConfig(format!(
            "grid_step must be >= 1, got {step}"
        )))
    }
}

pub struct MetaballLayer {
    config: LayerConfig,
    width: f64,
    height: f64,
    grid: Grid,
    balls: Vec<Ball>,
    gradient: RadialGradient,
    generation: u64,
    polarity: f64,
    frame: u64,
    last_stats: TraceStats,
}

impl MetaballLayer {
    /// Creates a layer for a `width` x `height` device-pixel drawable and
    /// spawns `config.balls` balls from `rng`.
    pub fn new(
        width: f64,
        height: f64,
        grid_step: f64,
        config: &LayerConfig,
        rng: &mut Xorshift64,
    ) -> Result<Self, EngineError> {
        check_dimensions(width, height)?;
        let balls = (0..config.balls)
            .map(|_| Ball::spawn(rng, width, height, config.speed))
            .collect();
        Self::with_balls(width, height, grid_step, config, balls)
    }

    /// Creates a layer sized to `surface`.
    pub fn for_surface(
        surface: &dyn Surface,
        grid_step: f64,
        config: &LayerConfig,
        rng: &mut Xorshift64,
    ) -> Result<Self, EngineError> {
        Self::new(surface.width(), surface.height(), grid_step, config, rng)
    }

    /// Creates a layer around explicitly placed balls. Each ball is
    /// confined before use; `config.balls` is ignored.
    pub fn with_balls(
        width: f64,
        height: f64,
        grid_step: f64,
        config: &LayerConfig,
        mut balls: Vec<Ball>,
    ) -> Result<Self, EngineError> {
        check_dimensions(width, height)?;
        check_grid_step(grid_step)?;
        let disk = Confinement::for_canvas(width, height);
        for ball in &mut balls {
            ball.confine(&disk);
        }
        let grid = Grid::new(width, height, grid_step)?;
        debug!(
            "layer: {} balls, {}x{} nodes, speed {}",
            balls.len(),
            grid.cols(),
            grid.rows(),
            config.speed
        );
        Ok(Self {
            config: config.clone(),
            width,
            height,
            gradient: RadialGradient::layer_ramp(width, height, config.colors),
            grid,
            balls,
            generation: UNSTAMPED + 1,
            polarity: 1.0,
            frame: 0,
            last_stats: TraceStats::default(),
        })
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn gradient(&self) -> &RadialGradient {
        &self.gradient
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.get(id)
    }

    pub fn ball_mut(&mut self, id: BallId) -> Option<&mut Ball> {
        self.balls.get_mut(id)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn polarity(&self) -> f64 {
        self.polarity
    }

    /// Outcome tally of the most recent [`trace_all`](Self::trace_all).
    pub fn last_stats(&self) -> TraceStats {
        self.last_stats
    }

    /// The disk the balls are kept in for the current size.
    pub fn confinement(&self) -> Confinement {
        Confinement::for_canvas(self.width, self.height)
    }

    /// Steps every ball once.
    pub fn move_balls(&mut self) {
        let disk = self.confinement();
        for ball in &mut self.balls {
            ball.step(&disk);
        }
    }

    /// Starts a new frame: every cached force and claim becomes stale.
    pub fn begin_frame(&mut self) {
        self.generation += 1;
        self.polarity = -self.polarity;
    }

    fn stamp(&self) -> FrameStamp {
        FrameStamp {
            generation: self.generation,
            polarity: self.polarity,
        }
    }

    /// Traces one contour per ball, in ball order, for the current frame.
    pub fn trace_all(&mut self) -> Vec<Contour> {
        let stamp = self.stamp();
        let mut sampler = FieldSampler::new(&mut self.grid, &self.balls, stamp);
        let contours: Vec<Contour> = (0..self.balls.len())
            .map(|id| tracer::trace(&mut sampler, id))
            .collect();
        self.last_stats = TraceStats::from_contours(&contours);
        contours
    }

    /// Field value at a node in the current frame, sampling it if needed.
    pub fn sample_force(&mut self, col: isize, row: isize) -> Option<f64> {
        let stamp = self.stamp();
        FieldSampler::new(&mut self.grid, &self.balls, stamp).force(col, row)
    }

    /// Fills every non-empty contour with the layer gradient.
    pub fn draw(&self, surface: &mut dyn Surface, contours: &[Contour]) {
        surface.set_fill(&self.gradient);
        for contour in contours.iter().filter(|c| !c.is_empty()) {
            trace_path(surface, &contour.points);
            surface.set_shadow(Some(Shadow::OUTER));
            surface.fill();
            surface.set_shadow(Some(Shadow::INNER));
            surface.fill();
            surface.set_shadow(None);
        }
    }
}

fn trace_path(surface: &mut dyn Surface, points: &[DVec2]) {
    surface.begin_path();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        surface.move_to(*first);
    }
    for p in iter {
        surface.line_to(*p);
    }
    surface.close_path();
}

impl Engine for MetaballLayer {
    fn render_frame(&mut self, surface: &mut dyn Surface) {
        self.move_balls();
        self.begin_frame();
        let contours = self.trace_all();
        self.draw(surface, &contours);
        self.frame += 1;
    }

    /// Rebuilds the grid and gradient. Balls keep their position and
    /// velocity; the next move pulls any ball outside the new disk back in.
    fn resize(&mut self, width: f64, height: f64) -> Result<(), EngineError> {
        check_dimensions(width, height)?;
        self.grid = Grid::new(width, height, self.grid.step())?;
        self.width = width;
        self.height = height;
        self.gradient = RadialGradient::layer_ramp(width, height, self.config.colors);
        debug!(
            "layer resized to {width}x{height}: {}x{} nodes",
            self.grid.cols(),
            self.grid.rows()
        );
        Ok(())
    }

    fn params(&self) -> Value {
        json!({
            "balls": self.balls.len(),
            "colors": self.config.colors.iter().map(|c| c.to_hex()).collect::<Vec<_>>(),
            "speed": self.config.speed,
            "grid_step": self.grid.step(),
            "width": self.width,
            "height": self.height,
        })
    }

    fn param_schema(&self) -> Value {
        json!({
            "balls": {
                "type": "integer",
                "default": 8,
                "min": 1,
                "description": "Number of field sources in the layer"
            },
            "colors": {
                "type": "array",
                "items": "string",
                "length": 3,
                "description": "Three base colors (#rrggbb) of the radial ramp"
            },
            "speed": {
                "type": "number",
                "default": 1.0,
                "exclusive_min": 0.0,
                "description": "Velocity multiplier applied at spawn; must be positive"
            },
            "grid_step": {
                "type": "number",
                "default": lava_lamp_core::config::DEFAULT_GRID_STEP,
                "min": 1.0,
                "description": "Spacing between grid nodes in device pixels"
            }
        })
    }

    fn frame(&self) -> u64 {
        self.frame
    }
}
