//! The immediate-mode 2D drawing surface engines render into.
//!
//! [`Surface`] is the small subset of a canvas 2D context the metaball
//! layers need: path construction, a gradient fill, a configurable drop
//! shadow and the compositing mode. The browser context, the CPU rasterizer
//! and the [`RecordingSurface`] used in tests all implement it.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::color::Srgb;
use crate::gradient::RadialGradient;

/// How subsequent fills combine with what is already on the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeOp {
    /// Regular alpha blending.
    #[default]
    SourceOver,
    /// Additive blending, the canvas `"lighter"` mode.
    Lighter,
}

impl CompositeOp {
    /// Name of the mode as a canvas `globalCompositeOperation` value.
    pub fn as_canvas_str(self) -> &'static str {
        match self {
            CompositeOp::SourceOver => "source-over",
            CompositeOp::Lighter => "lighter",
        }
    }
}

/// A blurred, offset shadow painted beneath every fill while active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub blur: f64,
    pub offset: DVec2,
    pub color: Srgb,
    pub alpha: f64,
}

impl Shadow {
    /// Dark drop shadow painted under every blob.
    pub const OUTER: Shadow = Shadow {
        blur: 30.0,
        offset: DVec2::new(5.0, 5.0),
        color: Srgb::BLACK,
        alpha: 0.4,
    };

    /// Light shadow offset up-left, painted with a second fill of the same
    /// path to fake a glossy highlight.
    pub const INNER: Shadow = Shadow {
        blur: 15.0,
        offset: DVec2::new(-2.0, -2.0),
        color: Srgb::WHITE,
        alpha: 0.3,
    };
}

/// Immediate-mode drawing target.
///
/// Path methods build a single current path; [`fill`](Surface::fill) paints
/// it with the current gradient, shadow and composite mode. A `line_to`
/// without a current point behaves like `move_to`.
pub trait Surface {
    /// Drawable width in device pixels.
    fn width(&self) -> f64;

    /// Drawable height in device pixels.
    fn height(&self) -> f64;

    /// Changes the drawable dimensions, discarding the current contents.
    fn resize(&mut self, width: f64, height: f64);

    /// Clears the whole surface.
    fn clear(&mut self);

    fn set_composite(&mut self, op: CompositeOp);

    fn set_fill(&mut self, gradient: &RadialGradient);

    /// Sets or removes (`None`) the shadow applied to subsequent fills.
    fn set_shadow(&mut self, shadow: Option<Shadow>);

    fn begin_path(&mut self);

    fn move_to(&mut self, p: DVec2);

    fn line_to(&mut self, p: DVec2);

    fn close_path(&mut self);

    fn fill(&mut self);
}

/// One call made against a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Resize(f64, f64),
    Clear,
    SetComposite(CompositeOp),
    SetFill(RadialGradient),
    SetShadow(Option<Shadow>),
    BeginPath,
    MoveTo(DVec2),
    LineTo(DVec2),
    ClosePath,
    Fill,
}

/// A surface that draws nothing and remembers every call.
///
/// Useful for asserting render order and for inspecting the exact
/// outlines a frame produced.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: f64,
    height: f64,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// All commands recorded so far, in call order.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Returns the recorded commands and starts a fresh history.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of `fill()` calls recorded.
    pub fn fill_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Fill))
            .count()
    }

    /// Reconstructs the polygons that were filled, one per path.
    ///
    /// A path filled twice (outer shadow pass and highlight pass) is
    /// reported once.
    pub fn filled_paths(&self) -> Vec<Vec<DVec2>> {
        let mut paths = Vec::new();
        let mut current: Vec<DVec2> = Vec::new();
        let mut filled_current = false;
        for command in &self.commands {
            match command {
                DrawCommand::BeginPath => {
                    current.clear();
                    filled_current = false;
                }
                DrawCommand::MoveTo(p) | DrawCommand::LineTo(p) => current.push(*p),
                DrawCommand::Fill if !filled_current && !current.is_empty() => {
                    paths.push(current.clone());
                    filled_current = true;
                }
                _ => {}
            }
        }
        paths
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.commands.push(DrawCommand::Resize(width, height));
    }

    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn set_composite(&mut self, op: CompositeOp) {
        self.commands.push(DrawCommand::SetComposite(op));
    }

    fn set_fill(&mut self, gradient: &RadialGradient) {
        self.commands.push(DrawCommand::SetFill(gradient.clone()));
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.commands.push(DrawCommand::SetShadow(shadow));
    }

    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, p: DVec2) {
        self.commands.push(DrawCommand::MoveTo(p));
    }

    fn line_to(&mut self, p: DVec2) {
        self.commands.push(DrawCommand::LineTo(p));
    }

    fn close_path(&mut self) {
        self.commands.push(DrawCommand::ClosePath);
    }

    fn fill(&mut self) {
        self.commands.push(DrawCommand::Fill);
    }
}
