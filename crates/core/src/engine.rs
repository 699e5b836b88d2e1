//! The `Engine` trait every animated effect implements.
//!
//! The trait is object-safe so hosts can drive effects as `dyn Engine`
//! without knowing which one they hold.

use crate::error::EngineError;
use crate::surface::Surface;
use serde_json::Value;

/// A frame-stepped effect that draws itself onto a [`Surface`].
///
/// Hosts call [`render_frame`](Engine::render_frame) once per display
/// refresh and [`resize`](Engine::resize) whenever the drawable changes
/// size. Neither is ever called re-entrantly.
pub trait Engine {
    /// Advance the simulation by one frame and draw it.
    ///
    /// Never fails: per-frame anomalies are recovered internally and at
    /// worst leave a shape out of a single frame.
    fn render_frame(&mut self, surface: &mut dyn Surface);

    /// Rebuild size-dependent state for a drawable of `width` x `height`
    /// device pixels.
    ///
    /// Returns `EngineError::InvalidDimensions` for zero or non-finite sizes,
    /// in which case the previous state is kept.
    fn resize(&mut self, width: f64, height: f64) -> Result<(), EngineError>;

    /// Current parameter values as a JSON object.
    fn params(&self) -> Value;

    /// Schema describing the parameters, their types, ranges, and defaults.
    fn param_schema(&self) -> Value;

    /// Number of frames rendered so far.
    fn frame(&self) -> u64;
}
