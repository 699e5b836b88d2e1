//! Reproducible description of a lava lamp.
//!
//! A [`LampConfig`] captures everything needed to recreate an animation:
//! logical canvas size, pixel ratio, grid resolution, PRNG seed and the
//! per-layer ball counts, palettes and speeds. Two identical configs fed to
//! the same binary produce bit-identical frames.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::Srgb;
use crate::error::EngineError;
use crate::params::{param_f64, param_typed, param_u64, param_usize};

/// Default spacing between grid nodes, in device pixels.
pub const DEFAULT_GRID_STEP: f64 = 4.0;
/// Default logical canvas width.
pub const DEFAULT_WIDTH: usize = 800;
/// Default logical canvas height.
pub const DEFAULT_HEIGHT: usize = 600;
/// Default PRNG seed.
pub const DEFAULT_SEED: u64 = 42;
/// Widest per-pixel storage of any drawable the lamp renders into: one
/// RGBA `f32` quadruple.
const MAX_BYTES_PER_PIXEL: usize = 16;

/// The reference layer table: ball count, three base colors, speed.
const PRESETS: [(usize, [&str; 3], f64); 10] = [
    (8, ["#00ffff", "#00ccff", "#66b3ff"], 0.7),
    (8, ["#ff66ff", "#ff33cc", "#cc66ff"], 1.5),
    (8, ["#66ff99", "#33ffaa", "#00ffcc"], 1.0),
    (8, ["#ffff66", "#ffcc33", "#ffaa00"], 0.5),
    (8, ["#6666ff", "#8855ff", "#aa66ff"], 1.8),
    (8, ["#ff6666", "#ff5588", "#ff66aa"], 0.8),
    (8, ["#40e0d0", "#20d4c4", "#5fe8d8"], 1.3),
    (8, ["#e6b3ff", "#d699ff", "#cc80ff"], 0.6),
    (8, ["#ffb380", "#ff9966", "#ff8c66"], 1.4),
    (8, ["#98ff98", "#7fffd4", "#b0ffb0"], 2.0),
];

/// One independently animated metaball layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Number of balls in the layer.
    pub balls: usize,
    /// The three base colors of the layer's radial ramp.
    pub colors: [Srgb; 3],
    /// Velocity multiplier applied at spawn.
    pub speed: f64,
}

impl LayerConfig {
    /// Parses a layer from hex colors.
    pub fn from_hex(balls: usize, colors: [&str; 3], speed: f64) -> Result<Self, EngineError> {
        Ok(Self {
            balls,
            colors: [
                Srgb::from_hex(colors[0])?,
                Srgb::from_hex(colors[1])?,
                Srgb::from_hex(colors[2])?,
            ],
            speed,
        })
    }

    /// The ten reference layers.
    pub fn presets() -> Vec<LayerConfig> {
        PRESETS
            .iter()
            .filter_map(|(balls, colors, speed)| Self::from_hex(*balls, *colors, *speed).ok())
            .collect()
    }

    fn validate(&self, index: usize) -> Result<(), EngineError> {
        if self.balls == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "layer {index}: balls must be at least 1"
            )));
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "layer {index}: speed must be finite and positive, got {}",
                self.speed
            )));
        }
        Ok(())
    }
}

/// Full lamp description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LampConfig {
    /// Logical width (CSS pixels).
    pub width: usize,
    /// Logical height (CSS pixels).
    pub height: usize,
    /// Device pixels per logical pixel.
    pub pixel_ratio: f64,
    /// Grid node spacing in device pixels.
    pub grid_step: f64,
    pub seed: u64,
    pub layers: Vec<LayerConfig>,
}

impl Default for LampConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            pixel_ratio: 1.0,
            grid_step: DEFAULT_GRID_STEP,
            seed: DEFAULT_SEED,
            layers: LayerConfig::presets(),
        }
    }
}

impl LampConfig {
    /// Parses a JSON document; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: LampConfig =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Io(format!("{}: {e}", path.display())))?;
        let config = Self::from_json_str(&text)?;
        debug!(
            "loaded {}: {}x{} at ratio {}, {} layers, seed {}",
            path.display(),
            config.width,
            config.height,
            config.pixel_ratio,
            config.layers.len(),
            config.seed
        );
        Ok(config)
    }

    /// Applies loose overrides such as `{"seed": 7, "grid_step": 6}`.
    ///
    /// Scalar keys that are missing or mistyped keep their current value;
    /// a malformed `layers` entry is an error. The result is validated.
    pub fn apply_params(&mut self, params: &Value) -> Result<(), EngineError> {
        debug!("applying config overrides {params}");
        self.width = param_usize(params, "width", self.width);
        self.height = param_usize(params, "height", self.height);
        self.pixel_ratio = param_f64(params, "pixel_ratio", self.pixel_ratio);
        self.grid_step = param_f64(params, "grid_step", self.grid_step);
        self.seed = param_u64(params, "seed", self.seed);
        if let Some(layers) = param_typed::<Vec<LayerConfig>>(params, "layers")? {
            self.layers = layers;
        }
        self.validate()
    }

    /// Checks dimensions, pixel ratio, grid step and every layer.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.width == 0 || self.height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        self.width
            .checked_mul(self.height)
            .ok_or(EngineError::InvalidDimensions)?;
        if !(self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "pixel_ratio must be finite and positive, got {}",
                self.pixel_ratio
            )));
        }
        let (device_w, device_h) = self.device_size();
        device_pixels(device_w, device_h)?;
        if !(self.grid_step.is_finite() && self.grid_step >= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "grid_step must be >= 1, got {}",
                self.grid_step
            )));
        }
        if self.layers.is_empty() {
            return Err(EngineError::InvalidConfig(
                "at least one layer is required".into(),
            ));
        }
        self.layers
            .iter()
            .enumerate()
            .try_for_each(|(i, layer)| layer.validate(i))
    }

    /// Drawable size in device pixels.
    pub fn device_size(&self) -> (f64, f64) {
        (
            (self.width as f64 * self.pixel_ratio).floor(),
            (self.height as f64 * self.pixel_ratio).floor(),
        )
    }
}

/// Pixel count of a `width` x `height` device-pixel drawable.
///
/// Returns `EngineError::InvalidDimensions` for an empty drawable or when
/// its pixel buffer could not be addressed.
pub fn device_pixels(width: f64, height: f64) -> Result<usize, EngineError> {
    let (Some(w), Some(h)) = (whole_pixels(width), whole_pixels(height)) else {
        return Err(EngineError::InvalidDimensions);
    };
    w.checked_mul(h)
        .filter(|n| {
            n.checked_mul(MAX_BYTES_PER_PIXEL)
                .is_some_and(|bytes| bytes <= isize::MAX as usize)
        })
        .ok_or(EngineError::InvalidDimensions)
}

fn whole_pixels(v: f64) -> Option<usize> {
    (v.is_finite() && v >= 1.0 && v < usize::MAX as f64).then(|| v as usize)
}
