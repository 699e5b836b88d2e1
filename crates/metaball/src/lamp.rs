//! The multi-layer frame driver.
//!
//! A [`Lamp`] owns every layer of the effect and draws them, in order, onto
//! one shared surface with additive compositing. Layers never see each
//! other; the glow where blobs of different layers overlap comes entirely
//! from the `lighter` blend.

use log::{debug, info};
use serde_json::{json, Value};

use lava_lamp_core::{CompositeOp, Engine, EngineError, LampConfig, Surface, Xorshift64};

use crate::layer::{check_dimensions, MetaballLayer, TraceStats};

pub struct Lamp {
    config: LampConfig,
    layers: Vec<MetaballLayer>,
    width: f64,
    height: f64,
    frame: u64,
}

impl Lamp {
    /// Builds every layer at the config's device-pixel size.
    pub fn new(config: LampConfig) -> Result<Self, EngineError> {
        let (width, height) = config.device_size();
        Self::with_size(config, width, height)
    }

    /// Builds every layer at the size of `surface`, ignoring the config's
    /// own dimensions.
    pub fn for_surface(config: LampConfig, surface: &dyn Surface) -> Result<Self, EngineError> {
        Self::with_size(config, surface.width(), surface.height())
    }

    fn with_size(config: LampConfig, width: f64, height: f64) -> Result<Self, EngineError> {
        config.validate()?;
        check_dimensions(width, height)?;
        let layers = config
            .layers
            .iter()
            .enumerate()
            .map(|(i, layer)| {
                let mut rng = Xorshift64::for_stream(config.seed, i as u64);
                MetaballLayer::new(width, height, config.grid_step, layer, &mut rng)
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            "lamp: {} layers, {} balls, {width}x{height} device pixels, seed {}",
            layers.len(),
            layers.iter().map(|l| l.balls().len()).sum::<usize>(),
            config.seed
        );
        Ok(Self {
            config,
            layers,
            width,
            height,
            frame: 0,
        })
    }

    pub fn config(&self) -> &LampConfig {
        &self.config
    }

    pub fn layers(&self) -> &[MetaballLayer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [MetaballLayer] {
        &mut self.layers
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Walk outcomes of the last frame, summed over layers.
    pub fn last_stats(&self) -> TraceStats {
        self.layers
            .iter()
            .map(MetaballLayer::last_stats)
            .fold(TraceStats::default(), TraceStats::merge)
    }
}

impl Engine for Lamp {
    fn render_frame(&mut self, surface: &mut dyn Surface) {
        surface.clear();
        for layer in &mut self.layers {
            surface.set_composite(CompositeOp::Lighter);
            layer.render_frame(surface);
        }
        self.frame += 1;
    }

    /// Resizes every layer. Invalid sizes are rejected before any layer
    /// changes.
    fn resize(&mut self, width: f64, height: f64) -> Result<(), EngineError> {
        check_dimensions(width, height)?;
        for layer in &mut self.layers {
            layer.resize(width, height)?;
        }
        self.width = width;
        self.height = height;
        debug!("lamp resized to {width}x{height}");
        Ok(())
    }

    fn params(&self) -> Value {
        let mut params = serde_json::to_value(&self.config).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut params {
            map.insert("device_width".into(), json!(self.width));
            map.insert("device_height".into(), json!(self.height));
        }
        params
    }

    fn param_schema(&self) -> Value {
        json!({
            "width": {
                "type": "integer",
                "default": lava_lamp_core::config::DEFAULT_WIDTH,
                "min": 1,
                "description": "Logical canvas width"
            },
            "height": {
                "type": "integer",
                "default": lava_lamp_core::config::DEFAULT_HEIGHT,
                "min": 1,
                "description": "Logical canvas height"
            },
            "pixel_ratio": {
                "type": "number",
                "default": 1.0,
                "exclusive_min": 0.0,
                "description": "Device pixels per logical pixel"
            },
            "grid_step": {
                "type": "number",
                "default": lava_lamp_core::config::DEFAULT_GRID_STEP,
                "min": 1.0,
                "description": "Spacing between grid nodes in device pixels"
            },
            "seed": {
                "type": "integer",
                "default": lava_lamp_core::config::DEFAULT_SEED,
                "description": "PRNG seed; each layer derives its own stream"
            },
            "layers": {
                "type": "array",
                "items": "object",
                "description": "Per-layer {balls, colors, speed}; defaults to the ten presets"
            }
        })
    }

    fn frame(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lava_lamp_core::{DrawCommand, LayerConfig, RecordingSurface};

    fn small_config() -> LampConfig {
        LampConfig {
            width: 200,
            height: 150,
            layers: LayerConfig::presets().into_iter().take(3).collect(),
            ..LampConfig::default()
        }
    }

    #[test]
    fn default_config_builds_ten_layers() {
        let lamp = Lamp::new(LampConfig::default()).unwrap();
        assert_eq!(lamp.layers().len(), 10);
        assert_eq!(lamp.size(), (800.0, 600.0));
        assert!(lamp.layers().iter().all(|l| l.balls().len() == 8));
    }

    #[test]
    fn pixel_ratio_scales_device_size() {
        let config = LampConfig {
            pixel_ratio: 2.0,
            ..small_config()
        };
        let lamp = Lamp::new(config).unwrap();
        assert_eq!(lamp.size(), (400.0, 300.0));
        assert_eq!(lamp.layers()[0].grid().steps(), (100, 75));
    }

    #[test]
    fn for_surface_uses_surface_dimensions() {
        let surface = RecordingSurface::new(123.0, 77.0);
        let lamp = Lamp::for_surface(small_config(), &surface).unwrap();
        assert_eq!(lamp.size(), (123.0, 77.0));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = LampConfig {
            layers: Vec::new(),
            ..LampConfig::default()
        };
        assert!(Lamp::new(config).is_err());
    }

    #[test]
    fn layers_get_distinct_streams() {
        let lamp = Lamp::new(small_config()).unwrap();
        let layers = lamp.layers();
        assert_ne!(layers[0].balls()[0].pos, layers[1].balls()[0].pos);
    }

    #[test]
    fn same_seed_renders_identical_frames() {
        let mut a = Lamp::new(small_config()).unwrap();
        let mut b = Lamp::new(small_config()).unwrap();
        let mut sa = RecordingSurface::new(200.0, 150.0);
        let mut sb = RecordingSurface::new(200.0, 150.0);
        for _ in 0..20 {
            a.render_frame(&mut sa);
            b.render_frame(&mut sb);
        }
        assert_eq!(sa.commands(), sb.commands());
    }

    #[test]
    fn frame_clears_once_then_blends_each_layer_additively() {
        let mut lamp = Lamp::new(small_config()).unwrap();
        let mut surface = RecordingSurface::new(200.0, 150.0);
        lamp.render_frame(&mut surface);
        let cmds = surface.commands();
        assert_eq!(cmds[0], DrawCommand::Clear);
        assert_eq!(cmds.iter().filter(|c| **c == DrawCommand::Clear).count(), 1);
        let composites: Vec<&DrawCommand> = cmds
            .iter()
            .filter(|c| matches!(c, DrawCommand::SetComposite(_)))
            .collect();
        assert_eq!(composites.len(), 3);
        assert!(composites
            .iter()
            .all(|c| **c == DrawCommand::SetComposite(CompositeOp::Lighter)));
        assert_eq!(lamp.frame(), 1);
    }

    #[test]
    fn resize_reaches_every_layer() {
        let mut lamp = Lamp::new(LampConfig::default()).unwrap();
        lamp.resize(400.0, 300.0).unwrap();
        assert_eq!(lamp.size(), (400.0, 300.0));
        for layer in lamp.layers() {
            assert_eq!(layer.grid().steps(), (100, 75));
        }
    }

    #[test]
    fn resize_rejects_zero_without_touching_layers() {
        let mut lamp = Lamp::new(small_config()).unwrap();
        assert!(matches!(
            lamp.resize(0.0, 10.0),
            Err(EngineError::InvalidDimensions)
        ));
        assert_eq!(lamp.size(), (200.0, 150.0));
        assert_eq!(lamp.layers()[2].size(), (200.0, 150.0));
    }

    #[test]
    fn reference_lamp_survives_shrink_mid_animation() {
        let mut lamp = Lamp::new(LampConfig::default()).unwrap();
        let mut surface = RecordingSurface::new(800.0, 600.0);
        for _ in 0..30 {
            lamp.render_frame(&mut surface);
            surface.take_commands();
        }
        lamp.resize(400.0, 300.0).unwrap();
        surface.resize(400.0, 300.0);
        for frame in 0..100 {
            lamp.render_frame(&mut surface);
            surface.take_commands();
            if frame >= 1 {
                for layer in lamp.layers() {
                    let disk = layer.confinement();
                    assert!(layer.balls().iter().all(|b| disk.overshoot(b) <= 1e-9));
                }
            }
        }
        assert_eq!(lamp.last_stats().degenerate, 0);
    }

    #[test]
    fn params_include_config_and_device_size() {
        let lamp = Lamp::new(small_config()).unwrap();
        let params = lamp.params();
        assert_eq!(params["seed"], 42);
        assert_eq!(params["layers"].as_array().unwrap().len(), 3);
        assert_eq!(params["device_width"], 200.0);
        assert!(lamp.param_schema().get("layers").is_some());
    }

    #[test]
    fn schema_pixel_ratio_bound_matches_validation() {
        let lamp = Lamp::new(small_config()).unwrap();
        let bound = lamp.param_schema()["pixel_ratio"]["exclusive_min"]
            .as_f64()
            .unwrap();
        let at_bound = LampConfig {
            pixel_ratio: bound,
            ..small_config()
        };
        assert!(at_bound.validate().is_err());
    }

    #[test]
    fn oversized_resize_leaves_every_layer_untouched() {
        let mut lamp = Lamp::new(small_config()).unwrap();
        assert!(matches!(
            lamp.resize(1e10, 1e10),
            Err(EngineError::InvalidDimensions)
        ));
        assert_eq!(lamp.size(), (200.0, 150.0));
        for layer in lamp.layers() {
            assert_eq!(layer.size(), (200.0, 150.0));
            assert_eq!(layer.grid().steps(), (50, 37));
        }
        let mut surface = RecordingSurface::new(200.0, 150.0);
        lamp.render_frame(&mut surface);
        assert_eq!(lamp.frame(), 1);
    }
}
