#![deny(unsafe_code)]
//! Core types and traits for the lava-lamp metaball engine.
//!
//! Provides the `Engine` trait, the `Surface` drawing abstraction (with a
//! command-recording implementation), `RadialGradient` color ramps, the
//! `Srgb` color type, `LampConfig`/`LayerConfig`, parameter helpers and the
//! `Xorshift64` PRNG.

pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod gradient;
pub mod params;
pub mod prng;
pub mod surface;

pub use color::Srgb;
pub use config::{LampConfig, LayerConfig};
pub use engine::Engine;
pub use error::EngineError;
pub use gradient::{ColorStop, RadialGradient};
pub use prng::Xorshift64;
pub use surface::{CompositeOp, DrawCommand, RecordingSurface, Shadow, Surface};
