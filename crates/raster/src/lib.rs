#![deny(unsafe_code)]
//! Software rendering for the lava-lamp engine.
//!
//! [`PixelCanvas`] implements the core `Surface` trait on a plain RGBA
//! buffer so frames can be rendered without a browser. With the `png`
//! feature, [`snapshot::write_png`] saves a canvas to disk.

pub mod canvas;
pub mod mask;
pub mod pixel;
#[cfg(feature = "png")]
pub mod snapshot;

pub use canvas::PixelCanvas;
pub use pixel::Rgba;
#[cfg(feature = "png")]
pub use snapshot::write_png;
