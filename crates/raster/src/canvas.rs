//! A CPU [`Surface`] backed by a premultiplied RGBA buffer.

use glam::DVec2;
use log::{debug, warn};

use lava_lamp_core::{CompositeOp, EngineError, RadialGradient, Shadow, Srgb, Surface};

use crate::mask::{Mask, Region};
use crate::pixel::{self, blend, premultiply, Rgba, TRANSPARENT};

/// How far a blurred shadow reaches, in standard deviations.
const SHADOW_REACH: f64 = 3.0;

/// Converts a surface dimension to whole pixels; anything non-positive or
/// non-finite is empty.
fn whole_pixels(v: f64) -> usize {
    if v.is_finite() && v >= 1.0 {
        v.floor() as usize
    } else {
        0
    }
}

/// A cleared buffer of `width * height` pixels, or
/// `EngineError::InvalidDimensions` if it cannot be sized or allocated.
fn cleared_buffer(width: usize, height: usize) -> Result<Vec<Rgba>, EngineError> {
    let len = width
        .checked_mul(height)
        .ok_or(EngineError::InvalidDimensions)?;
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|_| EngineError::InvalidDimensions)?;
    pixels.resize(len, TRANSPARENT);
    Ok(pixels)
}

/// Software 2D canvas with just the operations the lamp draws with.
///
/// Fills are aliased (one sample per pixel center, nonzero winding). A
/// shadow is the fill's coverage blurred with standard deviation `blur / 2`,
/// offset, tinted and composited under the shape with the same operator.
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
    composite: CompositeOp,
    fill: Option<RadialGradient>,
    shadow: Option<Shadow>,
    subpaths: Vec<Vec<DVec2>>,
}

impl PixelCanvas {
    /// A transparent `width` x `height` canvas. Zero-sized canvases are
    /// allowed; oversized ones are `EngineError::InvalidDimensions`.
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        Ok(Self {
            width,
            height,
            pixels: cleared_buffer(width, height)?,
            composite: CompositeOp::default(),
            fill: None,
            shadow: None,
            subpaths: Vec::new(),
        })
    }

    pub fn width_px(&self) -> usize {
        self.width
    }

    pub fn height_px(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    pub fn to_rgba8(&self) -> Vec<u8> {
        pixel::to_rgba8(&self.pixels)
    }

    pub fn to_rgba8_over(&self, background: Srgb) -> Vec<u8> {
        pixel::to_rgba8_over(&self.pixels, background)
    }

    fn fill_color(&self, p: DVec2) -> Srgb {
        self.fill
            .as_ref()
            .map_or(Srgb::BLACK, |gradient| gradient.color_at(p))
    }

    fn paint_shadow(&mut self, shadow: Shadow) {
        let sigma = shadow.blur / 2.0;
        let dx = shadow.offset.x.round() as isize;
        let dy = shadow.offset.y.round() as isize;
        let pad = SHADOW_REACH * sigma + 1.0 + dx.unsigned_abs().max(dy.unsigned_abs()) as f64;
        let Some(region) = Region::around(&self.subpaths, pad, self.width, self.height) else {
            return;
        };
        let mut mask = Mask::fill_polygons(&self.subpaths, region);
        mask.blur(sigma);
        let alpha = shadow.alpha as f32;
        for (x, y, coverage) in mask.covered() {
            let (Some(tx), Some(ty)) = (x.checked_add_signed(dx), y.checked_add_signed(dy)) else {
                continue;
            };
            if tx >= self.width || ty >= self.height {
                continue;
            }
            let src = premultiply(shadow.color, alpha * coverage.min(1.0));
            blend(&mut self.pixels[ty * self.width + tx], src, self.composite);
        }
    }

    fn paint_shape(&mut self) {
        let Some(region) = Region::around(&self.subpaths, 0.0, self.width, self.height) else {
            return;
        };
        let mask = Mask::fill_polygons(&self.subpaths, region);
        for (x, y, _) in mask.covered() {
            let center = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
            let src = premultiply(self.fill_color(center), 1.0);
            blend(&mut self.pixels[y * self.width + x], src, self.composite);
        }
    }
}

impl Surface for PixelCanvas {
    fn width(&self) -> f64 {
        self.width as f64
    }

    fn height(&self) -> f64 {
        self.height as f64
    }

    /// Reallocates the buffer; like a canvas element, resizing clears it.
    /// A size whose buffer cannot be allocated leaves the canvas unchanged.
    fn resize(&mut self, width: f64, height: f64) {
        let (w, h) = (whole_pixels(width), whole_pixels(height));
        match cleared_buffer(w, h) {
            Ok(pixels) => {
                self.width = w;
                self.height = h;
                self.pixels = pixels;
                self.subpaths.clear();
                debug!("pixel canvas resized to {w}x{h}");
            }
            Err(e) => warn!("pixel canvas kept at {}x{}: {e}", self.width, self.height),
        }
    }

    fn clear(&mut self) {
        self.pixels.fill(TRANSPARENT);
    }

    fn set_composite(&mut self, op: CompositeOp) {
        self.composite = op;
    }

    fn set_fill(&mut self, gradient: &RadialGradient) {
        self.fill = Some(gradient.clone());
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.shadow = shadow;
    }

    fn begin_path(&mut self) {
        self.subpaths.clear();
    }

    fn move_to(&mut self, p: DVec2) {
        self.subpaths.push(vec![p]);
    }

    fn line_to(&mut self, p: DVec2) {
        match self.subpaths.last_mut() {
            Some(path) => path.push(p),
            None => self.subpaths.push(vec![p]),
        }
    }

    fn close_path(&mut self) {
        // Fills close every subpath implicitly; a closed subpath continues
        // from its first point.
        if let Some(first) = self.subpaths.last().and_then(|p| p.first().copied()) {
            self.subpaths.push(vec![first]);
        }
    }

    fn fill(&mut self) {
        if let Some(shadow) = self.shadow.filter(|s| s.alpha > 0.0) {
            self.paint_shadow(shadow);
        }
        self.paint_shape();
    }
}
