//! Radial color ramps.
//!
//! A [`RadialGradient`] mirrors the 2D-canvas gradient object: a center, an
//! outer radius and an ordered list of color stops. It is a plain value so
//! that it can be compared, rebuilt on resize and handed to any
//! [`Surface`](crate::surface::Surface) implementation.

use glam::DVec2;

use crate::color::Srgb;

/// Offsets of the four stops of a layer ramp.
pub const LAYER_STOP_OFFSETS: [f64; 4] = [0.0, 0.3, 0.7, 1.0];

/// Fraction of `min(width, height)` used as the ramp's outer radius.
pub const LAYER_RADIUS_FACTOR: f64 = 0.7;

/// How much the derived fourth stop is darkened relative to the third.
pub const LAYER_DARKEN_FACTOR: f64 = 0.3;

/// One color stop of a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f64,
    pub color: Srgb,
}

/// Radial gradient from `center` (offset 0) out to `radius` (offset 1).
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    center: DVec2,
    radius: f64,
    stops: Vec<ColorStop>,
}

impl RadialGradient {
    /// Creates a gradient; stops are sorted by offset and offsets are
    /// clamped to [0, 1].
    pub fn new(center: DVec2, radius: f64, mut stops: Vec<ColorStop>) -> Self {
        for stop in &mut stops {
            stop.offset = stop.offset.clamp(0.0, 1.0);
        }
        stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Self {
            center,
            radius,
            stops,
        }
    }

    /// The four-stop ramp every metaball layer fills with.
    ///
    /// Centered on the canvas with radius `0.7 * min(width, height)`; stops
    /// are the three base colors followed by the third one darkened.
    pub fn layer_ramp(width: f64, height: f64, colors: [Srgb; 3]) -> Self {
        let [c0, c1, c2] = colors;
        let ramp = [c0, c1, c2, c2.darken(LAYER_DARKEN_FACTOR)];
        let stops = LAYER_STOP_OFFSETS
            .iter()
            .zip(ramp)
            .map(|(&offset, color)| ColorStop { offset, color })
            .collect();
        Self::new(
            DVec2::new(width / 2.0, height / 2.0),
            width.min(height) * LAYER_RADIUS_FACTOR,
            stops,
        )
    }

    pub fn center(&self) -> DVec2 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Samples the ramp at offset `t`, clamped to [0, 1].
    ///
    /// Before the first stop the first color is returned, after the last
    /// stop the last color. An empty gradient is transparent black, which
    /// callers see as [`Srgb::BLACK`].
    pub fn sample(&self, t: f64) -> Srgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Srgb::BLACK,
        };
        if t <= first.offset {
            return first.color;
        }
        if t >= last.offset {
            return last.color;
        }
        self.stops
            .windows(2)
            .find(|pair| t <= pair[1].offset)
            .map(|pair| {
                let span = pair[1].offset - pair[0].offset;
                if t >= pair[1].offset || span <= f64::EPSILON {
                    pair[1].color
                } else {
                    pair[0].color.lerp(pair[1].color, (t - pair[0].offset) / span)
                }
            })
            .unwrap_or(last.color)
    }

    /// Color at a canvas position.
    pub fn color_at(&self, p: DVec2) -> Srgb {
        if self.radius <= 0.0 {
            return self.sample(1.0);
        }
        self.sample(p.distance(self.center) / self.radius)
    }
}
