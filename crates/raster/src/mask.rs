//! Coverage masks: polygon scan conversion and shadow blur.
//!
//! A [`Mask`] covers a rectangular [`Region`] of the canvas with one
//! coverage value in [0, 1] per pixel. Polygons are scan converted with the
//! nonzero winding rule, sampling each pixel at its center, which matches
//! how a 2D canvas decides what `fill()` touches (without antialiasing).

use glam::DVec2;

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Region {
    pub fn width(&self) -> usize {
        self.x1 - self.x0
    }

    pub fn height(&self) -> usize {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Bounding box of `subpaths` grown by `pad` pixels and clipped to a
    /// `width` x `height` canvas. `None` if nothing is left.
    pub fn around(subpaths: &[Vec<DVec2>], pad: f64, width: usize, height: usize) -> Option<Self> {
        let mut points = subpaths.iter().flatten();
        let first = *points.next()?;
        let (min, max) = points.fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        let clip = |v: f64, limit: usize| -> usize {
            if v.is_nan() || v <= 0.0 {
                0
            } else {
                (v as usize).min(limit)
            }
        };
        let region = Self {
            x0: clip((min.x - pad).floor(), width),
            y0: clip((min.y - pad).floor(), height),
            x1: clip((max.x + pad).ceil() + 1.0, width),
            y1: clip((max.y + pad).ceil() + 1.0, height),
        };
        (!region.is_empty()).then_some(region)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    region: Region,
    data: Vec<f32>,
}

impl Mask {
    fn empty(region: Region) -> Self {
        Self {
            region,
            data: vec![0.0; region.width() * region.height()],
        }
    }

    /// Scan converts closed polygons over `region` (nonzero winding). Each
    /// subpath is closed implicitly.
    pub fn fill_polygons(subpaths: &[Vec<DVec2>], region: Region) -> Self {
        let mut mask = Self::empty(region);
        let mut crossings: Vec<(f64, i32)> = Vec::new();
        for row in region.y0..region.y1 {
            let y = row as f64 + 0.5;
            crossings.clear();
            for path in subpaths.iter().filter(|p| p.len() >= 2) {
                for (i, &a) in path.iter().enumerate() {
                    let b = path[(i + 1) % path.len()];
                    if a.y == b.y {
                        continue;
                    }
                    let (lo, hi) = if a.y < b.y { (a.y, b.y) } else { (b.y, a.y) };
                    if y < lo || y >= hi {
                        continue;
                    }
                    let x = a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y);
                    crossings.push((x, if b.y > a.y { 1 } else { -1 }));
                }
            }
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;
            for pair in crossings.windows(2) {
                winding += pair[0].1;
                if winding == 0 {
                    continue;
                }
                let start = span_start(pair[0].0, region.x0, region.x1);
                let end = span_start(pair[1].0, region.x0, region.x1);
                let line = (row - region.y0) * region.width();
                for col in start..end {
                    mask.data[line + col - region.x0] = 1.0;
                }
            }
        }
        mask
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Coverage at canvas pixel `(x, y)`; zero outside the region.
    pub fn get(&self, x: usize, y: usize) -> f32 {
        let r = self.region;
        if x < r.x0 || x >= r.x1 || y < r.y0 || y >= r.y1 {
            return 0.0;
        }
        self.data[(y - r.y0) * r.width() + (x - r.x0)]
    }

    /// Pixels with non-zero coverage as `(x, y, coverage)`.
    pub fn covered(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        let r = self.region;
        self.data
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0.0)
            .map(move |(i, &c)| (r.x0 + i % r.width(), r.y0 + i / r.width(), c))
    }

    /// Approximates a Gaussian blur with standard deviation `sigma` by
    /// three box passes in each direction. Coverage beyond the region
    /// counts as zero.
    pub fn blur(&mut self, sigma: f64) {
        let radius = box_radius(sigma);
        if radius == 0 {
            return;
        }
        let (w, h) = (self.region.width(), self.region.height());
        let mut scratch = vec![0.0; self.data.len()];
        for _ in 0..3 {
            box_pass(&self.data, &mut scratch, w, h, radius, 1, w);
            box_pass(&scratch, &mut self.data, h, w, radius, w, 1);
        }
    }
}

/// First pixel whose center lies at or right of `x`, clamped to the region.
fn span_start(x: f64, lo: usize, hi: usize) -> usize {
    let v = (x - 0.5).ceil();
    if v.is_nan() || v <= lo as f64 {
        lo
    } else {
        (v as usize).min(hi)
    }
}

/// Box radius whose three-pass variance matches `sigma²`.
fn box_radius(sigma: f64) -> usize {
    if !(sigma.is_finite() && sigma > 0.0) {
        return 0;
    }
    (((4.0 * sigma * sigma + 1.0).sqrt() - 1.0) / 2.0).round() as usize
}

/// One sliding-window box pass. Lines are `len` long with elements
/// `stride` apart; consecutive lines start `line_step` apart.
fn box_pass(
    src: &[f32],
    dst: &mut [f32],
    len: usize,
    lines: usize,
    radius: usize,
    stride: usize,
    line_step: usize,
) {
    let scale = 1.0 / (2 * radius + 1) as f32;
    for line in 0..lines {
        let base = line * line_step;
        let at = |i: usize| src[base + i * stride];
        let mut sum: f32 = (0..=radius.min(len.saturating_sub(1))).map(at).sum();
        for i in 0..len {
            dst[base + i * stride] = sum * scale;
            if i + radius + 1 < len {
                sum += at(i + radius + 1);
            }
            if i >= radius {
                sum -= at(i - radius);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<DVec2> {
        vec![
            DVec2::new(x0, y0),
            DVec2::new(x1, y0),
            DVec2::new(x1, y1),
            DVec2::new(x0, y1),
        ]
    }

    fn full(w: usize, h: usize) -> Region {
        Region {
            x0: 0,
            y0: 0,
            x1: w,
            y1: h,
        }
    }

    #[test]
    fn axis_aligned_square_covers_exact_pixels() {
        let mask = Mask::fill_polygons(&[square(2.0, 3.0, 6.0, 5.0)], full(10, 10));
        let covered: Vec<(usize, usize)> = mask.covered().map(|(x, y, _)| (x, y)).collect();
        assert_eq!(covered.len(), 4 * 2);
        assert!(covered.contains(&(2, 3)));
        assert!(covered.contains(&(5, 4)));
        assert!(!covered.contains(&(6, 4)));
        assert!(!covered.contains(&(2, 5)));
    }

    #[test]
    fn winding_direction_does_not_matter() {
        let mut reversed = square(1.0, 1.0, 7.0, 7.0);
        reversed.reverse();
        let a = Mask::fill_polygons(&[square(1.0, 1.0, 7.0, 7.0)], full(8, 8));
        let b = Mask::fill_polygons(&[reversed], full(8, 8));
        assert_eq!(a, b);
    }

    #[test]
    fn nonzero_rule_fills_overlap_once() {
        let mask = Mask::fill_polygons(
            &[square(0.0, 0.0, 4.0, 4.0), square(2.0, 0.0, 6.0, 4.0)],
            full(8, 8),
        );
        assert_eq!(mask.covered().count(), 6 * 4);
        assert!(mask.covered().all(|(_, _, c)| c == 1.0));
    }

    #[test]
    fn opposite_windings_cut_a_hole() {
        let mut inner = square(2.0, 2.0, 4.0, 4.0);
        inner.reverse();
        let mask = Mask::fill_polygons(&[square(0.0, 0.0, 6.0, 6.0), inner], full(6, 6));
        assert_eq!(mask.get(3, 3), 0.0);
        assert_eq!(mask.get(1, 1), 1.0);
    }

    #[test]
    fn region_clips_to_canvas() {
        let region = Region::around(&[square(-5.0, -5.0, 3.0, 3.0)], 0.0, 10, 10).unwrap();
        assert_eq!((region.x0, region.y0), (0, 0));
        assert!(Region::around(&[square(20.0, 20.0, 30.0, 30.0)], 0.0, 10, 10).is_none());
        assert!(Region::around(&[], 1.0, 10, 10).is_none());
    }

    #[test]
    fn get_outside_region_is_zero() {
        let region = Region {
            x0: 2,
            y0: 2,
            x1: 4,
            y1: 4,
        };
        let mask = Mask::fill_polygons(&[square(0.0, 0.0, 10.0, 10.0)], region);
        assert_eq!(mask.get(3, 3), 1.0);
        assert_eq!(mask.get(0, 0), 0.0);
        assert_eq!(mask.get(9, 3), 0.0);
    }

    #[test]
    fn blur_spreads_and_roughly_conserves_coverage() {
        let mut mask = Mask::fill_polygons(&[square(20.0, 20.0, 24.0, 24.0)], full(44, 44));
        let before: f32 = mask.covered().map(|(_, _, c)| c).sum();
        mask.blur(3.0);
        let after: f32 = mask.covered().map(|(_, _, c)| c).sum();
        assert!((before - after).abs() < 0.05 * before, "{before} vs {after}");
        assert!(mask.get(22, 22) < 1.0);
        assert!(mask.get(26, 22) > 0.0);
        assert_eq!(mask.get(0, 0), 0.0);
    }

    #[test]
    fn zero_blur_is_identity() {
        let mut mask = Mask::fill_polygons(&[square(1.0, 1.0, 3.0, 3.0)], full(5, 5));
        let copy = mask.clone();
        mask.blur(0.0);
        assert_eq!(mask, copy);
    }

    #[test]
    fn box_radius_matches_three_pass_variance() {
        assert_eq!(box_radius(0.0), 0);
        assert_eq!(box_radius(15.0), 15);
        assert_eq!(box_radius(7.5), 7);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn coverage_stays_in_unit_range_after_blur(
                x0 in 0.0_f64..20.0,
                y0 in 0.0_f64..20.0,
                w in 1.0_f64..20.0,
                h in 1.0_f64..20.0,
                sigma in 0.0_f64..6.0,
            ) {
                let mut mask = Mask::fill_polygons(&[square(x0, y0, x0 + w, y0 + h)], full(48, 48));
                mask.blur(sigma);
                prop_assert!(mask.covered().all(|(_, _, c)| c > 0.0 && c <= 1.0 + 1e-5));
            }
        }
    }
}
