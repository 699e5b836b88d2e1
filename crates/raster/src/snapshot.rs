//! PNG output of a [`PixelCanvas`].
//!
//! Feature-gated behind `png` (default on) so hosts that only need the
//! in-memory canvas do not pull in the `image` crate.

use std::path::Path;

use lava_lamp_core::{EngineError, Srgb};

use crate::canvas::PixelCanvas;

/// Writes the canvas as a PNG.
///
/// With a `background` the image is flattened onto it and fully opaque;
/// without one transparency is kept. Returns
/// `EngineError::InvalidDimensions` for an empty canvas or one too large
/// for `u32`, and `EngineError::Io` on write failure.
pub fn write_png(
    canvas: &PixelCanvas,
    background: Option<Srgb>,
    path: &Path,
) -> Result<(), EngineError> {
    if canvas.width_px() == 0 || canvas.height_px() == 0 {
        return Err(EngineError::InvalidDimensions);
    }
    let w = u32::try_from(canvas.width_px()).map_err(|_| EngineError::InvalidDimensions)?;
    let h = u32::try_from(canvas.height_px()).map_err(|_| EngineError::InvalidDimensions)?;
    let rgba = match background {
        Some(bg) => canvas.to_rgba8_over(bg),
        None => canvas.to_rgba8(),
    };
    let img = image::RgbaImage::from_raw(w, h, rgba)
        .ok_or_else(|| EngineError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path)
        .map_err(|e| EngineError::Io(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lava_lamp_core::{Engine, LampConfig, LayerConfig, Surface};
    use lava_lamp_metaball::Lamp;

    #[test]
    fn write_png_round_trip() {
        let canvas = PixelCanvas::new(16, 12).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.png");

        write_png(&canvas, Some(Srgb::BLACK), &path).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!((img.width(), img.height()), (16, 12));
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn write_png_rejects_empty_canvas() {
        let canvas = PixelCanvas::new(0, 5).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = write_png(&canvas, None, &dir.path().join("x.png"));
        assert!(matches!(result, Err(EngineError::InvalidDimensions)));
    }

    #[test]
    fn write_png_reports_bad_path() {
        let canvas = PixelCanvas::new(2, 2).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("x.png");
        assert!(matches!(
            write_png(&canvas, None, &path),
            Err(EngineError::Io(_))
        ));
    }

    #[test]
    fn rendered_lamp_frame_has_lit_pixels() {
        let config = LampConfig {
            width: 120,
            height: 90,
            layers: LayerConfig::presets().into_iter().take(2).collect(),
            ..LampConfig::default()
        };
        let mut lamp = Lamp::new(config).unwrap();
        let mut canvas = PixelCanvas::new(120, 90).unwrap();
        for _ in 0..3 {
            lamp.render_frame(&mut canvas);
        }
        assert_eq!((canvas.width(), canvas.height()), (120.0, 90.0));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        write_png(&canvas, Some(Srgb::BLACK), &path).unwrap();
        let img = image::open(&path).unwrap().to_rgba8();
        let lit = img
            .pixels()
            .filter(|p| p.0[0] > 0 || p.0[1] > 0 || p.0[2] > 0)
            .count();
        assert!(lit > 0, "no blob reached the image");
    }
}
