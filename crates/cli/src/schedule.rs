//! `--resize-at FRAME:WxH` arguments.

use std::fmt;
use std::str::FromStr;

/// A resize applied once `frame` frames have been rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledResize {
    pub frame: u64,
    /// Logical width.
    pub width: usize,
    /// Logical height.
    pub height: usize,
}

impl ScheduledResize {
    /// Size in device pixels for `pixel_ratio`.
    pub fn device_size(&self, pixel_ratio: f64) -> (f64, f64) {
        (
            (self.width as f64 * pixel_ratio).floor(),
            (self.height as f64 * pixel_ratio).floor(),
        )
    }
}

impl FromStr for ScheduledResize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (frame, size) = s
            .split_once(':')
            .ok_or_else(|| format!("expected FRAME:WxH, got '{s}'"))?;
        let (width, height) = size
            .split_once(|c: char| c == 'x' || c == 'X')
            .ok_or_else(|| format!("expected WxH after ':', got '{size}'"))?;
        let number = |v: &str, what: &str| -> Result<u64, String> {
            v.trim()
                .parse::<u64>()
                .map_err(|e| format!("bad {what} '{v}': {e}"))
        };
        let frame = number(frame, "frame")?;
        let width = number(width, "width")?;
        let height = number(height, "height")?;
        if width == 0 || height == 0 {
            return Err(format!("size must be non-zero, got {width}x{height}"));
        }
        Ok(Self {
            frame,
            width: usize::try_from(width).map_err(|e| e.to_string())?,
            height: usize::try_from(height).map_err(|e| e.to_string())?,
        })
    }
}

impl fmt::Display for ScheduledResize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}x{}", self.frame, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frame_and_size() {
        let r: ScheduledResize = "50:400x300".parse().unwrap();
        assert_eq!(
            r,
            ScheduledResize {
                frame: 50,
                width: 400,
                height: 300
            }
        );
        assert_eq!(r.to_string(), "50:400x300");
    }

    #[test]
    fn accepts_upper_case_separator() {
        let r: ScheduledResize = "0:8X6".parse().unwrap();
        assert_eq!((r.width, r.height), (8, 6));
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "50", "50:400", "x:400x300", "5:0x300", "5:-4x3"] {
            assert!(bad.parse::<ScheduledResize>().is_err(), "accepted '{bad}'");
        }
    }

    #[test]
    fn device_size_scales_and_floors() {
        let r: ScheduledResize = "1:101x51".parse().unwrap();
        assert_eq!(r.device_size(1.5), (151.0, 76.0));
    }
}
