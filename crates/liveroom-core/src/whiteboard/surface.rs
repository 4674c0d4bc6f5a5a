//! Software raster for the shared drawing surface.
//!
//! Pixels are packed `0xRRGGBBAA`. Lines are drawn by stamping discs along
//! the segment, so caps and joins are round like a canvas `round` line.
//! Everything is plain `f32` arithmetic in a fixed order, so the same
//! sequence of segments gives the same pixels on every client.

use sha2::{Digest, Sha256};

use super::stroke::{StrokePoint, Tool};

pub const WHITE: u32 = 0xFFFF_FFFF;
pub const TRANSPARENT: u32 = 0x0000_0000;
const BLACK: u32 = 0x0000_00FF;

/// Smallest stamp radius that always covers at least one pixel center.
const MIN_RADIUS: f32 = 0.75;
/// Distance between stamps along a segment, in pixels.
const STAMP_STEP: f32 = 0.5;

/// Resolved drawing style of a stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenStyle {
    pub tool: Tool,
    pub rgba: u32,
    pub width: f32,
}

impl PenStyle {
    pub fn from_point(point: &StrokePoint) -> Self {
        Self {
            tool: point.tool,
            rgba: parse_color(&point.color).unwrap_or(BLACK),
            width: point.width,
        }
    }

    /// Eraser strokes are twice as wide as the selected width.
    fn radius(&self) -> f32 {
        let diameter = match self.tool {
            Tool::Pen => self.width,
            Tool::Eraser => self.width * 2.0,
        };
        (diameter / 2.0).max(MIN_RADIUS)
    }

    fn ink(&self) -> u32 {
        match self.tool {
            Tool::Pen => self.rgba,
            Tool::Eraser => TRANSPARENT,
        }
    }
}

/// Parse `#rrggbb` or `#rgb` into opaque RGBA.
pub fn parse_color(s: &str) -> Option<u32> {
    let hex = s.strip_prefix('#')?;
    let rgb = match hex.len() {
        6 => u32::from_str_radix(hex, 16).ok()?,
        3 => {
            let short = u32::from_str_radix(hex, 16).ok()?;
            let (r, g, b) = ((short >> 8) & 0xF, (short >> 4) & 0xF, short & 0xF);
            (r * 17) << 16 | (g * 17) << 8 | (b * 17)
        }
        _ => return None,
    };
    Some(rgb << 8 | 0xFF)
}

#[derive(Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Surface {
    /// A blank white surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![WHITE; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    pub fn clear(&mut self) {
        self.pixels.fill(WHITE);
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| p == WHITE)
    }

    /// Draw a segment between two normalized points.
    pub fn stroke_segment(&mut self, from: (f32, f32), to: (f32, f32), style: &PenStyle) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let (x0, y0) = self.to_pixels(from);
        let (x1, y1) = self.to_pixels(to);
        let radius = style.radius();
        let ink = style.ink();

        let (dx, dy) = (x1 - x0, y1 - y0);
        let length = (dx * dx + dy * dy).sqrt();
        let steps = ((length / STAMP_STEP).ceil() as u32).max(1);
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.stamp(x0 + dx * t, y0 + dy * t, radius, ink);
        }
    }

    fn to_pixels(&self, (x, y): (f32, f32)) -> (f32, f32) {
        let x = if x.is_finite() { x.clamp(0.0, 1.0) } else { 0.0 };
        let y = if y.is_finite() { y.clamp(0.0, 1.0) } else { 0.0 };
        (x * self.width as f32, y * self.height as f32)
    }

    fn stamp(&mut self, cx: f32, cy: f32, radius: f32, ink: u32) {
        let max_x = self.width as i64 - 1;
        let max_y = self.height as i64 - 1;
        let min_px = ((cx - radius).floor() as i64).clamp(0, max_x);
        let max_px = ((cx + radius).ceil() as i64).clamp(0, max_x);
        let min_py = ((cy - radius).floor() as i64).clamp(0, max_y);
        let max_py = ((cy + radius).ceil() as i64).clamp(0, max_y);
        let r2 = radius * radius;

        for py in min_py..=max_py {
            let fy = py as f32 + 0.5 - cy;
            for px in min_px..=max_px {
                let fx = px as f32 + 0.5 - cx;
                if fx * fx + fy * fy <= r2 {
                    let idx = py as usize * self.width as usize + px as usize;
                    self.pixels[idx] = ink;
                }
            }
        }
    }

    /// Hex SHA-256 of the pixel buffer, for cheap equality checks across
    /// clients.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_be_bytes());
        hasher.update(self.height.to_be_bytes());
        for p in &self.pixels {
            hasher.update(p.to_be_bytes());
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    /// Binary PPM (P6). Erased pixels are composited over white.
    pub fn to_ppm(&self) -> Vec<u8> {
        let header = format!("P6\n{} {}\n255\n", self.width, self.height);
        let mut out = Vec::with_capacity(header.len() + self.pixels.len() * 3);
        out.extend_from_slice(header.as_bytes());
        for &p in &self.pixels {
            let a = p & 0xFF;
            for shift in [24, 16, 8] {
                let c = (p >> shift) & 0xFF;
                // c * a + 255 * (255 - a), rounded, over 255
                let blended = (c * a + 255 * (255 - a) + 127) / 255;
                out.push(blended as u8);
            }
        }
        out
    }
}
