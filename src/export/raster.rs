//! Chart region capture
//!
//! A [`ChartRegion`] is anything that can draw itself into an RGBA buffer.
//! The [`Rasterizer`] renders it at a pixel density multiple and flattens
//! transparent pixels onto a fixed background, yielding a [`Capture`] ready
//! for JPEG embedding.

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, Rgb, RgbImage, RgbaImage};

use super::ExportError;

/// JPEG quality used for embedded captures
pub const JPEG_QUALITY: u8 = 92;

/// A renderable region of the dashboard
pub trait ChartRegion: Send + Sync {
    /// Section title tagged on the region, if any
    fn title(&self) -> Option<&str> {
        None
    }

    /// Size in logical pixels at scale 1.0
    fn size(&self) -> (u32, u32);

    /// Draw the region at `scale` times its logical size
    fn render(&self, scale: f32) -> Result<RgbaImage, String>;
}

/// A flattened, opaque capture of a region
#[derive(Debug, Clone)]
pub struct Capture {
    image: RgbImage,
}

impl Capture {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Height in output units for a given output width, preserving aspect ratio
    pub fn scaled_height(&self, width: f64) -> f64 {
        f64::from(self.height()) * width / f64::from(self.width())
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Encode as baseline JPEG
    pub fn to_jpeg(&self) -> Result<Vec<u8>, ExportError> {
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
            .encode(
                self.image.as_raw(),
                self.width(),
                self.height(),
                ColorType::Rgb8,
            )
            .map_err(|e| ExportError::CaptureFailure(format!("JPEG encoding failed: {}", e)))?;
        Ok(buffer)
    }
}

/// Renders regions at a fixed density over a fixed background
#[derive(Debug, Clone)]
pub struct Rasterizer {
    scale: f32,
    background: Rgb<u8>,
}

impl Rasterizer {
    pub fn new(scale: f32, background: Rgb<u8>) -> Self {
        Self { scale, background }
    }

    /// Build from a `#rrggbb` background string
    pub fn from_hex(scale: f32, background: &str) -> Result<Self, ExportError> {
        let background = parse_hex_color(background).map_err(ExportError::InvalidConfig)?;
        Ok(Self::new(scale, background))
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn background(&self) -> Rgb<u8> {
        self.background
    }

    /// Render and flatten one region
    pub fn capture(&self, region: &dyn ChartRegion) -> Result<Capture, ExportError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ExportError::CaptureFailure(format!(
                "invalid capture scale {}",
                self.scale
            )));
        }
        let rendered = region.render(self.scale).map_err(ExportError::CaptureFailure)?;
        if rendered.width() == 0 || rendered.height() == 0 {
            return Err(ExportError::CaptureFailure(
                "region rendered to an empty image".to_string(),
            ));
        }
        Ok(Capture {
            image: flatten(&rendered, self.background),
        })
    }
}

/// Composite every pixel over an opaque background
pub fn flatten(image: &RgbaImage, background: Rgb<u8>) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = u32::from(a);
        let blend = |fg: u8, bg: u8| -> u8 {
            ((u32::from(fg) * alpha + u32::from(bg) * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([
            blend(r, background[0]),
            blend(g, background[1]),
            blend(b, background[2]),
        ])
    })
}

/// Parse `#rrggbb` (leading `#` optional)
pub fn parse_hex_color(value: &str) -> Result<Rgb<u8>, String> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(format!("expected a #rrggbb colour, got '{}'", value));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|_| format!("expected a #rrggbb colour, got '{}'", value))
    };
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}
