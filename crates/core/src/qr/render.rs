//! Deterministic QR code rendering.

use std::io::Cursor;

use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};

use super::error::QrError;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Largest image side, in pixels, the renderer will allocate.
pub const MAX_SIDE_PX: u32 = 16_384;

/// Rendering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Pixels per module. Values below 1 are treated as 1.
    pub module_size: u32,
    /// Width of the blank border, in modules.
    pub quiet_zone: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            module_size: 8,
            quiet_zone: 4,
        }
    }
}

/// Render `target` as a PNG QR code.
///
/// The payload is the exact bytes of `target`. Output depends only on the
/// input and options, so the same URL always yields the same image.
pub fn render_png(target: &str, options: RenderOptions) -> Result<Vec<u8>, QrError> {
    if target.trim().is_empty() {
        return Err(QrError::EmptyTarget);
    }

    let code = QrCode::with_error_correction_level(target.as_bytes(), EcLevel::M)?;
    let width = u32::try_from(code.width())
        .map_err(|_| QrError::Encode("symbol too large".to_string()))?;
    let colors = code.to_colors();

    let module = options.module_size.max(1);
    let quiet = options.quiet_zone;
    let side = quiet
        .checked_mul(2)
        .and_then(|border| border.checked_add(width))
        .and_then(|modules| modules.checked_mul(module))
        .filter(|side| *side <= MAX_SIDE_PX)
        .ok_or_else(|| {
            QrError::Image(format!(
                "rendered image exceeds {MAX_SIDE_PX}px per side (module size {module}, quiet zone {quiet})"
            ))
        })?;

    let image = GrayImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / module, y / module);
        if mx < quiet || my < quiet || mx >= quiet + width || my >= quiet + width {
            return LIGHT;
        }
        let index = ((my - quiet) * width + (mx - quiet)) as usize;
        match colors[index] {
            Color::Dark => DARK,
            Color::Light => LIGHT,
        }
    });

    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageFormat::Png)?;
    Ok(png.into_inner())
}
