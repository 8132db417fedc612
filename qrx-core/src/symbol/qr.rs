//! QR code rendering (`qrcode` + `image`) and scanning (`rqrr`).

use super::{EcLevel, SymbolRenderer, SymbolScanner};
use crate::error::{QrxError, Result};
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};
use std::io::Cursor;
use tracing::debug;

impl From<EcLevel> for qrcode::EcLevel {
    fn from(level: EcLevel) -> Self {
        match level {
            EcLevel::L => qrcode::EcLevel::L,
            EcLevel::M => qrcode::EcLevel::M,
            EcLevel::Q => qrcode::EcLevel::Q,
            EcLevel::H => qrcode::EcLevel::H,
        }
    }
}

/// Renders a payload as a greyscale PNG.
#[derive(Clone, Copy, Debug)]
pub struct QrRenderer {
    /// Pixels per module side.
    pub module_px: u32,
    /// Light border, in modules.
    pub quiet_zone: u32,
}

impl Default for QrRenderer {
    fn default() -> Self {
        Self {
            module_px: 4,
            quiet_zone: 4,
        }
    }
}

impl SymbolRenderer for QrRenderer {
    fn extension(&self) -> &'static str {
        "png"
    }

    fn render(&self, payload: &str, level: EcLevel) -> Result<Vec<u8>> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), level.into())
            .map_err(|e| {
                QrxError::Format(format!(
                    "{} byte payload does not fit a QR symbol at level {level}: {e:?}",
                    payload.len()
                ))
            })?;
        let width = code.width() as u32;
        let colors = code.to_colors();
        let px = self.module_px.max(1);
        let side = (width + 2 * self.quiet_zone) * px;

        let img = GrayImage::from_fn(side, side, |x, y| {
            let mx = (x / px) as i64 - self.quiet_zone as i64;
            let my = (y / px) as i64 - self.quiet_zone as i64;
            if mx < 0 || my < 0 || mx >= width as i64 || my >= width as i64 {
                return Luma([255u8]);
            }
            match colors[(my as u32 * width + mx as u32) as usize] {
                Color::Dark => Luma([0u8]),
                Color::Light => Luma([255u8]),
            }
        });

        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| QrxError::Format(format!("png encode: {e}")))?;
        Ok(buf)
    }
}

/// Detects and decodes every QR code in an image.
#[derive(Clone, Copy, Debug, Default)]
pub struct QrScanner;

impl SymbolScanner for QrScanner {
    fn scan(&self, image: &[u8]) -> Result<Vec<Vec<u8>>> {
        let img = image::load_from_memory(image)
            .map_err(|e| QrxError::Format(format!("image decode: {e}")))?
            .to_luma8();
        let (w, h) = img.dimensions();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            w as usize,
            h as usize,
            |x, y| img.get_pixel(x as u32, y as u32).0[0],
        );

        let mut out = Vec::new();
        for grid in prepared.detect_grids() {
            let mut raw = Vec::new();
            match grid.decode_to(&mut raw) {
                Ok(_) => out.push(raw),
                // A damaged finder match; other grids in the image may still decode.
                Err(e) => debug!("qr grid decode failed: {e:?}"),
            }
        }
        Ok(out)
    }
}
