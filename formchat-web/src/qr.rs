//! QR codes pointing at form pages.

use std::io::Cursor;

use formchat_core::FormChatError;
use formchat_core::error::Result;
use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

/// Smallest edge of a rendered code, in pixels.
const MIN_SIZE: u32 = 256;

/// Public URL of a form page.
pub fn form_url(base: &str, form: &str) -> String {
    format!(
        "{}/forms/{}",
        base.trim_end_matches('/'),
        urlencoding::encode(form)
    )
}

/// Encodes `url` as a PNG QR code.
pub fn png(url: &str) -> Result<Vec<u8>> {
    let code = QrCode::with_error_correction_level(url.as_bytes(), EcLevel::M)
        .map_err(|e| FormChatError::internal(format!("QR encoding failed: {e}")))?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_SIZE, MIN_SIZE)
        .build();

    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| FormChatError::internal(format!("PNG encoding failed: {e}")))?;
    Ok(buffer.into_inner())
}
