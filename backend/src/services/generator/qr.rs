//! QR code encoding for certificate verification links.

use std::path::Path;

use image::Luma;
use qrcode::QrCode;

use super::GenerateError;

/// Encodes `content` as a QR code and writes it as a PNG at `path`.
pub fn write_qr_png(path: &Path, content: &str) -> Result<(), GenerateError> {
    let code = QrCode::new(content.as_bytes()).map_err(|err| GenerateError::Qr(err.to_string()))?;

    let image = code.render::<Luma<u8>>().min_dimensions(256, 256).build();

    image
        .save(path)
        .map_err(|err| GenerateError::Qr(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_a_non_empty_png() {
        let scratch = tempfile::tempdir().unwrap();
        let path = scratch.path().join("code-qr.png");

        write_qr_png(&path, "https://certificates.example.org/cert-1").unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(!bytes.is_empty());
        // PNG signature.
        assert_eq!(bytes[..8], *b"\x89PNG\r\n\x1a\n");
    }
}
