//! Image `data:` URL codec.
//!
//! Attachments and avatars travel as `data:<mime>;base64,<payload>` strings.
//! The MIME type is sniffed from the bytes rather than trusted from the
//! caller, and only the formats the room server accepts are produced.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::constants::ACCEPTED_IMAGE_TYPES;
use crate::error::EncodeError;

/// Whether a declared content type denotes an image.
pub fn is_image_type(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// Sniff the image MIME type of raw bytes.
pub fn sniff_image_type(bytes: &[u8]) -> Result<&'static str, EncodeError> {
    let format = image::guess_format(bytes).map_err(|_| EncodeError::NotAnImage)?;
    let mime = format.to_mime_type();
    if !ACCEPTED_IMAGE_TYPES.contains(&mime) {
        return Err(EncodeError::UnsupportedFormat(mime.to_string()));
    }
    Ok(mime)
}

/// Encode raw image bytes as a data URL, enforcing `max_size` on the decoded payload.
pub fn encode_image(bytes: &[u8], max_size: usize) -> Result<String, EncodeError> {
    if bytes.is_empty() {
        return Err(EncodeError::Empty);
    }
    if bytes.len() > max_size {
        return Err(EncodeError::TooLarge {
            size: bytes.len(),
            max: max_size,
        });
    }
    let mime = sniff_image_type(bytes)?;
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Smallest valid PNG signature + IHDR chunk start is enough for sniffing.
    const PNG: &[u8] = &[
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13, b'I', b'H', b'D', b'R',
    ];

    #[test]
    fn encodes_png_with_sniffed_type() {
        let url = encode_image(PNG, 1024).unwrap();
        let payload = url.strip_prefix("data:image/png;base64,").unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), PNG);
    }

    #[test]
    fn rejects_non_image_bytes() {
        assert_eq!(
            encode_image(b"just some text", 1024),
            Err(EncodeError::NotAnImage)
        );
    }

    #[test]
    fn rejects_oversized_payload() {
        assert_eq!(
            encode_image(PNG, 4),
            Err(EncodeError::TooLarge {
                size: PNG.len(),
                max: 4
            })
        );
    }

    #[test]
    fn rejects_empty_file() {
        assert_eq!(encode_image(&[], 1024), Err(EncodeError::Empty));
    }

    #[test]
    fn image_type_check_is_case_insensitive() {
        assert!(is_image_type("IMAGE/PNG"));
        assert!(!is_image_type("text/plain"));
    }
}
