use serde::{Deserialize, Serialize};

/// Broad file categories we handle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileCategory {
    Pdf,
    Image,
    Unsupported,
}

/// Result of format detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatDetection {
    pub mime_type: String,
    pub category: FileCategory,
    pub file_size_bytes: u64,
}

/// Detect file format from magic bytes. The name is only consulted to label
/// files whose content we don't recognize.
pub fn detect_format(name: &str, bytes: &[u8]) -> FormatDetection {
    let header = &bytes[..bytes.len().min(16)];

    let (mime_type, category) = match header {
        // PDF: starts with %PDF
        [0x25, 0x50, 0x44, 0x46, ..] => ("application/pdf".to_string(), FileCategory::Pdf),
        // JPEG: starts with FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => ("image/jpeg".to_string(), FileCategory::Image),
        // PNG: starts with 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => ("image/png".to_string(), FileCategory::Image),
        // TIFF: little-endian (49 49 2A 00) or big-endian (4D 4D 00 2A)
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => {
            ("image/tiff".to_string(), FileCategory::Image)
        }
        [b'B', b'M', ..] => ("image/bmp".to_string(), FileCategory::Image),
        [b'G', b'I', b'F', b'8', ..] => ("image/gif".to_string(), FileCategory::Image),
        // WEBP: RIFF....WEBP
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => {
            ("image/webp".to_string(), FileCategory::Image)
        }
        _ => (
            mime_guess::from_path(name)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
            FileCategory::Unsupported,
        ),
    };

    FormatDetection {
        mime_type,
        category,
        file_size_bytes: bytes.len() as u64,
    }
}
