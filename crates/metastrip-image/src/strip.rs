//! Container-level EXIF removal.
//!
//! JPEG and PNG files are rewritten segment by segment: only the EXIF carrier
//! is dropped and every other byte, compressed scan data included, is copied
//! as is. Other formats fall back to a re-encode through the image codec.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_APP1: u8 = 0xE1;
const JPEG_SOS: u8 = 0xDA;
const JPEG_EOI: u8 = 0xD9;
const JPEG_EXIF_HEADER: &[u8] = b"Exif\0\0";

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const PNG_EXIF_CHUNK: &[u8; 4] = b"eXIf";
const PNG_END_CHUNK: &[u8; 4] = b"IEND";

#[derive(Debug, thiserror::Error)]
pub(crate) enum StripError {
    #[error("truncated {0} stream")]
    Truncated(&'static str),

    #[error("malformed {0} stream")]
    Malformed(&'static str),

    #[error("re-encode failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Remove EXIF from an encoded image.
///
/// Returns `None` when there was nothing to remove.
pub(crate) fn strip_exif(
    data: &[u8],
    format: ImageFormat,
    decoded: &DynamicImage,
    has_exif: bool,
) -> Result<Option<Vec<u8>>, StripError> {
    match format {
        ImageFormat::Jpeg => strip_jpeg(data),
        ImageFormat::Png => strip_png(data),
        _ if has_exif => reencode(decoded, format).map(Some),
        _ => Ok(None),
    }
}

pub(crate) fn strip_jpeg(data: &[u8]) -> Result<Option<Vec<u8>>, StripError> {
    if !data.starts_with(&JPEG_SOI) {
        return Err(StripError::Malformed("JPEG"));
    }

    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(&JPEG_SOI);
    let mut removed = false;
    let mut pos = JPEG_SOI.len();

    loop {
        let start = pos;
        if data.get(pos) != Some(&0xFF) {
            return Err(StripError::Malformed("JPEG"));
        }
        // Any number of 0xFF fill bytes may precede a marker.
        while data.get(pos) == Some(&0xFF) {
            pos += 1;
        }
        let marker = *data.get(pos).ok_or(StripError::Truncated("JPEG"))?;
        pos += 1;

        match marker {
            // Entropy-coded data follows; nothing after it carries EXIF.
            JPEG_SOS | JPEG_EOI => {
                out.extend_from_slice(&data[start..]);
                break;
            }
            0x01 | 0xD0..=0xD7 => {
                out.extend_from_slice(&data[start..pos]);
            }
            _ => {
                let len_bytes = data
                    .get(pos..pos + 2)
                    .ok_or(StripError::Truncated("JPEG"))?;
                let len = usize::from(u16::from_be_bytes([len_bytes[0], len_bytes[1]]));
                if len < 2 {
                    return Err(StripError::Malformed("JPEG"));
                }
                let end = pos + len;
                let payload = data.get(pos + 2..end).ok_or(StripError::Truncated("JPEG"))?;

                if marker == JPEG_APP1 && payload.starts_with(JPEG_EXIF_HEADER) {
                    removed = true;
                } else {
                    out.extend_from_slice(&data[start..end]);
                }
                pos = end;
            }
        }
    }

    Ok(removed.then_some(out))
}

pub(crate) fn strip_png(data: &[u8]) -> Result<Option<Vec<u8>>, StripError> {
    if !data.starts_with(&PNG_SIGNATURE) {
        return Err(StripError::Malformed("PNG"));
    }

    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(&PNG_SIGNATURE);
    let mut removed = false;
    let mut pos = PNG_SIGNATURE.len();

    while pos < data.len() {
        let header = data.get(pos..pos + 8).ok_or(StripError::Truncated("PNG"))?;
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let kind = &header[4..8];
        // length + type + data + crc
        let end = pos
            .checked_add(len)
            .and_then(|end| end.checked_add(12))
            .filter(|&end| end <= data.len())
            .ok_or(StripError::Truncated("PNG"))?;

        if kind == PNG_EXIF_CHUNK {
            removed = true;
        } else {
            out.extend_from_slice(&data[pos..end]);
        }
        pos = end;

        if kind == PNG_END_CHUNK {
            out.extend_from_slice(&data[pos..]);
            break;
        }
    }

    Ok(removed.then_some(out))
}

fn reencode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, StripError> {
    let mut out = Vec::new();
    image.write_to(&mut Cursor::new(&mut out), format)?;
    Ok(out)
}
