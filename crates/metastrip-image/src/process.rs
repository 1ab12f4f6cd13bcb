use std::io::Cursor;
use std::path::Path;

use image::{ColorType, ImageFormat, ImageReader};
use metastrip_fs::{atomic_create, atomic_write, normalize_permissions};
use walkdir::WalkDir;

use crate::record::ImageMetadataRecord;
use crate::{Error, Result, strip, tags};

/// Record an image's metadata, remove its EXIF in place and write the sidecar.
pub fn process_image(path: impl AsRef<Path>) -> Result<ImageMetadataRecord> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::extraction(path, e))?;

    let reader = ImageReader::new(Cursor::new(data.as_slice()))
        .with_guessed_format()
        .map_err(|e| Error::unsupported(path, e))?;
    let format = reader
        .format()
        .ok_or_else(|| Error::unsupported(path, "unrecognized image format"))?;
    let image = reader.decode().map_err(|e| Error::unsupported(path, e))?;

    let exif = tags::read_exif(&data, path);
    let stripped = strip::strip_exif(&data, format, &image, exif.is_present())
        .map_err(|e| Error::extraction(path, e))?;
    if let Some(clean) = stripped {
        atomic_write(path, &clean).map_err(|e| Error::extraction(path, e))?;
        tracing::debug!(path = %path.display(), bytes = clean.len(), "removed EXIF");
    }

    let record = ImageMetadataRecord::new(
        path,
        format_name(format),
        mode_name(image.color()),
        [image.width(), image.height()],
        exif.into_tags(),
    );
    write_sidecar(&record)?;

    tracing::debug!(path = %path.display(), format = record.format(), "processed image");
    Ok(record)
}

/// Process every file directly inside `dir`, in file-name order.
///
/// The listing is taken before any sidecar is written. The first failure
/// aborts the run.
pub fn process_directory(dir: impl AsRef<Path>) -> Result<Vec<ImageMetadataRecord>> {
    let dir = dir.as_ref();
    let files = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
            Ok(_) => None,
            Err(e) => Some(Err(Error::extraction(dir, e))),
        })
        .collect::<Result<Vec<_>>>()?;

    files.iter().map(process_image).collect()
}

fn write_sidecar(record: &ImageMetadataRecord) -> Result<()> {
    let path = record.sidecar_path();
    let json = record
        .to_json()
        .map_err(|e| Error::extraction(record.source(), e))?;

    atomic_create(&path, &json).map_err(|e| {
        if e.is_already_exists() {
            Error::SidecarExists { path: path.clone() }
        } else {
            Error::extraction(&path, e)
        }
    })?;
    normalize_permissions(&path).map_err(|e| Error::extraction(&path, e))
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::WebP => "WEBP".to_string(),
        other => format!("{other:?}").to_uppercase(),
    }
}

/// Colour mode in the naming scheme used by common imaging libraries.
fn mode_name(color: ColorType) -> String {
    let name = match color {
        ColorType::L8 => "L",
        ColorType::L16 => "I;16",
        ColorType::La8 | ColorType::La16 => "LA",
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB",
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA",
        other => return format!("{other:?}"),
    };
    name.to_string()
}
