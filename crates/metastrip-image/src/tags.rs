use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use exif::{Exif, Field, In, Reader, Value};

use crate::record::TagValue;

/// Outcome of looking for EXIF in an image container.
#[derive(Debug)]
pub(crate) enum ExifRead {
    Absent,
    /// An EXIF payload exists but could not be parsed.
    Unreadable,
    Tags(BTreeMap<String, TagValue>),
}

impl ExifRead {
    pub(crate) fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    pub(crate) fn into_tags(self) -> Option<BTreeMap<String, TagValue>> {
        match self {
            Self::Tags(tags) => Some(tags),
            Self::Absent | Self::Unreadable => None,
        }
    }
}

pub(crate) fn read_exif(data: &[u8], path: &Path) -> ExifRead {
    match Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif) => ExifRead::Tags(collect_tags(&exif)),
        Err(exif::Error::NotFound(_)) => ExifRead::Absent,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable EXIF payload");
            ExifRead::Unreadable
        }
    }
}

/// Every known tag of the primary image, keyed by its standard name.
fn collect_tags(exif: &Exif) -> BTreeMap<String, TagValue> {
    exif.fields()
        .filter(|field| field.ifd_num == In::PRIMARY)
        .filter(|field| field.tag.description().is_some())
        .map(|field| (field.tag.to_string(), tag_value(field)))
        .collect()
}

fn tag_value(field: &Field) -> TagValue {
    match &field.value {
        Value::Ascii(parts) => TagValue::Text(
            parts
                .iter()
                .map(|part| String::from_utf8_lossy(part))
                .collect::<Vec<_>>()
                .join("\n")
                .trim_end_matches('\0')
                .to_string(),
        ),
        Value::Byte(v) if v.len() == 1 => TagValue::Int(v[0].into()),
        Value::Short(v) if v.len() == 1 => TagValue::Int(v[0].into()),
        Value::Long(v) if v.len() == 1 => TagValue::Int(v[0].into()),
        Value::SByte(v) if v.len() == 1 => TagValue::Int(v[0].into()),
        Value::SShort(v) if v.len() == 1 => TagValue::Int(v[0].into()),
        Value::SLong(v) if v.len() == 1 => TagValue::Int(v[0].into()),
        _ => TagValue::Text(field.display_value().to_string()),
    }
}
