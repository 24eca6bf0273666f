// src/services/metadata_extractor.rs - EXIF capture metadata from uploaded images
use std::io::Cursor;

use chrono::NaiveDate;
use exif::{In, Reader, Tag, Value};
use thiserror::Error;

use crate::models::geo::GeoPoint;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("not an image: {0}")]
    NotAnImage(String),
    #[error("empty image payload")]
    EmptyPayload,
}

/// What one image told us about where and when it was taken. Produced once
/// per upload session, from the first image only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureMetadata {
    pub location: Option<GeoPoint>,
    pub date: Option<NaiveDate>,
}

/// Read GPS fix and capture date from the image's embedded metadata.
///
/// Formats without EXIF (PNG is the usual case) yield empty metadata, not an
/// error. Only a non-image content type or an empty payload is rejected, and
/// that happens before any parse attempt.
pub fn extract(bytes: &[u8], content_type: &str) -> Result<CaptureMetadata, ExtractionError> {
    let parsed: mime::Mime = content_type
        .parse()
        .map_err(|_| ExtractionError::NotAnImage(content_type.to_string()))?;
    if parsed.type_() != mime::IMAGE {
        return Err(ExtractionError::NotAnImage(content_type.to_string()));
    }
    if bytes.is_empty() {
        return Err(ExtractionError::EmptyPayload);
    }

    let mut cursor = Cursor::new(bytes);
    let exif = match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif,
        // No EXIF segment, or one we cannot decode. Either way the image has
        // nothing usable; the upload continues without a proposed fix.
        Err(_) => return Ok(CaptureMetadata::default()),
    };

    let location = match (
        read_axis(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef),
        read_axis(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef),
    ) {
        // A fix needs both axes; a lone coordinate is dropped.
        (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
        _ => None,
    };

    Ok(CaptureMetadata {
        location,
        date: read_capture_date(&exif),
    })
}

/// One GPS axis: a degrees/minutes/seconds rational triple plus its
/// hemisphere reference.
fn read_axis(exif: &exif::Exif, tag: Tag, ref_tag: Tag) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let triple: Vec<f64> = match &field.value {
        Value::Rational(parts) => parts.iter().map(|r| r.to_f64()).collect(),
        Value::SRational(parts) => parts.iter().map(|r| r.to_f64()).collect(),
        _ => return None,
    };
    let decimal = convert_dms_to_decimal(&triple)?;

    let sign = match exif.get_field(ref_tag, In::PRIMARY) {
        Some(reference) => {
            let reference = reference.display_value().to_string();
            if reference == "S" || reference == "W" {
                -1.0
            } else {
                1.0
            }
        }
        None => 1.0,
    };
    Some(sign * decimal)
}

/// [degrees, minutes, seconds] to decimal degrees. Anything that is not
/// exactly three components is no fix.
pub fn convert_dms_to_decimal(dms: &[f64]) -> Option<f64> {
    if dms.len() != 3 {
        return None;
    }
    Some(dms[0] + dms[1] / 60.0 + dms[2] / 3600.0)
}

/// Capture time, falling back to the generic modification time. Time of day
/// is dropped; the board only ever shows calendar dates.
fn read_capture_date(exif: &exif::Exif) -> Option<NaiveDate> {
    let field = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .or_else(|| exif.get_field(Tag::DateTime, In::PRIMARY))?;
    parse_exif_date(&field.display_value().to_string())
}

/// EXIF datetimes come as "2025:06:10 14:03:22" raw or "2025-06-10 14:03:22"
/// once rendered; accept both separators.
pub(crate) fn parse_exif_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split_whitespace().next()?;
    let normalized = date_part.replace(':', "-");
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").ok()
}
