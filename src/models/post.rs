// src/models/post.rs - post record as stored under posts/{owner}/{postId}
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::geo::GeoPoint;

/// One stored image inside a post's slot map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub url: String,
    #[serde(rename = "isThumbnail")]
    pub is_thumbnail: bool,
}

/// The wire shape of a post record in the document store. Matches the
/// database schema exactly, camelCase keys included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub description: String,
    /// Server-assigned creation time, ISO-8601.
    #[serde(rename = "createdAt")]
    pub created_at: String,
    /// Capture date in YY/MM/DD textual form. Older records may miss it.
    #[serde(rename = "capturedAt", default)]
    pub captured_at: String,
    /// Slot key (`img1`, `img2`, ...) to stored image. Exactly one entry is
    /// the thumbnail and it is always `img1`.
    pub images: BTreeMap<String, ImageEntry>,
}

/// A post record together with its store-assigned identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: String,
    pub owner_id: String,
    #[serde(flatten)]
    pub record: PostRecord,
}

/// Slot key for a 1-based position in the upload order.
pub fn slot_key(slot: usize) -> String {
    format!("img{}", slot)
}

/// Capture dates are stored as YY/MM/DD (two-digit year).
pub fn format_captured_at(date: NaiveDate) -> String {
    use chrono::Datelike;
    format!("{:02}/{:02}/{:02}", date.year() % 100, date.month(), date.day())
}

impl PostRecord {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Creation date portion of the ISO-8601 timestamp.
    pub fn created_date(&self) -> Option<NaiveDate> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.date_naive())
    }

    /// Creation date as the board displays it (the part before 'T').
    pub fn created_date_label(&self) -> String {
        self.created_at
            .split('T')
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// Slots in positional order. The map key order is lexicographic, which
    /// puts img10 between img1 and img2, so sort by the numeric suffix.
    pub fn ordered_images(&self) -> Vec<(&str, &ImageEntry)> {
        let mut entries: Vec<(&str, &ImageEntry)> = self
            .images
            .iter()
            .map(|(key, entry)| (key.as_str(), entry))
            .collect();
        entries.sort_by_key(|(key, _)| {
            key.trim_start_matches("img")
                .parse::<usize>()
                .unwrap_or(usize::MAX)
        });
        entries
    }

    /// URL of the thumbnail slot (img1).
    pub fn thumbnail_url(&self) -> Option<&str> {
        self.images.get("img1").map(|entry| entry.url.as_str())
    }
}
