// src/models/geo.rs - geographic primitives shared by upload and board paths
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair. Always constructed as a pair; a post never
/// carries a single coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        GeoPoint { lat, lng }
    }
}

/// Name of the sentinel region that matches every post.
pub const ALL_REGION: &str = "전체";

/// Half-width of the region bounding box, degrees on both axes.
/// This is an axis-aligned approximation, not a radius; the board has always
/// bucketed posts this way and regions would shift if it changed.
pub const REGION_HALF_WIDTH_DEG: f64 = 0.7;

/// A named region bucket for the board's dropdown. Center and zoom drive the
/// map viewport, the center also anchors the containment test.
#[derive(Debug, Clone, Serialize)]
pub struct Region {
    pub name: &'static str,
    pub center: GeoPoint,
    pub zoom: u8,
}

/// Region table from the board UI: nationwide sentinel plus the seven
/// metropolitan cities.
pub static REGIONS: [Region; 8] = [
    Region { name: ALL_REGION, center: GeoPoint { lat: 36.5, lng: 127.8 }, zoom: 7 },
    Region { name: "서울", center: GeoPoint { lat: 37.5665, lng: 126.9780 }, zoom: 11 },
    Region { name: "부산", center: GeoPoint { lat: 35.1796, lng: 129.0756 }, zoom: 11 },
    Region { name: "대구", center: GeoPoint { lat: 35.8714, lng: 128.6014 }, zoom: 11 },
    Region { name: "인천", center: GeoPoint { lat: 37.4563, lng: 126.7052 }, zoom: 11 },
    Region { name: "광주", center: GeoPoint { lat: 35.1595, lng: 126.8526 }, zoom: 11 },
    Region { name: "대전", center: GeoPoint { lat: 36.3504, lng: 127.3845 }, zoom: 11 },
    Region { name: "울산", center: GeoPoint { lat: 35.5384, lng: 129.3114 }, zoom: 11 },
];

impl Region {
    pub fn is_all(&self) -> bool {
        self.name == ALL_REGION
    }

    /// Bounding-box containment: strictly less than 0.7° from the center on
    /// both axes. The sentinel matches unconditionally.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        if self.is_all() {
            return true;
        }
        (point.lat - self.center.lat).abs() < REGION_HALF_WIDTH_DEG
            && (point.lng - self.center.lng).abs() < REGION_HALF_WIDTH_DEG
    }
}

/// Look up a region by its dropdown label.
pub fn find_region(name: &str) -> Option<&'static Region> {
    REGIONS.iter().find(|region| region.name == name)
}

/// Inclusive date range for board filtering. `start > end` makes the range
/// semantically invalid; callers must not filter with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seoul_contains_its_own_center() {
        let seoul = find_region("서울").unwrap();
        assert!(seoul.contains(&GeoPoint::new(37.5665, 126.9780)));
    }

    #[test]
    fn region_excludes_points_past_the_half_width() {
        let seoul = find_region("서울").unwrap();
        // Busan is well over 0.7° away on both axes.
        assert!(!seoul.contains(&GeoPoint::new(35.1796, 129.0756)));
        // Exactly on the edge is out: the test is strict.
        assert!(!seoul.contains(&GeoPoint::new(37.5665 + 0.7, 126.9780)));
        // Just inside the edge is in.
        assert!(seoul.contains(&GeoPoint::new(37.5665 + 0.699, 126.9780)));
    }

    #[test]
    fn sentinel_matches_everything() {
        let all = find_region(ALL_REGION).unwrap();
        assert!(all.contains(&GeoPoint::new(-89.0, 179.0)));
    }

    #[test]
    fn reversed_range_is_invalid() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        };
        assert!(!range.is_valid());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        };
        assert!(range.contains(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()));
        assert!(range.contains(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()));
    }
}
