// src/services/location_resolver.rs - one authoritative GeoPoint per post
use std::time::Duration;

use tokio::time::timeout;

use crate::models::geo::GeoPoint;
use crate::repositories::ports::{GeolocationService, PermissionState};

/// The device fix must not stall the upload pipeline; past this it is
/// treated as unavailable.
pub const DEVICE_FIX_TIMEOUT: Duration = Duration::from_secs(5);

/// Merge the candidate locations into one, highest precedence first:
/// an explicit map pick, then the first image's embedded GPS, then the
/// device sensor. The sensor is only consulted when extraction produced
/// nothing, so no permission prompt fires for posts that already have a fix.
/// None means the upload must not proceed.
pub async fn resolve(
    user_chosen: Option<GeoPoint>,
    extracted: Option<GeoPoint>,
    geolocation: &dyn GeolocationService,
) -> Option<GeoPoint> {
    resolve_with_timeout(user_chosen, extracted, geolocation, DEVICE_FIX_TIMEOUT).await
}

pub async fn resolve_with_timeout(
    user_chosen: Option<GeoPoint>,
    extracted: Option<GeoPoint>,
    geolocation: &dyn GeolocationService,
    device_wait: Duration,
) -> Option<GeoPoint> {
    if let Some(point) = user_chosen {
        return Some(point);
    }
    if let Some(point) = extracted {
        return Some(point);
    }

    match geolocation.request_permission().await {
        PermissionState::Granted | PermissionState::Prompt => {}
        PermissionState::Denied => return None,
    }

    match timeout(device_wait, geolocation.current_position()).await {
        Ok(Ok(point)) => Some(point),
        // Sensor failure or timeout: best effort only, fall through.
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::repositories::ports::StoreError;

    struct StubGeolocation {
        permission: PermissionState,
        position: Option<GeoPoint>,
        delay: Duration,
        asked_for_position: AtomicBool,
    }

    impl StubGeolocation {
        fn new(permission: PermissionState, position: Option<GeoPoint>) -> Self {
            Self {
                permission,
                position,
                delay: Duration::ZERO,
                asked_for_position: AtomicBool::new(false),
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl GeolocationService for StubGeolocation {
        async fn request_permission(&self) -> PermissionState {
            self.permission
        }

        async fn current_position(&self) -> Result<GeoPoint, StoreError> {
            self.asked_for_position.store(true, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.position
                .ok_or_else(|| StoreError::Geolocation("no fix".to_string()))
        }
    }

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng)
    }

    #[tokio::test]
    async fn user_pick_beats_everything() {
        let device = StubGeolocation::new(PermissionState::Granted, Some(point(3.0, 3.0)));
        let resolved = resolve(Some(point(1.0, 1.0)), Some(point(2.0, 2.0)), &device).await;
        assert_eq!(resolved, Some(point(1.0, 1.0)));
        assert!(!device.asked_for_position.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn extracted_beats_device_and_device_is_never_read() {
        let device = StubGeolocation::new(PermissionState::Granted, Some(point(3.0, 3.0)));
        let resolved = resolve(None, Some(point(2.0, 2.0)), &device).await;
        assert_eq!(resolved, Some(point(2.0, 2.0)));
        assert!(!device.asked_for_position.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn device_fix_is_last_resort() {
        let device = StubGeolocation::new(PermissionState::Granted, Some(point(3.0, 3.0)));
        let resolved = resolve(None, None, &device).await;
        assert_eq!(resolved, Some(point(3.0, 3.0)));
    }

    #[tokio::test]
    async fn nothing_resolvable_is_none() {
        let device = StubGeolocation::new(PermissionState::Granted, None);
        assert_eq!(resolve(None, None, &device).await, None);
    }

    #[tokio::test]
    async fn denied_permission_skips_the_sensor() {
        let device = StubGeolocation::new(PermissionState::Denied, Some(point(3.0, 3.0)));
        assert_eq!(resolve(None, None, &device).await, None);
        assert!(!device.asked_for_position.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn slow_sensor_times_out_to_none() {
        let device = StubGeolocation::new(PermissionState::Granted, Some(point(3.0, 3.0)))
            .slow(Duration::from_millis(100));
        let resolved =
            resolve_with_timeout(None, None, &device, Duration::from_millis(10)).await;
        assert_eq!(resolved, None);
    }
}
