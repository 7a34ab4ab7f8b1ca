//! Distance and punctuality checks.
//!
//! Location is checked before time: a scan from outside the geofence is
//! INVALID no matter when it happens.

use chrono::{DateTime, Duration, Utc};
use rollcall_api::{AttendanceStatus, GeoPoint};

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two points, in meters.
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Instant after which an in-range scan counts as late. Saturates at the
/// latest representable instant.
pub fn late_after(session_start: DateTime<Utc>, late_threshold_minutes: u32) -> DateTime<Utc> {
    session_start
        .checked_add_signed(Duration::minutes(i64::from(late_threshold_minutes)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Classify a scan.
///
/// `distance == radius` is inside the fence, and a scan exactly at
/// `start + threshold` is still on time.
pub fn classify(
    distance_meters: f64,
    radius_meters: f64,
    session_start: DateTime<Utc>,
    late_threshold_minutes: u32,
    now: DateTime<Utc>,
) -> AttendanceStatus {
    if distance_meters > radius_meters {
        AttendanceStatus::Invalid
    } else if now > late_after(session_start, late_threshold_minutes) {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}
