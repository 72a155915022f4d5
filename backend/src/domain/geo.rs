//! Geographic coordinates and great-circle distance.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Mean Earth radius in metres, as used by spherical 2dsphere indexes.
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

/// Validation errors for [`GeoPoint`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeoPointError {
    #[error("longitude must be within [-180, 180], got {0}")]
    Longitude(f64),
    #[error("latitude must be within [-90, 90], got {0}")]
    Latitude(f64),
}

/// WGS84 longitude/latitude pair.
///
/// ## Invariants
/// - `longitude` is finite and within `[-180, 180]`.
/// - `latitude` is finite and within `[-90, 90]`.
///
/// # Examples
/// ```
/// use foodshare::domain::GeoPoint;
///
/// let point = GeoPoint::new(72.8777, 19.0760).expect("valid coordinates");
/// assert_eq!(point.distance_meters(&point), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "GeoPointDto", into = "GeoPointDto")]
#[schema(as = GeoPoint)]
pub struct GeoPoint {
    #[schema(example = 72.8777)]
    longitude: f64,
    #[schema(example = 19.076)]
    latitude: f64,
}

impl GeoPoint {
    /// Validate a coordinate pair.
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, GeoPointError> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoPointError::Longitude(longitude));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoPointError::Latitude(latitude));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Haversine distance to `other` in metres.
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().min(1.0).asin()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct GeoPointDto {
    longitude: f64,
    latitude: f64,
}

impl From<GeoPoint> for GeoPointDto {
    fn from(value: GeoPoint) -> Self {
        Self {
            longitude: value.longitude,
            latitude: value.latitude,
        }
    }
}

impl TryFrom<GeoPointDto> for GeoPoint {
    type Error = GeoPointError;

    fn try_from(value: GeoPointDto) -> Result<Self, Self::Error> {
        GeoPoint::new(value.longitude, value.latitude)
    }
}
