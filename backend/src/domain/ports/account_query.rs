//! Driving port for reading accounts.

use async_trait::async_trait;

use crate::domain::access::Identity;
use crate::domain::{Error, GeoPoint, Role, User};

use super::NearbyUser;

/// Default search radius for nearby users, in metres.
pub const DEFAULT_NEARBY_RADIUS_METERS: f64 = 10_000.0;
/// Largest search radius accepted, in metres.
pub const MAX_NEARBY_RADIUS_METERS: f64 = 100_000.0;

/// Proximity search parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbySearch {
    pub center: GeoPoint,
    pub max_distance_meters: f64,
    pub role: Option<Role>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountQuery: Send + Sync {
    /// The caller's own account.
    async fn profile(&self, identity: Identity) -> Result<User, Error>;

    /// Users near a point, nearest first.
    async fn find_nearby(
        &self,
        identity: Identity,
        search: NearbySearch,
    ) -> Result<Vec<NearbyUser>, Error>;
}
