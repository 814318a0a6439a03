use serde::{Deserialize, Serialize};

use crate::domain::geo::CityId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteId(pub i64);

/// Directed origin/destination pair. Unique on (origin, destination).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub origin_city_id: CityId,
    pub destination_city_id: CityId,
    pub active: bool,
}

impl Route {
    /// Builds a route, rejecting self-loops before anything is persisted.
    pub fn new(
        id: RouteId,
        origin_city_id: CityId,
        destination_city_id: CityId,
        active: bool,
    ) -> Result<Self, DomainError> {
        if origin_city_id == destination_city_id {
            return Err(DomainError::SelfLoopRoute { city_id: origin_city_id.0 });
        }

        Ok(Self { id, origin_city_id, destination_city_id, active })
    }
}
