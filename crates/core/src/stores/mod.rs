pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::bracket::{BracketId, WeightBracket};
use crate::domain::carrier::{Carrier, CarrierId};
use crate::domain::geo::{City, CityId, State, StateId};
use crate::domain::price::PriceEntry;
use crate::domain::route::{Route, RouteId};

pub use memory::{InMemoryPricingStore, InMemoryReferenceStore};

/// Persistence failure while reading reference data. Business "not found"
/// outcomes are `Ok(None)`/empty vectors, never errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("reference store failure: {0}")]
    Backend(String),
}

/// Read-only access to the geographic and carrier reference tables.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn state_by_uf(&self, uf: &str) -> Result<Option<State>, StoreError>;

    /// Exact case-insensitive name lookup within one state. Fuzzy matching
    /// stays in the resolver; this is the fast path.
    async fn city_by_name(&self, state_id: StateId, name: &str)
        -> Result<Option<City>, StoreError>;

    async fn cities_in_state(&self, state_id: StateId) -> Result<Vec<City>, StoreError>;

    async fn active_carriers(&self) -> Result<Vec<Carrier>, StoreError>;

    /// Active route for the directed (origin, destination) pair.
    async fn route_between(
        &self,
        origin: CityId,
        destination: CityId,
    ) -> Result<Option<Route>, StoreError>;
}

/// Read-only access to the price table.
#[async_trait]
pub trait PricingStore: Send + Sync {
    /// Active tariff cells for a (route, carrier) pair. Date-window
    /// filtering happens in the engine so that expired-but-registered
    /// entries remain visible to diagnostics.
    async fn active_entries_for_pair(
        &self,
        route: RouteId,
        carrier: CarrierId,
    ) -> Result<Vec<PriceEntry>, StoreError>;

    /// Every entry on a route regardless of carrier or flags, for the
    /// "price not found" diagnostics.
    async fn entries_for_route(&self, route: RouteId) -> Result<Vec<PriceEntry>, StoreError>;

    async fn bracket_by_id(&self, id: BracketId) -> Result<Option<WeightBracket>, StoreError>;

    async fn active_brackets(&self) -> Result<Vec<WeightBracket>, StoreError>;
}
