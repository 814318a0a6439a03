//! In-memory store implementations for tests and offline validation runs.

use async_trait::async_trait;

use crate::domain::bracket::{BracketId, WeightBracket};
use crate::domain::carrier::{Carrier, CarrierId};
use crate::domain::geo::{City, CityId, State, StateId};
use crate::domain::price::PriceEntry;
use crate::domain::route::{Route, RouteId};

use super::{PricingStore, ReferenceStore, StoreError};

#[derive(Default)]
pub struct InMemoryReferenceStore {
    pub states: Vec<State>,
    pub cities: Vec<City>,
    pub carriers: Vec<Carrier>,
    pub routes: Vec<Route>,
}

#[async_trait]
impl ReferenceStore for InMemoryReferenceStore {
    async fn state_by_uf(&self, uf: &str) -> Result<Option<State>, StoreError> {
        Ok(self.states.iter().find(|state| state.uf.eq_ignore_ascii_case(uf)).cloned())
    }

    async fn city_by_name(
        &self,
        state_id: StateId,
        name: &str,
    ) -> Result<Option<City>, StoreError> {
        Ok(self
            .cities
            .iter()
            .find(|city| {
                city.state_id == state_id && city.name.to_lowercase() == name.to_lowercase()
            })
            .cloned())
    }

    async fn cities_in_state(&self, state_id: StateId) -> Result<Vec<City>, StoreError> {
        Ok(self.cities.iter().filter(|city| city.state_id == state_id).cloned().collect())
    }

    async fn active_carriers(&self) -> Result<Vec<Carrier>, StoreError> {
        Ok(self.carriers.iter().filter(|carrier| carrier.active).cloned().collect())
    }

    async fn route_between(
        &self,
        origin: CityId,
        destination: CityId,
    ) -> Result<Option<Route>, StoreError> {
        Ok(self
            .routes
            .iter()
            .find(|route| {
                route.active
                    && route.origin_city_id == origin
                    && route.destination_city_id == destination
            })
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryPricingStore {
    pub brackets: Vec<WeightBracket>,
    pub entries: Vec<PriceEntry>,
}

#[async_trait]
impl PricingStore for InMemoryPricingStore {
    async fn active_entries_for_pair(
        &self,
        route: RouteId,
        carrier: CarrierId,
    ) -> Result<Vec<PriceEntry>, StoreError> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| {
                entry.active && entry.route_id == route && entry.carrier_id == carrier
            })
            .cloned()
            .collect())
    }

    async fn entries_for_route(&self, route: RouteId) -> Result<Vec<PriceEntry>, StoreError> {
        Ok(self.entries.iter().filter(|entry| entry.route_id == route).cloned().collect())
    }

    async fn bracket_by_id(&self, id: BracketId) -> Result<Option<WeightBracket>, StoreError> {
        Ok(self.brackets.iter().find(|bracket| bracket.id == id).cloned())
    }

    async fn active_brackets(&self) -> Result<Vec<WeightBracket>, StoreError> {
        Ok(self.brackets.iter().filter(|bracket| bracket.active).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::geo::{City, CityId, State, StateId};
    use crate::stores::ReferenceStore;

    use super::InMemoryReferenceStore;

    #[tokio::test]
    async fn city_lookup_is_case_insensitive_within_the_state() {
        let store = InMemoryReferenceStore {
            states: vec![State { id: StateId(1), uf: "SP".to_string(), name: "São Paulo".to_string() }],
            cities: vec![City {
                id: CityId(10),
                name: "São Paulo".to_string(),
                state_id: StateId(1),
                ibge_code: None,
            }],
            ..InMemoryReferenceStore::default()
        };

        let found = store.city_by_name(StateId(1), "sÃo paulo").await.expect("lookup");
        assert_eq!(found.map(|city| city.id), Some(CityId(10)));

        let missing = store.city_by_name(StateId(2), "São Paulo").await.expect("lookup");
        assert!(missing.is_none());
    }
}
