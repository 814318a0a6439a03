//! Resolution of free-text names from the fiscal document into reference
//! rows.

use crate::domain::carrier::Carrier;
use crate::domain::geo::City;
use crate::stores::{ReferenceStore, StoreError};

use super::normalize::{normalize, strip_prepositions};

/// Resolves a city by document-printed name and UF.
///
/// Cascade, first hit wins: unknown UF fails outright; then an exact
/// case-insensitive store lookup; then, over every city of the state,
/// exact normalized equality, substring containment in either direction,
/// and finally preposition-stripped equality.
pub async fn resolve_city(
    store: &dyn ReferenceStore,
    name: &str,
    uf: &str,
) -> Result<Option<City>, StoreError> {
    let Some(state) = store.state_by_uf(uf.trim()).await? else {
        return Ok(None);
    };

    if let Some(city) = store.city_by_name(state.id, name.trim()).await? {
        return Ok(Some(city));
    }

    let wanted = normalize(name);
    if wanted.is_empty() {
        return Ok(None);
    }
    let candidates = store.cities_in_state(state.id).await?;

    if let Some(city) = candidates.iter().find(|city| normalize(&city.name) == wanted) {
        return Ok(Some(city.clone()));
    }

    if let Some(city) = candidates.iter().find(|city| {
        let registered = normalize(&city.name);
        registered.contains(&wanted) || wanted.contains(&registered)
    }) {
        return Ok(Some(city.clone()));
    }

    let stripped = strip_prepositions(name);
    Ok(candidates
        .iter()
        .find(|city| strip_prepositions(&city.name) == stripped)
        .cloned())
}

/// Resolves a carrier by the legal name printed on the CT-e issuer block.
///
/// Exact normalized match against `legal_name` of active carriers only.
/// No fuzzy pass and no `display_name` fallback: issuer blocks must carry
/// the registered legal name verbatim.
pub async fn resolve_carrier(
    store: &dyn ReferenceStore,
    legal_name: &str,
) -> Result<Option<Carrier>, StoreError> {
    let wanted = normalize(legal_name);
    if wanted.is_empty() {
        return Ok(None);
    }

    let carriers = store.active_carriers().await?;
    Ok(carriers.into_iter().find(|carrier| normalize(&carrier.legal_name) == wanted))
}
