use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use fretado_core::domain::carrier::{Carrier, CarrierId};
use fretado_core::domain::geo::{City, CityId, State, StateId};
use fretado_core::domain::route::{Route, RouteId};
use fretado_core::stores::{ReferenceStore, StoreError};

use super::{backend, RepositoryError};
use crate::DbPool;

pub struct SqlReferenceStore {
    pool: DbPool,
}

impl SqlReferenceStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceStore for SqlReferenceStore {
    async fn state_by_uf(&self, uf: &str) -> Result<Option<State>, StoreError> {
        let row = sqlx::query("SELECT id, uf, name FROM state WHERE UPPER(uf) = UPPER(?1)")
            .bind(uf)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(|row| state_from_row(&row)).transpose().map_err(Into::into)
    }

    async fn city_by_name(
        &self,
        state_id: StateId,
        name: &str,
    ) -> Result<Option<City>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, state_id, ibge_code FROM city
             WHERE state_id = ?1 AND LOWER(name) = LOWER(?2)",
        )
        .bind(state_id.0)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(|row| city_from_row(&row)).transpose().map_err(Into::into)
    }

    async fn cities_in_state(&self, state_id: StateId) -> Result<Vec<City>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, state_id, ibge_code FROM city WHERE state_id = ?1 ORDER BY name",
        )
        .bind(state_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(city_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }

    async fn active_carriers(&self) -> Result<Vec<Carrier>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, display_name, legal_name, tax_id, active FROM carrier
             WHERE active = 1 ORDER BY legal_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(carrier_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }

    async fn route_between(
        &self,
        origin: CityId,
        destination: CityId,
    ) -> Result<Option<Route>, StoreError> {
        let row = sqlx::query(
            "SELECT id, origin_city_id, destination_city_id, active FROM route
             WHERE origin_city_id = ?1 AND destination_city_id = ?2 AND active = 1",
        )
        .bind(origin.0)
        .bind(destination.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(|row| route_from_row(&row)).transpose().map_err(Into::into)
    }
}

fn state_from_row(row: &SqliteRow) -> Result<State, RepositoryError> {
    Ok(State {
        id: StateId(row.try_get("id")?),
        uf: row.try_get("uf")?,
        name: row.try_get("name")?,
    })
}

fn city_from_row(row: &SqliteRow) -> Result<City, RepositoryError> {
    Ok(City {
        id: CityId(row.try_get("id")?),
        name: row.try_get("name")?,
        state_id: StateId(row.try_get("state_id")?),
        ibge_code: row.try_get("ibge_code")?,
    })
}

fn carrier_from_row(row: &SqliteRow) -> Result<Carrier, RepositoryError> {
    Ok(Carrier {
        id: CarrierId(row.try_get("id")?),
        display_name: row.try_get("display_name")?,
        legal_name: row.try_get("legal_name")?,
        tax_id: row.try_get("tax_id")?,
        active: row.try_get("active")?,
    })
}

fn route_from_row(row: &SqliteRow) -> Result<Route, RepositoryError> {
    Ok(Route {
        id: RouteId(row.try_get("id")?),
        origin_city_id: CityId(row.try_get("origin_city_id")?),
        destination_city_id: CityId(row.try_get("destination_city_id")?),
        active: row.try_get("active")?,
    })
}
