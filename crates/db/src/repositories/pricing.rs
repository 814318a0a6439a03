use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use fretado_core::domain::bracket::{BracketId, WeightBracket};
use fretado_core::domain::carrier::CarrierId;
use fretado_core::domain::price::{PriceEntry, PriceEntryId};
use fretado_core::domain::route::RouteId;
use fretado_core::stores::{PricingStore, StoreError};

use super::{backend, decimal_column, RepositoryError};
use crate::DbPool;

const PRICE_ENTRY_COLUMNS: &str = "id, route_id, weight_bracket_id, carrier_id, base_price, \
     embark_fee_pct, weight_freight_pct, admin_fee, gris_pct, gris_floor, tde_pct, \
     chemical_tax_pct, toll, toll_fraction, toll_minimum, value_freight_pct, valid_from, \
     valid_to, active";

pub struct SqlPricingStore {
    pool: DbPool,
}

impl SqlPricingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PricingStore for SqlPricingStore {
    async fn active_entries_for_pair(
        &self,
        route: RouteId,
        carrier: CarrierId,
    ) -> Result<Vec<PriceEntry>, StoreError> {
        let query = format!(
            "SELECT {PRICE_ENTRY_COLUMNS} FROM price_entry
             WHERE route_id = ?1 AND carrier_id = ?2 AND active = 1
             ORDER BY valid_from DESC"
        );
        let rows = sqlx::query(&query)
            .bind(route.0)
            .bind(carrier.0)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        rows.iter().map(entry_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }

    async fn entries_for_route(&self, route: RouteId) -> Result<Vec<PriceEntry>, StoreError> {
        let query = format!("SELECT {PRICE_ENTRY_COLUMNS} FROM price_entry WHERE route_id = ?1");
        let rows =
            sqlx::query(&query).bind(route.0).fetch_all(&self.pool).await.map_err(backend)?;

        rows.iter().map(entry_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }

    async fn bracket_by_id(&self, id: BracketId) -> Result<Option<WeightBracket>, StoreError> {
        let row = sqlx::query(
            "SELECT id, min_weight, max_weight, description, position, active
             FROM weight_bracket WHERE id = ?1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(|row| bracket_from_row(&row)).transpose().map_err(Into::into)
    }

    async fn active_brackets(&self) -> Result<Vec<WeightBracket>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, min_weight, max_weight, description, position, active
             FROM weight_bracket WHERE active = 1 ORDER BY max_weight",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(bracket_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }
}

fn bracket_from_row(row: &SqliteRow) -> Result<WeightBracket, RepositoryError> {
    Ok(WeightBracket {
        id: BracketId(row.try_get("id")?),
        min_weight: row.try_get("min_weight")?,
        max_weight: row.try_get("max_weight")?,
        description: row.try_get("description")?,
        position: row.try_get("position")?,
        active: row.try_get("active")?,
    })
}

fn entry_from_row(row: &SqliteRow) -> Result<PriceEntry, RepositoryError> {
    Ok(PriceEntry {
        id: PriceEntryId(row.try_get("id")?),
        route_id: RouteId(row.try_get("route_id")?),
        bracket_id: BracketId(row.try_get("weight_bracket_id")?),
        carrier_id: CarrierId(row.try_get("carrier_id")?),
        base_price: decimal_column(row, "base_price")?,
        embark_fee_pct: decimal_column(row, "embark_fee_pct")?,
        weight_freight_pct: decimal_column(row, "weight_freight_pct")?,
        admin_fee: decimal_column(row, "admin_fee")?,
        gris_pct: decimal_column(row, "gris_pct")?,
        gris_floor: decimal_column(row, "gris_floor")?,
        tde_pct: decimal_column(row, "tde_pct")?,
        chemical_tax_pct: decimal_column(row, "chemical_tax_pct")?,
        toll: decimal_column(row, "toll")?,
        toll_fraction: decimal_column(row, "toll_fraction")?,
        toll_minimum: decimal_column(row, "toll_minimum")?,
        value_freight_pct: decimal_column(row, "value_freight_pct")?,
        valid_from: row.try_get::<NaiveDate, _>("valid_from")?,
        valid_to: row.try_get::<Option<NaiveDate>, _>("valid_to")?,
        active: row.try_get("active")?,
    })
}
