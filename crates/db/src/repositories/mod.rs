use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use thiserror::Error;

use fretado_core::stores::StoreError;

pub mod pricing;
pub mod reference;

pub use pricing::SqlPricingStore;
pub use reference::SqlReferenceStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        StoreError::Backend(error.to_string())
    }
}

pub(crate) fn backend(error: sqlx::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}

/// Money and percent columns live as TEXT so the stored decimal scale
/// survives unchanged; decode to fixed-point here.
pub(crate) fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, RepositoryError> {
    let raw: String = row.try_get(column)?;
    raw.trim()
        .parse::<Decimal>()
        .map_err(|error| RepositoryError::Decode(format!("column `{column}` = `{raw}`: {error}")))
}
