use sqlx::Executor;
use sqlx::Row;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Row counts the seed script is expected to leave behind.
const SEED_CONTRACT: &[(&str, i64)] = &[
    ("state", 2),
    ("city", 3),
    ("carrier", 1),
    ("route", 1),
    ("weight_bracket", 2),
    ("price_entry", 2),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub tables_seeded: Vec<&'static str>,
}

/// Deterministic demo dataset: one priced São Paulo → Rio lane.
pub struct SeedDataset;

impl SeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/seed_data.sql");

    /// Loads the dataset in one transaction. Assumes empty tables; the
    /// script uses fixed ids.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult { tables_seeded: SEED_CONTRACT.iter().map(|(table, _)| *table).collect() })
    }

    /// Verifies the dataset against the expected row counts.
    pub async fn verify(pool: &DbPool) -> Result<(), RepositoryError> {
        for (table, expected) in SEED_CONTRACT {
            let count = sqlx::query(&format!("SELECT COUNT(*) AS count FROM {table}"))
                .fetch_one(pool)
                .await?
                .get::<i64, _>("count");

            if count != *expected {
                return Err(RepositoryError::Decode(format!(
                    "seed verification failed: table `{table}` has {count} rows, expected {expected}"
                )));
            }
        }

        Ok(())
    }
}
