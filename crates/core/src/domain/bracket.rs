use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BracketId(pub i64);

/// Weight band of the price table, in kilograms.
///
/// Bands are allowed to overlap: the table mixes coarse 10 kg bands
/// imported from the historical CSV tariff with the fine-grained bands the
/// current table actually prices. Selection between overlapping matches is
/// the bracket selector's job, not a data invariant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightBracket {
    pub id: BracketId,
    pub min_weight: f64,
    pub max_weight: f64,
    pub description: String,
    pub position: i32,
    pub active: bool,
}

impl WeightBracket {
    pub fn contains(&self, weight: f64) -> bool {
        weight >= self.min_weight && weight <= self.max_weight
    }

    pub fn span(&self) -> f64 {
        self.max_weight - self.min_weight
    }
}
