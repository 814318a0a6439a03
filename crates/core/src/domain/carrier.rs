use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CarrierId(pub i64);

/// Registered freight carrier.
///
/// `legal_name` is the join key for CT-e issuer matching; `display_name`
/// exists only for back-office screens and is never used in validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    pub id: CarrierId,
    pub display_name: String,
    pub legal_name: String,
    pub tax_id: String,
    pub active: bool,
}
