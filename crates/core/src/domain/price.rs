use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::bracket::BracketId;
use crate::domain::carrier::CarrierId;
use crate::domain::route::RouteId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceEntryId(pub i64);

/// One negotiated tariff cell for a (route, bracket, carrier) triple,
/// valid over a date window.
///
/// Percent columns carry the legacy stored scale: the stored number is in
/// percentage points, so `0.20` means 0.20% and must be divided by 100 to
/// reach a decimal fraction. [`crate::validation::tariff::percent_fraction`]
/// is the only place that conversion happens.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub id: PriceEntryId,
    pub route_id: RouteId,
    pub bracket_id: BracketId,
    pub carrier_id: CarrierId,
    pub base_price: Decimal,
    pub embark_fee_pct: Decimal,
    pub weight_freight_pct: Decimal,
    pub admin_fee: Decimal,
    pub gris_pct: Decimal,
    pub gris_floor: Decimal,
    pub tde_pct: Decimal,
    pub chemical_tax_pct: Decimal,
    /// Direct toll value; zero means "derive from fraction/minimum".
    pub toll: Decimal,
    /// Either a decimal fraction of cargo value (< 1) or a fixed amount.
    pub toll_fraction: Decimal,
    pub toll_minimum: Decimal,
    pub value_freight_pct: Decimal,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub active: bool,
}

impl PriceEntry {
    /// A tariff cell applies when it is active and `date` falls inside
    /// `[valid_from, valid_to]`; an open `valid_to` never expires.
    pub fn is_applicable_on(&self, date: NaiveDate) -> bool {
        if !self.active || date < self.valid_from {
            return false;
        }
        match self.valid_to {
            Some(end) => date <= end,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::domain::bracket::BracketId;
    use crate::domain::carrier::CarrierId;
    use crate::domain::route::RouteId;

    use super::{PriceEntry, PriceEntryId};

    fn entry(valid_from: &str, valid_to: Option<&str>, active: bool) -> PriceEntry {
        PriceEntry {
            id: PriceEntryId(1),
            route_id: RouteId(1),
            bracket_id: BracketId(1),
            carrier_id: CarrierId(1),
            base_price: Decimal::new(10_000, 2),
            embark_fee_pct: Decimal::ZERO,
            weight_freight_pct: Decimal::ZERO,
            admin_fee: Decimal::ZERO,
            gris_pct: Decimal::ZERO,
            gris_floor: Decimal::ZERO,
            tde_pct: Decimal::ZERO,
            chemical_tax_pct: Decimal::ZERO,
            toll: Decimal::ZERO,
            toll_fraction: Decimal::ZERO,
            toll_minimum: Decimal::ZERO,
            value_freight_pct: Decimal::ZERO,
            valid_from: date(valid_from),
            valid_to: valid_to.map(date),
            active,
        }
    }

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("test date")
    }

    #[test]
    fn open_ended_window_never_expires() {
        let entry = entry("2024-01-01", None, true);
        assert!(entry.is_applicable_on(date("2024-01-01")));
        assert!(entry.is_applicable_on(date("2030-12-31")));
        assert!(!entry.is_applicable_on(date("2023-12-31")));
    }

    #[test]
    fn closed_window_is_inclusive() {
        let entry = entry("2024-01-01", Some("2024-06-30"), true);
        assert!(entry.is_applicable_on(date("2024-06-30")));
        assert!(!entry.is_applicable_on(date("2024-07-01")));
    }

    #[test]
    fn inactive_entry_never_applies() {
        let entry = entry("2024-01-01", None, false);
        assert!(!entry.is_applicable_on(date("2024-06-01")));
    }
}
