//! Expected-freight computation from a tariff cell and the declared cargo
//! value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::price::PriceEntry;

/// CST codes under which the operation carries no ICMS charge.
const ICMS_EXEMPT_CSTS: &[&str] = &["40", "41", "45"];

/// Converts a stored percent column into a decimal fraction.
///
/// The price table keeps percentages in the scale the legacy CSV import
/// used: the stored number is already in percentage points, so `0.48630`
/// means 0.48630% and the fraction is `stored / 100`. Every percent read
/// goes through here; do not divide anywhere else.
pub fn percent_fraction(stored: Decimal) -> Decimal {
    stored / Decimal::ONE_HUNDRED
}

/// Per-term audit trail of one expected-price computation. Serialized into
/// the validation response under the legacy field names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TariffBreakdown {
    #[serde(rename = "precoBase")]
    pub base_price: Decimal,
    #[serde(rename = "freteValor")]
    pub value_freight: Decimal,
    #[serde(rename = "gris")]
    pub gris: Decimal,
    #[serde(rename = "taxaAdministrativa")]
    pub admin_fee: Decimal,
    #[serde(rename = "tde")]
    pub tde: Decimal,
    #[serde(rename = "taxaQuimicos")]
    pub chemical_tax: Decimal,
    /// Reported for auditability; not part of the expected total. Tolls
    /// are invoiced separately from the freight service.
    #[serde(rename = "pedagio")]
    pub toll: Decimal,
    /// ICMS exemption flag from the document's CST; informational only.
    #[serde(rename = "icmsIsento")]
    pub icms_exempt: bool,
    #[serde(rename = "valorTotalEsperado")]
    pub expected_total: Decimal,
}

/// Composes the expected freight charge for one tariff cell.
///
/// Percentage surcharges apply over the declared cargo value; GRIS is
/// floored at the negotiated minimum. Toll and ICMS are computed for the
/// breakdown but excluded from the total: both are billed outside the
/// freight service and must not count against the table comparison.
pub fn compute_expected(
    entry: &PriceEntry,
    cargo_value: Decimal,
    icms_cst: Option<&str>,
) -> TariffBreakdown {
    let value_freight = if cargo_value > Decimal::ZERO {
        cargo_value * percent_fraction(entry.value_freight_pct)
    } else {
        Decimal::ZERO
    };

    let gris = if entry.gris_pct > Decimal::ZERO && cargo_value > Decimal::ZERO {
        let computed = cargo_value * percent_fraction(entry.gris_pct);
        if computed < entry.gris_floor {
            entry.gris_floor
        } else {
            computed
        }
    } else {
        Decimal::ZERO
    };

    let tde = cargo_value * percent_fraction(entry.tde_pct);
    let chemical_tax = cargo_value * percent_fraction(entry.chemical_tax_pct);
    let toll = resolve_toll(entry, cargo_value);

    let icms_exempt = icms_cst
        .map(|cst| ICMS_EXEMPT_CSTS.contains(&cst.trim()))
        .unwrap_or(false);

    let expected_total =
        entry.base_price + value_freight + gris + entry.admin_fee + tde + chemical_tax;

    TariffBreakdown {
        base_price: entry.base_price,
        value_freight,
        gris,
        admin_fee: entry.admin_fee,
        tde,
        chemical_tax,
        toll,
        icms_exempt,
        expected_total,
    }
}

/// Toll resolution: a stored direct value wins; otherwise the
/// (fraction, minimum) rule applies. A fraction under 1 reads as a share
/// of the cargo value, anything else as a fixed amount, floored at the
/// minimum.
fn resolve_toll(entry: &PriceEntry, cargo_value: Decimal) -> Decimal {
    if entry.toll > Decimal::ZERO {
        return entry.toll;
    }

    if entry.toll_fraction <= Decimal::ZERO {
        return entry.toll_minimum.max(Decimal::ZERO);
    }

    let derived = if entry.toll_fraction < Decimal::ONE {
        cargo_value * entry.toll_fraction
    } else {
        entry.toll_fraction
    };

    derived.max(entry.toll_minimum)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::domain::bracket::BracketId;
    use crate::domain::carrier::CarrierId;
    use crate::domain::price::{PriceEntry, PriceEntryId};
    use crate::domain::route::RouteId;

    use super::{compute_expected, percent_fraction};

    fn entry() -> PriceEntry {
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
            valid_from: NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
            valid_to: None,
            active: true,
        }
    }

    #[test]
    fn stored_percent_scale_divides_by_one_hundred() {
        // Stored 0.48630 means 0.48630%, i.e. fraction 0.0048630.
        assert_eq!(percent_fraction(Decimal::new(48_630, 5)), Decimal::new(48_630, 7));
    }

    #[test]
    fn gris_uses_the_stored_scale_and_the_floor() {
        let mut priced = entry();
        priced.gris_pct = Decimal::new(15, 2); // stored 0.15 → 0.15%
        priced.gris_floor = Decimal::new(200, 2);

        // 1000 × 0.0015 = 1.50, under the 2.00 floor.
        let low = compute_expected(&priced, Decimal::new(100_000, 2), None);
        assert_eq!(low.gris, Decimal::new(200, 2));

        // 10000 × 0.0015 = 15.00, floor does not bind.
        let high = compute_expected(&priced, Decimal::new(1_000_000, 2), None);
        assert_eq!(high.gris, Decimal::new(1_500, 2));
    }

    #[test]
    fn gris_is_zero_when_rate_or_cargo_value_is_zero() {
        let mut priced = entry();
        priced.gris_floor = Decimal::new(200, 2);
        let no_rate = compute_expected(&priced, Decimal::new(100_000, 2), None);
        assert_eq!(no_rate.gris, Decimal::ZERO);

        priced.gris_pct = Decimal::new(15, 2);
        let no_cargo = compute_expected(&priced, Decimal::ZERO, None);
        assert_eq!(no_cargo.gris, Decimal::ZERO);
    }

    #[test]
    fn admin_fee_is_added_unconditionally() {
        let mut priced = entry();
        priced.admin_fee = Decimal::new(440, 2);

        let breakdown = compute_expected(&priced, Decimal::ZERO, None);
        assert_eq!(breakdown.expected_total, Decimal::new(10_440, 2));
    }

    #[test]
    fn toll_is_reported_but_never_added_to_the_total() {
        let mut priced = entry();
        priced.toll = Decimal::new(3_550, 2);

        let breakdown = compute_expected(&priced, Decimal::new(50_000, 2), None);
        assert_eq!(breakdown.toll, Decimal::new(3_550, 2));
        assert_eq!(breakdown.expected_total, Decimal::new(10_000, 2));
    }

    #[test]
    fn derived_toll_reads_small_fractions_as_cargo_share() {
        let mut priced = entry();
        priced.toll_fraction = Decimal::new(5, 2); // 0.05 → 5% of cargo
        priced.toll_minimum = Decimal::new(1_000, 2);

        // 500 × 0.05 = 25.00 over the 10.00 minimum.
        let share = compute_expected(&priced, Decimal::new(50_000, 2), None);
        assert_eq!(share.toll, Decimal::new(2_500, 2));

        // 100 × 0.05 = 5.00, floored to the minimum.
        let floored = compute_expected(&priced, Decimal::new(10_000, 2), None);
        assert_eq!(floored.toll, Decimal::new(1_000, 2));
    }

    #[test]
    fn derived_toll_reads_large_values_as_fixed_amount() {
        let mut priced = entry();
        priced.toll_fraction = Decimal::new(4_200, 2); // 42.00 fixed

        let breakdown = compute_expected(&priced, Decimal::new(50_000, 2), None);
        assert_eq!(breakdown.toll, Decimal::new(4_200, 2));
    }

    #[test]
    fn exempt_cst_codes_raise_the_flag_without_touching_the_total() {
        let priced = entry();
        let exempt = compute_expected(&priced, Decimal::ZERO, Some("40"));
        let taxed = compute_expected(&priced, Decimal::ZERO, Some("00"));

        assert!(exempt.icms_exempt);
        assert!(!taxed.icms_exempt);
        assert_eq!(exempt.expected_total, taxed.expected_total);
    }

    #[test]
    fn full_composition_adds_every_percentage_term() {
        let mut priced = entry();
        priced.gris_pct = Decimal::new(15, 2);
        priced.gris_floor = Decimal::new(200, 2);
        priced.admin_fee = Decimal::new(440, 2);
        priced.tde_pct = Decimal::new(100, 2); // 1.00%
        priced.chemical_tax_pct = Decimal::new(50, 2); // 0.50%
        priced.value_freight_pct = Decimal::new(200, 2); // 2.00%

        let cargo = Decimal::new(50_000, 2); // 500.00
        let breakdown = compute_expected(&priced, cargo, None);

        assert_eq!(breakdown.value_freight, Decimal::new(1_000, 2)); // 500 × 2%
        assert_eq!(breakdown.gris, Decimal::new(200, 2)); // floored
        assert_eq!(breakdown.tde, Decimal::new(500, 2)); // 500 × 1%
        assert_eq!(breakdown.chemical_tax, Decimal::new(250, 2)); // 500 × 0.5%
        // 100 + 10 + 2 + 4.40 + 5 + 2.50
        assert_eq!(breakdown.expected_total, Decimal::new(12_390, 2));
    }
}
