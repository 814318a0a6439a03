//! Selection of the applicable weight bracket among the bands actually
//! priced for a (route, carrier) pair.

use crate::domain::bracket::{BracketId, WeightBracket};

/// Bracket ids imported from the historical 10 kg-band CSV tariff. When
/// one of these contains the weight it wins over any narrower band, in
/// the iteration order of the matching set. Imported rows are still
/// referenced by open freight contracts; do not remove ids from this list
/// without checking the price table for live entries against them.
pub const LEGACY_CSV_BRACKETS: &[i64] = &[30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 44];

#[derive(Clone, Debug, PartialEq)]
pub enum BracketSelection {
    Selected(WeightBracket),
    /// No candidate bracket carries a price for the pair at all.
    NothingPriced,
    /// Weight sits under the smallest priced band.
    BelowRange,
    /// Weight sits over the largest priced band.
    AboveRange,
    /// Weight falls in a gap between priced bands.
    NoFit,
}

/// Coerces the document's printed quantity into a weight in kilograms.
/// Comma decimals are accepted; non-numeric, non-finite and non-positive
/// values are rejected.
pub fn parse_weight(raw: &str) -> Option<f64> {
    let weight: f64 = raw.trim().replace(',', ".").parse().ok()?;
    (weight.is_finite() && weight > 0.0).then_some(weight)
}

/// Picks the applicable bracket among `candidates`, which must already be
/// restricted to bands priced for the (route, carrier) pair in question.
/// Candidates are de-duplicated and examined in ascending `max_weight`
/// order; among multiple matches a legacy CSV id wins first, then the
/// narrowest span.
pub fn select_bracket(weight: f64, candidates: Vec<WeightBracket>) -> BracketSelection {
    let mut candidates = dedupe_by_id(candidates);
    if candidates.is_empty() {
        return BracketSelection::NothingPriced;
    }
    candidates.sort_by(|a, b| a.max_weight.total_cmp(&b.max_weight));

    let matching: Vec<&WeightBracket> =
        candidates.iter().filter(|bracket| bracket.contains(weight)).collect();

    if let Some(selected) = pick_among_matching(&matching) {
        return BracketSelection::Selected(selected.clone());
    }

    let smallest_min = candidates
        .iter()
        .map(|bracket| bracket.min_weight)
        .fold(f64::INFINITY, f64::min);
    let largest_max = candidates
        .iter()
        .map(|bracket| bracket.max_weight)
        .fold(f64::NEG_INFINITY, f64::max);

    if weight < smallest_min {
        BracketSelection::BelowRange
    } else if weight > largest_max {
        BracketSelection::AboveRange
    } else {
        BracketSelection::NoFit
    }
}

fn pick_among_matching<'a>(matching: &[&'a WeightBracket]) -> Option<&'a WeightBracket> {
    if matching.is_empty() {
        return None;
    }

    if let Some(legacy) = matching
        .iter()
        .find(|bracket| LEGACY_CSV_BRACKETS.contains(&bracket.id.0))
    {
        return Some(legacy);
    }

    matching
        .iter()
        .min_by(|a, b| a.span().total_cmp(&b.span()))
        .copied()
}

fn dedupe_by_id(candidates: Vec<WeightBracket>) -> Vec<WeightBracket> {
    let mut seen: Vec<BracketId> = Vec::with_capacity(candidates.len());
    let mut unique = Vec::with_capacity(candidates.len());
    for bracket in candidates {
        if !seen.contains(&bracket.id) {
            seen.push(bracket.id);
            unique.push(bracket);
        }
    }
    unique
}
