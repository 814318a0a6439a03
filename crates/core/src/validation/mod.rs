//! CT-e freight price validation engine.
//!
//! The engine is request-scoped and stateless: every call re-resolves
//! reference data through the store traits and returns a structured
//! [`ValidationReport`]. Business failures (unknown city, no priced
//! bracket, expired tariff) are reported inside the `Ok` value; `Err` is
//! reserved for reference-store outages.

pub mod bracket;
pub mod normalize;
pub mod resolve;
pub mod tariff;
pub mod verdict;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::domain::carrier::CarrierId;
use crate::domain::document::FiscalDocument;
use crate::domain::price::PriceEntry;
use crate::domain::route::RouteId;
use crate::fiscal::FiscalError;
use crate::stores::{PricingStore, ReferenceStore, StoreError};

pub use bracket::{parse_weight, select_bracket, BracketSelection, LEGACY_CSV_BRACKETS};
pub use normalize::{normalize, strip_prepositions};
pub use resolve::{resolve_carrier, resolve_city};
pub use tariff::{compute_expected, percent_fraction, TariffBreakdown};
pub use verdict::{compare, Verdict, VerdictStatus, PRICE_TOLERANCE};

/// How the HTTP boundary should classify a failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureCategory {
    /// The document itself is unusable: bad payload, wrong type, missing
    /// or invalid fields.
    Document,
    /// The document is fine but reference data has no answer for it.
    NotFound,
}

/// Every way a validation can fail short of a store outage.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationFailure {
    DocumentError(String),
    WrongDocumentType(String),
    UnrecognizedStructure,
    IncompleteData(Vec<&'static str>),
    InvalidWeight(String),
    OriginCityNotFound { name: String, uf: String },
    DestinationCityNotFound { name: String, uf: String },
    CarrierNotFound { legal_name: String },
    RouteNotFound { origin: String, destination: String },
    NothingPriced,
    WeightBelowRange(f64),
    WeightAboveRange(f64),
    WeightOutsideBrackets(f64),
    PriceNotFound,
}

impl ValidationFailure {
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::DocumentError(_)
            | Self::WrongDocumentType(_)
            | Self::UnrecognizedStructure
            | Self::IncompleteData(_)
            | Self::InvalidWeight(_) => FailureCategory::Document,
            _ => FailureCategory::NotFound,
        }
    }

    /// Operator-facing reason string, in the legacy response language.
    pub fn reason(&self) -> String {
        match self {
            Self::DocumentError(detail) => format!("Erro ao processar XML: {detail}"),
            Self::WrongDocumentType(kind) => {
                format!("Documento não é um CT-e (tipo: {kind})")
            }
            Self::UnrecognizedStructure => "Estrutura do CT-e não reconhecida".to_string(),
            Self::IncompleteData(missing) => {
                format!("Dados insuficientes para validação: {}", missing.join(", "))
            }
            Self::InvalidWeight(raw) => format!("Peso da carga inválido: `{raw}`"),
            Self::OriginCityNotFound { name, uf } => {
                format!("Cidade de origem não encontrada: {name}/{uf}")
            }
            Self::DestinationCityNotFound { name, uf } => {
                format!("Cidade de destino não encontrada: {name}/{uf}")
            }
            Self::CarrierNotFound { legal_name } => {
                format!("Transportadora não encontrada pela razão social: {legal_name}")
            }
            Self::RouteNotFound { origin, destination } => {
                format!("Rota não cadastrada: {origin} → {destination}")
            }
            Self::NothingPriced => {
                "Nenhuma faixa de peso com preço cadastrado para esta rota e transportadora"
                    .to_string()
            }
            Self::WeightBelowRange(weight) => {
                format!("Peso de {weight} kg abaixo da menor faixa disponível")
            }
            Self::WeightAboveRange(weight) => {
                format!("Peso de {weight} kg acima da maior faixa disponível")
            }
            Self::WeightOutsideBrackets(weight) => {
                format!("Peso de {weight} kg não se enquadra em nenhuma faixa disponível")
            }
            Self::PriceNotFound => "Preço não encontrado".to_string(),
        }
    }
}

impl From<FiscalError> for ValidationFailure {
    fn from(error: FiscalError) -> Self {
        match error {
            FiscalError::Decode(detail) | FiscalError::Malformed(detail) => {
                Self::DocumentError(detail)
            }
            FiscalError::NotCte { kind } => Self::WrongDocumentType(kind.to_string()),
            FiscalError::UnrecognizedStructure => Self::UnrecognizedStructure,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteSummary {
    #[serde(rename = "origem")]
    pub origin: String,
    #[serde(rename = "destino")]
    pub destination: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CarrierSummary {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BracketSummary {
    pub id: i64,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "pesoMinimo")]
    pub min_weight: f64,
    #[serde(rename = "pesoMaximo")]
    pub max_weight: f64,
}

/// Validation outcome in the legacy wire shape. `failure` never crosses
/// the wire; the HTTP layer reads it for status-code mapping.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationReport {
    #[serde(skip)]
    pub failure: Option<ValidationFailure>,
    #[serde(rename = "valido")]
    pub valid: bool,
    #[serde(rename = "motivo")]
    pub reason: String,
    #[serde(rename = "status", skip_serializing_if = "Option::is_none")]
    pub status: Option<VerdictStatus>,
    #[serde(rename = "precoTabela", skip_serializing_if = "Option::is_none")]
    pub table_price: Option<Decimal>,
    #[serde(rename = "precoBase", skip_serializing_if = "Option::is_none")]
    pub base_price: Option<Decimal>,
    #[serde(rename = "precoCTE", skip_serializing_if = "Option::is_none")]
    pub cte_price: Option<Decimal>,
    #[serde(rename = "diferenca", skip_serializing_if = "Option::is_none")]
    pub difference: Option<Decimal>,
    #[serde(rename = "percentualDiferenca", skip_serializing_if = "Option::is_none")]
    pub percent_difference: Option<Decimal>,
    #[serde(rename = "detalhesCalculo", skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<TariffBreakdown>,
    #[serde(rename = "rota", skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteSummary>,
    #[serde(rename = "transportadora", skip_serializing_if = "Option::is_none")]
    pub carrier: Option<CarrierSummary>,
    #[serde(rename = "faixaPeso", skip_serializing_if = "Option::is_none")]
    pub bracket: Option<BracketSummary>,
}

impl ValidationReport {
    pub fn rejected(failure: ValidationFailure) -> Self {
        let reason = failure.reason();
        Self {
            failure: Some(failure),
            valid: false,
            reason,
            status: None,
            table_price: None,
            base_price: None,
            cte_price: None,
            difference: None,
            percent_difference: None,
            breakdown: None,
            route: None,
            carrier: None,
            bracket: None,
        }
    }
}

/// The price validation engine. Construct once over the stores and share;
/// each call is independent.
pub struct PriceValidator {
    reference: Arc<dyn ReferenceStore>,
    pricing: Arc<dyn PricingStore>,
}

impl PriceValidator {
    pub fn new(reference: Arc<dyn ReferenceStore>, pricing: Arc<dyn PricingStore>) -> Self {
        Self { reference, pricing }
    }

    /// Validates against the price table as of today.
    pub async fn validate(
        &self,
        document: &FiscalDocument,
    ) -> Result<ValidationReport, StoreError> {
        self.validate_on(document, Utc::now().date_naive()).await
    }

    /// Validation with an explicit reference date for the tariff window.
    pub async fn validate_on(
        &self,
        document: &FiscalDocument,
        today: NaiveDate,
    ) -> Result<ValidationReport, StoreError> {
        let inputs = match gather_inputs(document) {
            Ok(inputs) => inputs,
            Err(failure) => return Ok(ValidationReport::rejected(failure)),
        };

        let Some(origin) =
            resolve_city(self.reference.as_ref(), &inputs.origin_name, &inputs.origin_uf).await?
        else {
            return Ok(ValidationReport::rejected(ValidationFailure::OriginCityNotFound {
                name: inputs.origin_name,
                uf: inputs.origin_uf,
            }));
        };

        let Some(destination) = resolve_city(
            self.reference.as_ref(),
            &inputs.destination_name,
            &inputs.destination_uf,
        )
        .await?
        else {
            return Ok(ValidationReport::rejected(
                ValidationFailure::DestinationCityNotFound {
                    name: inputs.destination_name,
                    uf: inputs.destination_uf,
                },
            ));
        };

        let Some(carrier) =
            resolve_carrier(self.reference.as_ref(), &inputs.carrier_name).await?
        else {
            return Ok(ValidationReport::rejected(ValidationFailure::CarrierNotFound {
                legal_name: inputs.carrier_name,
            }));
        };

        let Some(route) = self.reference.route_between(origin.id, destination.id).await? else {
            return Ok(ValidationReport::rejected(ValidationFailure::RouteNotFound {
                origin: format!("{}/{}", origin.name, inputs.origin_uf.to_uppercase()),
                destination: format!(
                    "{}/{}",
                    destination.name,
                    inputs.destination_uf.to_uppercase()
                ),
            }));
        };

        let entries = self.pricing.active_entries_for_pair(route.id, carrier.id).await?;

        let mut candidates = Vec::new();
        let mut seen = Vec::new();
        for entry in &entries {
            if seen.contains(&entry.bracket_id) {
                continue;
            }
            seen.push(entry.bracket_id);
            if let Some(bracket) = self.pricing.bracket_by_id(entry.bracket_id).await? {
                if bracket.active {
                    candidates.push(bracket);
                }
            }
        }

        let Some(weight) = parse_weight(&inputs.raw_weight) else {
            return Ok(ValidationReport::rejected(ValidationFailure::InvalidWeight(
                inputs.raw_weight,
            )));
        };

        let selected = match select_bracket(weight, candidates) {
            BracketSelection::Selected(bracket) => bracket,
            BracketSelection::NothingPriced => {
                return Ok(ValidationReport::rejected(ValidationFailure::NothingPriced));
            }
            BracketSelection::BelowRange => {
                return Ok(ValidationReport::rejected(ValidationFailure::WeightBelowRange(
                    weight,
                )));
            }
            BracketSelection::AboveRange => {
                return Ok(ValidationReport::rejected(ValidationFailure::WeightAboveRange(
                    weight,
                )));
            }
            BracketSelection::NoFit => {
                return Ok(ValidationReport::rejected(
                    ValidationFailure::WeightOutsideBrackets(weight),
                ));
            }
        };

        let Some(entry) = entries
            .iter()
            .find(|entry| entry.bracket_id == selected.id && entry.is_applicable_on(today))
        else {
            self.emit_price_diagnostics(&entries, route.id, carrier.id, selected.id.0, today)
                .await?;
            return Ok(ValidationReport::rejected(ValidationFailure::PriceNotFound));
        };

        let cargo_value = document.cargo.declared_value.unwrap_or(Decimal::ZERO);
        let breakdown =
            compute_expected(entry, cargo_value, document.financial.icms.cst.as_deref());
        let verdict = compare(breakdown.expected_total, inputs.charged_value);

        Ok(ValidationReport {
            failure: None,
            valid: true,
            reason: verdict.reason(),
            status: Some(verdict.status),
            table_price: Some(breakdown.expected_total),
            base_price: Some(entry.base_price),
            cte_price: Some(inputs.charged_value),
            difference: Some(verdict.difference),
            percent_difference: Some(verdict.percent_difference),
            breakdown: Some(breakdown),
            route: Some(RouteSummary {
                origin: format!("{}/{}", origin.name, inputs.origin_uf.to_uppercase()),
                destination: format!(
                    "{}/{}",
                    destination.name,
                    inputs.destination_uf.to_uppercase()
                ),
            }),
            carrier: Some(CarrierSummary { id: carrier.id.0, name: carrier.legal_name }),
            bracket: Some(BracketSummary {
                id: selected.id.0,
                description: selected.description,
                min_weight: selected.min_weight,
                max_weight: selected.max_weight,
            }),
        })
    }

    /// Bracket search without a (route, carrier) pair: every active band
    /// is a candidate. Legacy callers only; the validation path always
    /// has a pair.
    pub async fn select_bracket_global(
        &self,
        weight: f64,
    ) -> Result<BracketSelection, StoreError> {
        let candidates = self.pricing.active_brackets().await?;
        Ok(select_bracket(weight, candidates))
    }

    /// Structured diagnostics for operators when a bracket resolved but no
    /// tariff cell is valid today.
    async fn emit_price_diagnostics(
        &self,
        pair_entries: &[PriceEntry],
        route_id: RouteId,
        carrier_id: CarrierId,
        bracket_id: i64,
        today: NaiveDate,
    ) -> Result<(), StoreError> {
        let route_entries = self.pricing.entries_for_route(route_id).await?;

        let same_bracket_other_carrier = route_entries
            .iter()
            .filter(|entry| entry.bracket_id.0 == bracket_id && entry.carrier_id != carrier_id)
            .count();
        let same_carrier_other_bracket =
            pair_entries.iter().filter(|entry| entry.bracket_id.0 != bracket_id).count();
        let out_of_window = pair_entries
            .iter()
            .filter(|entry| entry.bracket_id.0 == bracket_id && !entry.is_applicable_on(today))
            .count();

        debug!(
            event_name = "validation.price_not_found",
            route_id = route_id.0,
            carrier_id = carrier_id.0,
            bracket_id,
            reference_date = %today,
            same_bracket_other_carrier,
            same_carrier_other_bracket,
            out_of_window,
            route_entries_total = route_entries.len(),
            "no tariff cell valid for the resolved route/carrier/bracket"
        );

        Ok(())
    }
}

struct ValidationInputs {
    origin_name: String,
    origin_uf: String,
    destination_name: String,
    destination_uf: String,
    carrier_name: String,
    raw_weight: String,
    charged_value: Decimal,
}

fn gather_inputs(document: &FiscalDocument) -> Result<ValidationInputs, ValidationFailure> {
    let mut missing = Vec::new();

    let origin_name = non_empty(document.sender.address.city_name.as_deref());
    let origin_uf = non_empty(document.sender.address.uf.as_deref());
    if origin_name.is_none() || origin_uf.is_none() {
        missing.push("cidade de origem");
    }

    let destination_name = non_empty(document.receiver.address.city_name.as_deref());
    let destination_uf = non_empty(document.receiver.address.uf.as_deref());
    if destination_name.is_none() || destination_uf.is_none() {
        missing.push("cidade de destino");
    }

    let carrier_name = non_empty(document.issuer.name.as_deref());
    if carrier_name.is_none() {
        missing.push("razão social da transportadora");
    }

    let raw_weight = non_empty(document.cargo.quantity.as_deref());
    if raw_weight.is_none() {
        missing.push("peso da carga");
    }

    let charged_value = document.financial.service_value;
    if charged_value.is_none() {
        missing.push("valor da prestação");
    }

    if !missing.is_empty() {
        return Err(ValidationFailure::IncompleteData(missing));
    }

    Ok(ValidationInputs {
        origin_name: origin_name.unwrap_or_default(),
        origin_uf: origin_uf.unwrap_or_default(),
        destination_name: destination_name.unwrap_or_default(),
        destination_uf: destination_uf.unwrap_or_default(),
        carrier_name: carrier_name.unwrap_or_default(),
        raw_weight: raw_weight.unwrap_or_default(),
        charged_value: charged_value.unwrap_or_default(),
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_owned)
}
