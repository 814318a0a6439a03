use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Address block of a CT-e party, as printed on the document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city_name: Option<String>,
    pub uf: Option<String>,
    pub zip: Option<String>,
}

/// One of the CT-e party blocks (issuer, sender, receiver, expeditor,
/// actual recipient).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub tax_id: Option<String>,
    pub name: Option<String>,
    pub address: Address,
}

/// The contracting party of the freight service, resolved through the
/// `toma` type-code indirection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    /// 0=sender, 1=expeditor, 2=recipient, 3=receiver.
    pub kind: Option<u8>,
    pub tax_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identification {
    pub number: Option<String>,
    pub series: Option<String>,
    pub access_key: Option<String>,
    pub emitted_at: Option<DateTime<FixedOffset>>,
    pub model: Option<String>,
    pub emission_type: Option<String>,
    /// "1" = production, "2" = test.
    pub environment: Option<String>,
}

/// Named add-on line of the service value composition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceComponent {
    pub name: String,
    pub value: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Icms {
    pub cst: Option<String>,
    pub base: Option<Decimal>,
    pub rate: Option<Decimal>,
    pub value: Option<Decimal>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Financial {
    /// Total service value (vTPrest), the amount charged on the CT-e.
    pub service_value: Option<Decimal>,
    /// Amount to receive (vRec).
    pub total_value: Option<Decimal>,
    pub components: Vec<ServiceComponent>,
    pub icms: Icms,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cargo {
    /// Declared quantity as printed; the validation engine coerces this to
    /// a weight in kilograms.
    pub quantity: Option<String>,
    pub unit_code: Option<String>,
    pub measure_kind: Option<String>,
    pub declared_value: Option<Decimal>,
    /// Value registered for insurance purposes (averbado).
    pub insured_value: Option<Decimal>,
}

/// Flat, typed view of a decoded CT-e. Transient: extracted per request,
/// never persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FiscalDocument {
    pub identification: Identification,
    pub issuer: Party,
    pub sender: Party,
    pub receiver: Party,
    pub expeditor: Option<Party>,
    pub recipient: Option<Party>,
    pub payer: Payer,
    pub financial: Financial,
    pub cargo: Cargo,
    pub complementary_info: Option<String>,
}
