pub mod config;
pub mod domain;
pub mod errors;
pub mod fiscal;
pub mod stores;
pub mod validation;

pub use domain::bracket::{BracketId, WeightBracket};
pub use domain::carrier::{Carrier, CarrierId};
pub use domain::document::FiscalDocument;
pub use domain::geo::{City, CityId, State, StateId};
pub use domain::price::{PriceEntry, PriceEntryId};
pub use domain::route::{Route, RouteId};
pub use errors::DomainError;
pub use fiscal::{decode_document, extract_document, parse_document, FiscalError};
pub use stores::{PricingStore, ReferenceStore, StoreError};
pub use validation::{
    FailureCategory, PriceValidator, ValidationFailure, ValidationReport, VerdictStatus,
};
