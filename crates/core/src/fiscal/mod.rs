pub mod decode;
pub mod extract;
pub mod xml;

use std::fmt;

use thiserror::Error;

pub use decode::{classify, decode_document, parse_document, DecodedDocument, DocumentKind};
pub use extract::extract_document;
pub use xml::{XmlNode, XmlParseError};

/// Failures of the fiscal document pipeline.
///
/// The variants are deliberately distinct: callers map "the blob is
/// garbage", "this is an NF-e, not a freight manifest" and "it claims to
/// be a CT-e but the layout is unknown" to different operator-facing
/// responses.
#[derive(Debug, Error)]
pub enum FiscalError {
    /// Base64, inflate or UTF-8 failure on the raw blob.
    #[error("erro ao processar XML: {0}")]
    Decode(String),
    /// The XML itself does not parse, or a field has an impossible value.
    #[error("erro ao processar XML: {0}")]
    Malformed(String),
    /// The document is recognizably something other than a CT-e.
    #[error("documento não é um CT-e ({kind})")]
    NotCte { kind: DocumentKind },
    /// CT-e markers are present but no known layout holds the infCte node.
    #[error("estrutura do CT-e não reconhecida")]
    UnrecognizedStructure,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Cte => write!(f, "CT-e"),
            DocumentKind::Nfe => write!(f, "NF-e"),
            DocumentKind::Unknown => write!(f, "desconhecido"),
        }
    }
}
