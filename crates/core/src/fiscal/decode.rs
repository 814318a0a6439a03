//! Decoding of the raw document blob as stored by the ERP: a base64
//! string wrapping raw-deflate-compressed XML bytes.

use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::DeflateDecoder;

use super::xml::XmlNode;
use super::FiscalError;

/// Decompressed blobs are capped to keep a hostile payload from ballooning
/// in memory; real manifests sit well under 1 MiB.
const MAX_INFLATED_BYTES: u64 = 16 * 1024 * 1024;

const NFE_MARKERS: &[&str] =
    &["<NFe", "<nfeProc", "<resNFe", "http://www.portalfiscal.inf.br/nfe"];

const CTE_MARKERS: &[&str] = &["<CTe", "<cteProc", "http://www.portalfiscal.inf.br/cte"];

/// Ordered layout probes for the `infCte` node. Emitters disagree on
/// whether the manifest arrives wrapped in a `cteProc` envelope or as a
/// bare `CTe` root; the tree parser array-wraps every element, so the
/// wrapped and unwrapped `CTe` spellings share one probe. The order is
/// fixed and the first hit wins.
const INF_CTE_PROBES: &[&[&str]] = &[&["cteProc", "CTe", "infCte"], &["CTe", "infCte"]];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    Cte,
    Nfe,
    Unknown,
}

/// A decoded, classified, parsed fiscal document blob.
#[derive(Clone, Debug)]
pub struct DecodedDocument {
    pub xml: String,
    pub root: XmlNode,
}

impl DecodedDocument {
    /// Locates the `infCte` payload node through the fixed probe table.
    pub fn inf_cte(&self) -> Option<&XmlNode> {
        INF_CTE_PROBES.iter().find_map(|probe| self.root.path(probe))
    }

    /// The element carrying the `Id` access-key attribute, when present.
    pub fn inf_cte_id(&self) -> Option<&str> {
        self.inf_cte().and_then(|node| node.attr("Id"))
    }
}

/// Classifies decoded XML text by marker substrings. NF-e markers win:
/// an NF-e embedded in an unknown envelope must never pass as a CT-e.
pub fn classify(xml: &str) -> DocumentKind {
    if NFE_MARKERS.iter().any(|marker| xml.contains(marker)) {
        return DocumentKind::Nfe;
    }
    if CTE_MARKERS.iter().any(|marker| xml.contains(marker)) {
        return DocumentKind::Cte;
    }
    DocumentKind::Unknown
}

/// Full decode path: base64 → raw inflate → UTF-8 → classify → parse.
pub fn decode_document(encoded: &str) -> Result<DecodedDocument, FiscalError> {
    let compressed = STANDARD
        .decode(encoded.trim().as_bytes())
        .map_err(|error| FiscalError::Decode(format!("base64 inválido: {error}")))?;

    let mut inflater = DeflateDecoder::new(&compressed[..]).take(MAX_INFLATED_BYTES);
    let mut bytes = Vec::new();
    inflater
        .read_to_end(&mut bytes)
        .map_err(|error| FiscalError::Decode(format!("falha ao descompactar: {error}")))?;

    let xml = String::from_utf8(bytes)
        .map_err(|error| FiscalError::Decode(format!("conteúdo não é UTF-8: {error}")))?;

    parse_document(&xml)
}

/// Parse path for blobs that are already plain XML text.
pub fn parse_document(xml: &str) -> Result<DecodedDocument, FiscalError> {
    match classify(xml) {
        DocumentKind::Cte => {}
        kind => return Err(FiscalError::NotCte { kind }),
    }

    let root = XmlNode::parse(xml).map_err(|error| FiscalError::Malformed(error.to_string()))?;

    let decoded = DecodedDocument { xml: xml.to_owned(), root };
    if decoded.inf_cte().is_none() {
        return Err(FiscalError::UnrecognizedStructure);
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;

    use crate::fiscal::FiscalError;

    use super::{classify, decode_document, parse_document, DocumentKind};

    const MINIMAL_CTE: &str = concat!(
        r#"<cteProc xmlns="http://www.portalfiscal.inf.br/cte" versao="3.00">"#,
        r#"<CTe><infCte Id="CTe35170612345678000195570010000000011000000010">"#,
        r#"<ide><nCT>1</nCT></ide>"#,
        r#"</infCte></CTe></cteProc>"#
    );

    fn deflated_base64(xml: &str) -> String {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(xml.as_bytes()).expect("compress");
        STANDARD.encode(encoder.finish().expect("finish"))
    }

    #[test]
    fn classifies_by_markers_with_nfe_priority() {
        assert_eq!(classify("<cteProc><CTe/></cteProc>"), DocumentKind::Cte);
        assert_eq!(classify("<nfeProc><NFe/></nfeProc>"), DocumentKind::Nfe);
        // A CT-e envelope smuggling NF-e content is still not a CT-e.
        assert_eq!(classify("<cteProc><NFe/></cteProc>"), DocumentKind::Nfe);
        assert_eq!(classify("<invoice/>"), DocumentKind::Unknown);
    }

    #[test]
    fn round_trips_a_compressed_blob() {
        let decoded = decode_document(&deflated_base64(MINIMAL_CTE)).expect("decode");
        assert!(decoded.inf_cte().is_some());
        assert_eq!(
            decoded.inf_cte_id(),
            Some("CTe35170612345678000195570010000000011000000010")
        );
    }

    #[test]
    fn invalid_base64_is_a_decode_error() {
        let error = decode_document("not//valid==base64!!").expect_err("must fail");
        assert!(matches!(error, FiscalError::Decode(_)));
    }

    #[test]
    fn uncompressed_garbage_is_a_decode_error() {
        let error = decode_document(&STANDARD.encode("plain text, not deflate"))
            .expect_err("must fail");
        assert!(matches!(error, FiscalError::Decode(_)));
    }

    #[test]
    fn nfe_payload_is_rejected_as_wrong_kind() {
        let nfe = r#"<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe"><NFe/></nfeProc>"#;
        let error = decode_document(&deflated_base64(nfe)).expect_err("must fail");
        assert!(matches!(error, FiscalError::NotCte { kind: DocumentKind::Nfe }));
    }

    #[test]
    fn unknown_root_is_rejected_as_unrecognized_kind() {
        let error = parse_document("<invoice><total>10</total></invoice>").expect_err("must fail");
        assert!(matches!(error, FiscalError::NotCte { kind: DocumentKind::Unknown }));
    }

    #[test]
    fn cte_markers_without_inf_cte_are_an_unknown_structure() {
        let error = parse_document("<CTe><somethingElse/></CTe>").expect_err("must fail");
        assert!(matches!(error, FiscalError::UnrecognizedStructure));
    }

    #[test]
    fn bare_cte_root_layout_is_probed() {
        let xml = r#"<CTe xmlns="http://www.portalfiscal.inf.br/cte"><infCte Id="CTe1"><ide/></infCte></CTe>"#;
        let decoded = parse_document(xml).expect("parse");
        assert_eq!(decoded.inf_cte_id(), Some("CTe1"));
    }

    #[test]
    fn malformed_cte_xml_is_distinct_from_wrong_kind() {
        let error = parse_document("<CTe><infCte></CTe>").expect_err("must fail");
        assert!(matches!(error, FiscalError::Malformed(_)));
    }
}
