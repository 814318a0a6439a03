//! Extraction of a flat [`FiscalDocument`] from the parsed CT-e tree.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;

use crate::domain::document::{
    Address, Cargo, Financial, FiscalDocument, Icms, Identification, Party, Payer,
    ServiceComponent,
};

use super::decode::DecodedDocument;
use super::xml::XmlNode;
use super::FiscalError;

/// ICMS group element names, in the order they are probed. Exactly one is
/// present per document; each carries the CST under a slightly different
/// set of siblings.
const ICMS_GROUPS: &[&str] =
    &["ICMS00", "ICMS20", "ICMS45", "ICMS60", "ICMS90", "ICMSOutraUF", "ICMSSN"];

/// Extracts the typed document record from a decoded CT-e.
pub fn extract_document(decoded: &DecodedDocument) -> Result<FiscalDocument, FiscalError> {
    let inf_cte = decoded.inf_cte().ok_or(FiscalError::UnrecognizedStructure)?;

    let identification = extract_identification(inf_cte);
    let issuer = extract_party(inf_cte.first("emit"), "enderEmit");
    let sender = extract_party(inf_cte.first("rem"), "enderReme");
    let receiver = extract_party(inf_cte.first("dest"), "enderDest");
    let expeditor = inf_cte.first("exped").map(|node| extract_party(Some(node), "enderExped"));
    let recipient = inf_cte.first("receb").map(|node| extract_party(Some(node), "enderReceb"));

    let payer = extract_payer(
        inf_cte,
        &sender,
        expeditor.as_ref(),
        recipient.as_ref(),
        &receiver,
    );

    let financial = extract_financial(inf_cte)?;
    let cargo = extract_cargo(inf_cte)?;

    let complementary_info = inf_cte
        .first("compl")
        .and_then(|compl| compl.child_text("xObs"))
        .map(str::to_owned);

    Ok(FiscalDocument {
        identification,
        issuer,
        sender,
        receiver,
        expeditor,
        recipient,
        payer,
        financial,
        cargo,
        complementary_info,
    })
}

fn extract_identification(inf_cte: &XmlNode) -> Identification {
    let ide = inf_cte.first("ide");

    let access_key = inf_cte
        .attr("Id")
        .map(|id| id.strip_prefix("CTe").unwrap_or(id).to_owned());

    let emitted_at = ide
        .and_then(|node| node.child_text("dhEmi"))
        .and_then(parse_datetime);

    Identification {
        number: text_of(ide, "nCT"),
        series: text_of(ide, "serie"),
        access_key,
        emitted_at,
        model: text_of(ide, "mod"),
        emission_type: text_of(ide, "tpEmis"),
        environment: text_of(ide, "tpAmb"),
    }
}

fn extract_party(node: Option<&XmlNode>, address_element: &str) -> Party {
    let Some(node) = node else {
        return Party::default();
    };

    let address = node.first(address_element).map(extract_address).unwrap_or_default();

    Party { tax_id: tax_id_of(node), name: node.child_text("xNome").map(str::to_owned), address }
}

fn extract_address(node: &XmlNode) -> Address {
    Address {
        street: node.child_text("xLgr").map(str::to_owned),
        number: node.child_text("nro").map(str::to_owned),
        complement: node.child_text("xCpl").map(str::to_owned),
        neighborhood: node.child_text("xBairro").map(str::to_owned),
        city_name: node.child_text("xMun").map(str::to_owned),
        uf: node.child_text("UF").map(str::to_owned),
        zip: node.child_text("CEP").map(str::to_owned),
    }
}

/// Resolves the freight payer. The `toma4` block names the payer outright;
/// the `toma3` block only carries a type code, in which case the code
/// selects which party block supplies the tax id and name. The code is
/// also honored for a `toma4` block that arrives without a tax id.
fn extract_payer(
    inf_cte: &XmlNode,
    sender: &Party,
    expeditor: Option<&Party>,
    recipient: Option<&Party>,
    receiver: &Party,
) -> Payer {
    let ide = inf_cte.first("ide");
    let toma4 = ide.and_then(|node| node.first("toma4"));
    let toma3 = ide.and_then(|node| node.first("toma3"));

    let payer_block = toma4.or(toma3);
    let kind = payer_block
        .and_then(|node| node.child_text("toma"))
        .and_then(|code| code.trim().parse::<u8>().ok());

    if let Some(block) = toma4 {
        if let Some(tax_id) = tax_id_of(block) {
            return Payer {
                kind,
                tax_id: Some(tax_id),
                name: block.child_text("xNome").map(str::to_owned),
            };
        }
    }

    let selected = match kind {
        Some(0) => Some(sender),
        Some(1) => expeditor,
        Some(2) => recipient,
        Some(3) => Some(receiver),
        _ => None,
    };

    match selected {
        Some(party) => Payer { kind, tax_id: party.tax_id.clone(), name: party.name.clone() },
        None => Payer { kind, tax_id: None, name: None },
    }
}

fn extract_financial(inf_cte: &XmlNode) -> Result<Financial, FiscalError> {
    let v_prest = inf_cte.first("vPrest");

    let components = v_prest
        .map(|node| node.list("Comp"))
        .unwrap_or(&[])
        .iter()
        .filter_map(|comp| {
            let name = comp.child_text("xNome")?.to_owned();
            let value = comp.child_text("vComp");
            Some((name, value.map(str::to_owned)))
        })
        .map(|(name, value)| {
            let value = match value {
                Some(raw) => parse_decimal(&raw)?,
                None => Decimal::ZERO,
            };
            Ok(ServiceComponent { name, value })
        })
        .collect::<Result<Vec<_>, FiscalError>>()?;

    let icms_parent = inf_cte.path(&["imp", "ICMS"]);
    let icms_group =
        icms_parent.and_then(|node| ICMS_GROUPS.iter().find_map(|group| node.first(group)));

    let icms = match icms_group {
        Some(group) => Icms {
            cst: group.child_text("CST").map(str::to_owned),
            base: decimal_of(Some(group), "vBC")?,
            rate: decimal_of(Some(group), "pICMS")?,
            value: decimal_of(Some(group), "vICMS")?,
        },
        None => Icms::default(),
    };

    Ok(Financial {
        service_value: decimal_of(v_prest, "vTPrest")?,
        total_value: decimal_of(v_prest, "vRec")?,
        components,
        icms,
    })
}

fn extract_cargo(inf_cte: &XmlNode) -> Result<Cargo, FiscalError> {
    let inf_carga = inf_cte.path(&["infCTeNorm", "infCarga"]);

    // Several quantity lines can coexist (volumes, cubage, gross weight);
    // the gross-weight line wins when present.
    let quantity_lines = inf_carga.map(|node| node.list("infQ")).unwrap_or(&[]);
    let weight_line = quantity_lines
        .iter()
        .find(|line| {
            line.child_text("tpMed")
                .map(|kind| kind.to_uppercase().contains("PESO"))
                .unwrap_or(false)
        })
        .or_else(|| quantity_lines.first());

    Ok(Cargo {
        quantity: weight_line.and_then(|line| line.child_text("qCarga")).map(str::to_owned),
        unit_code: weight_line.and_then(|line| line.child_text("cUnid")).map(str::to_owned),
        measure_kind: weight_line.and_then(|line| line.child_text("tpMed")).map(str::to_owned),
        declared_value: decimal_of(inf_carga, "vCarga")?,
        insured_value: decimal_of(inf_carga, "vCargaAverb")?,
    })
}

fn text_of(node: Option<&XmlNode>, name: &str) -> Option<String> {
    node.and_then(|node| node.child_text(name)).map(str::to_owned)
}

fn tax_id_of(node: &XmlNode) -> Option<String> {
    node.child_text("CNPJ").or_else(|| node.child_text("CPF")).map(str::to_owned)
}

fn decimal_of(node: Option<&XmlNode>, name: &str) -> Result<Option<Decimal>, FiscalError> {
    match node.and_then(|node| node.child_text(name)) {
        Some(raw) => parse_decimal(raw).map(Some),
        None => Ok(None),
    }
}

/// Parses numeric text accepting both the canonical dot notation and the
/// Brazilian "1.234,56" convention that some emitters leak into the XML.
pub fn parse_decimal(raw: &str) -> Result<Decimal, FiscalError> {
    let trimmed = raw.trim();
    let last_comma = trimmed.rfind(',');
    let last_dot = trimmed.rfind('.');

    let normalized = match (last_comma, last_dot) {
        // "1.234,56": dot is the thousands separator, comma the decimal.
        (Some(comma), Some(dot)) if comma > dot => {
            trimmed.replace('.', "").replace(',', ".")
        }
        // "1,234.56": comma is the thousands separator.
        (Some(_), Some(_)) => trimmed.replace(',', ""),
        // "1234,56": bare comma decimal.
        (Some(_), None) => trimmed.replace(',', "."),
        _ => trimmed.to_owned(),
    };

    normalized
        .parse::<Decimal>()
        .map_err(|error| FiscalError::Malformed(format!("valor numérico inválido `{raw}`: {error}")))
}

fn parse_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw.trim()).ok()
}
