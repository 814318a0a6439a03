//! Validation endpoint: accepts a CT-e blob (inline or by ERP serial),
//! runs the fiscal pipeline and the price validation engine, and answers
//! in the legacy wire shape.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use fretado_core::fiscal;
use fretado_core::validation::{
    FailureCategory, PriceValidator, ValidationFailure, ValidationReport,
};

use crate::erp::{ErpClient, ErpError};

#[derive(Clone)]
pub struct ApiState {
    pub validator: Arc<PriceValidator>,
    pub erp: Option<Arc<ErpClient>>,
}

/// Either the blob itself or an ERP serial to fetch it by.
#[derive(Debug, Deserialize)]
pub struct ValidationRequest {
    pub xml: Option<String>,
    pub serial: Option<String>,
}

pub fn router(state: ApiState) -> Router {
    Router::new().route("/api/v1/validations", post(validate)).with_state(state)
}

pub async fn validate(
    State(state): State<ApiState>,
    Json(request): Json<ValidationRequest>,
) -> (StatusCode, Json<Value>) {
    let correlation_id = Uuid::new_v4().to_string();

    let blob = match obtain_blob(&state, &request, &correlation_id).await {
        Ok(blob) => blob,
        Err(response) => return response,
    };

    // Archived blobs are base64 + deflate; accept already-inflated XML
    // text as well so operators can replay documents by hand.
    let decoded = if blob.trim_start().starts_with('<') {
        fiscal::parse_document(blob.trim())
    } else {
        fiscal::decode_document(&blob)
    };

    let document = match decoded.and_then(|decoded| fiscal::extract_document(&decoded)) {
        Ok(document) => document,
        Err(fiscal_error) => {
            let failure = ValidationFailure::from(fiscal_error);
            info!(
                event_name = "api.validation.document_rejected",
                correlation_id = %correlation_id,
                reason = %failure.reason(),
                "document rejected before price validation"
            );
            return respond(ValidationReport::rejected(failure), &correlation_id);
        }
    };

    match state.validator.validate(&document).await {
        Ok(report) => respond(report, &correlation_id),
        Err(store_error) => {
            error!(
                event_name = "api.validation.store_failure",
                correlation_id = %correlation_id,
                error = %store_error,
                "reference store failed during validation"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "valido": false,
                    "motivo": format!("Erro ao validar: {store_error}"),
                })),
            )
        }
    }
}

async fn obtain_blob(
    state: &ApiState,
    request: &ValidationRequest,
    correlation_id: &str,
) -> Result<String, (StatusCode, Json<Value>)> {
    if let Some(xml) = request.xml.as_deref().map(str::trim).filter(|xml| !xml.is_empty()) {
        return Ok(xml.to_string());
    }

    let Some(serial) = request.serial.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "valido": false,
                "motivo": "Informe `xml` (blob base64) ou `serial` do documento",
            })),
        ));
    };

    let Some(erp) = state.erp.as_ref() else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "valido": false,
                "motivo": "Busca por serial indisponível: integração com o ERP desabilitada",
            })),
        ));
    };

    match erp.fetch_document(serial).await {
        Ok(document) => Ok(document.xml_file),
        Err(ErpError::NotFound(serial)) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({
                "valido": false,
                "motivo": format!("Documento `{serial}` não encontrado no ERP"),
            })),
        )),
        Err(erp_error) => {
            warn!(
                event_name = "api.validation.erp_failure",
                correlation_id = %correlation_id,
                error = %erp_error,
                "erp document fetch failed"
            );
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "valido": false,
                    "motivo": format!("Falha ao buscar documento no ERP: {erp_error}"),
                })),
            ))
        }
    }
}

fn respond(report: ValidationReport, correlation_id: &str) -> (StatusCode, Json<Value>) {
    let status_code = match &report.failure {
        None => StatusCode::OK,
        Some(failure) => match failure.category() {
            FailureCategory::Document => StatusCode::BAD_REQUEST,
            FailureCategory::NotFound => StatusCode::NOT_FOUND,
        },
    };

    info!(
        event_name = "api.validation.completed",
        correlation_id = %correlation_id,
        valid = report.valid,
        status_code = status_code.as_u16(),
        reason = %report.reason,
        "validation finished"
    );

    let payload = serde_json::to_value(&report).unwrap_or_else(|serialize_error| {
        json!({
            "valido": false,
            "motivo": format!("Erro ao serializar resposta: {serialize_error}"),
        })
    });

    (status_code, Json(payload))
}
