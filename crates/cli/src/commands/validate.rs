use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::commands::CommandResult;
use fretado_core::config::{AppConfig, LoadOptions};
use fretado_core::fiscal;
use fretado_core::validation::{PriceValidator, VerdictStatus};
use fretado_db::{connect_with_settings, SqlPricingStore, SqlReferenceStore};

/// Validates one document file against the configured database. The file
/// may hold the base64 blob as archived by the ERP or the plain XML text.
pub fn run(file: &Path, date: Option<&str>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "validate",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let reference_date = match date {
        None => Utc::now().date_naive(),
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(parsed) => parsed,
            Err(error) => {
                return CommandResult::failure(
                    "validate",
                    "invalid_date",
                    format!("could not parse --date `{raw}`: {error}"),
                    2,
                );
            }
        },
    };

    let contents = match fs::read_to_string(file) {
        Ok(contents) => contents,
        Err(error) => {
            return CommandResult::failure(
                "validate",
                "file_read",
                format!("could not read `{}`: {error}", file.display()),
                2,
            );
        }
    };

    let decoded = if contents.trim_start().starts_with('<') {
        fiscal::parse_document(contents.trim())
    } else {
        fiscal::decode_document(&contents)
    };

    let document = match decoded.and_then(|decoded| fiscal::extract_document(&decoded)) {
        Ok(document) => document,
        Err(error) => {
            return CommandResult::failure("validate", "document_rejected", error.to_string(), 1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "validate",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let report = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let validator = PriceValidator::new(
            Arc::new(SqlReferenceStore::new(pool.clone())),
            Arc::new(SqlPricingStore::new(pool.clone())),
        );

        let report = validator
            .validate_on(&document, reference_date)
            .await
            .map_err(|error| ("store_failure", error.to_string(), 4u8))?;

        pool.close().await;
        Ok::<_, (&'static str, String, u8)>(report)
    });

    match report {
        Ok(report) => {
            // Exit zero only for a conforming charge; resolution failures
            // and over/undercharges both demand operator attention.
            let conforming = report.valid && report.status == Some(VerdictStatus::Ok);
            let exit_code = u8::from(!conforming);
            let output = serde_json::to_string_pretty(&report)
                .unwrap_or_else(|error| format!("{{\"valido\":false,\"motivo\":\"{error}\"}}"));
            CommandResult { exit_code, output }
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("validate", error_class, message, exit_code)
        }
    }
}
