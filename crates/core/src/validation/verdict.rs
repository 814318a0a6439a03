//! Tolerance comparison between the expected freight and the value
//! charged on the CT-e.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Absolute tolerance, in currency units, inside which the charge counts
/// as matching the table.
pub const PRICE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    /// Charge matches the table within tolerance.
    Ok,
    /// Charged above the table.
    Acima,
    /// Charged below the table.
    Abaixo,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub difference: Decimal,
    pub percent_difference: Decimal,
}

/// Compares the charged value against the expected total. Positive
/// difference means the carrier charged more than the table allows.
pub fn compare(expected_total: Decimal, charged: Decimal) -> Verdict {
    let difference = charged - expected_total;

    let percent_difference = if expected_total.is_zero() {
        Decimal::ZERO
    } else {
        difference / expected_total * Decimal::ONE_HUNDRED
    };

    let status = if difference > PRICE_TOLERANCE {
        VerdictStatus::Acima
    } else if difference < -PRICE_TOLERANCE {
        VerdictStatus::Abaixo
    } else {
        VerdictStatus::Ok
    };

    Verdict { status, difference, percent_difference }
}

impl Verdict {
    /// Operator-facing summary line for the verdict.
    pub fn reason(&self) -> String {
        match self.status {
            VerdictStatus::Ok => "Preço conforme a tabela".to_string(),
            VerdictStatus::Acima => {
                format!("Valor cobrado acima da tabela em R$ {:.2}", self.difference)
            }
            VerdictStatus::Abaixo => {
                format!("Valor cobrado abaixo da tabela em R$ {:.2}", -self.difference)
            }
        }
    }
}
