use pw_common::{Secret, Yen};
use serde::{Deserialize, Serialize};

use crate::db_types::PaymentAuthorization;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentInstrument {
    pub card_number: Secret<String>,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub cvv: Secret<String>,
    pub cardholder_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationOutcome {
    pub authorized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization: Option<PaymentAuthorization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decline_reason: Option<String>,
}

impl AuthorizationOutcome {
    pub fn approved(authorization: PaymentAuthorization) -> Self {
        Self { authorized: true, authorization: Some(authorization), decline_reason: None }
    }

    pub fn declined<S: Into<String>>(reason: S) -> Self {
        Self { authorized: false, authorization: None, decline_reason: Some(reason.into()) }
    }
}
