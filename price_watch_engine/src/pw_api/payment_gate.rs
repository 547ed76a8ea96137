//! Mock payment pre-authorization.
//!
//! There is no card network behind this gate. It checks that the instrument is structurally plausible, and, if so,
//! hands back opaque references that stand in for a real processor's hold.
use chrono::{DateTime, Datelike, Duration, Months, Utc};
use log::*;
use pw_common::Yen;

use crate::{
    db_types::PaymentAuthorization,
    traits::{AuthorizationOutcome, CollaboratorError, PaymentGateway, PaymentInstrument},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct MockPreAuthGateway;

fn opaque_ref(prefix: &str) -> String {
    format!("{prefix}_{:032x}", rand::random::<u128>())
}

impl MockPreAuthGateway {
    pub fn new() -> Self {
        Self
    }

    /// Returns the decline reason, if any.
    pub fn validate(instrument: &PaymentInstrument, amount: Yen, now: DateTime<Utc>) -> Result<(), String> {
        if !amount.is_positive() {
            return Err("hold amount must be positive".into());
        }
        let number: String = instrument.card_number.reveal().chars().filter(|c| !matches!(c, ' ' | '-')).collect();
        if !number.chars().all(|c| c.is_ascii_digit()) {
            return Err("card number may only contain digits".into());
        }
        if !(13..=19).contains(&number.len()) {
            return Err("card number must be 13 to 19 digits".into());
        }
        if !(1..=12).contains(&instrument.expiry_month) {
            return Err("expiry month must be between 1 and 12".into());
        }
        if (instrument.expiry_year, instrument.expiry_month) < (now.year(), now.month()) {
            return Err("card has expired".into());
        }
        let cvv = instrument.cvv.reveal();
        if cvv.len() != 3 || !cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err("CVV must be exactly 3 digits".into());
        }
        if instrument.cardholder_name.trim().is_empty() {
            return Err("cardholder name is required".into());
        }
        Ok(())
    }

    pub fn authorize_at(&self, instrument: &PaymentInstrument, amount: Yen, now: DateTime<Utc>) -> AuthorizationOutcome {
        match Self::validate(instrument, amount, now) {
            Ok(()) => {
                let expires_at = now.checked_add_months(Months::new(1)).unwrap_or(now + Duration::days(30));
                let authorization = PaymentAuthorization {
                    payment_method_ref: opaque_ref("pm"),
                    auth_token_ref: opaque_ref("auth"),
                    authorized_amount: amount,
                    expires_at,
                };
                debug!("💳️ Pre-authorized {amount} until {expires_at}");
                AuthorizationOutcome::approved(authorization)
            },
            Err(reason) => {
                info!("💳️ Pre-authorization for {amount} declined: {reason}");
                AuthorizationOutcome::declined(reason)
            },
        }
    }
}

impl PaymentGateway for MockPreAuthGateway {
    async fn authorize(
        &self,
        instrument: &PaymentInstrument,
        amount: Yen,
    ) -> Result<AuthorizationOutcome, CollaboratorError> {
        Ok(self.authorize_at(instrument, amount, Utc::now()))
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;
    use pw_common::Secret;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap()
    }

    fn card() -> PaymentInstrument {
        PaymentInstrument {
            card_number: Secret::new("4111 1111 1111 1111".to_string()),
            expiry_month: 12,
            expiry_year: 2028,
            cvv: Secret::new("123".to_string()),
            cardholder_name: "HANAKO YAMADA".into(),
        }
    }

    #[test]
    fn valid_card_is_authorized_for_one_month() {
        let outcome = MockPreAuthGateway::new().authorize_at(&card(), Yen::from(10_000), now());
        assert!(outcome.authorized);
        let auth = outcome.authorization.unwrap();
        assert!(auth.payment_method_ref.starts_with("pm_"));
        assert!(auth.auth_token_ref.starts_with("auth_"));
        assert_eq!(auth.authorized_amount, Yen::from(10_000));
        assert_eq!(auth.expires_at, Utc.with_ymd_and_hms(2026, 11, 14, 9, 0, 0).unwrap());
    }

    #[test]
    fn references_are_unique() {
        let gate = MockPreAuthGateway::new();
        let a = gate.authorize_at(&card(), Yen::from(100), now()).authorization.unwrap();
        let b = gate.authorize_at(&card(), Yen::from(100), now()).authorization.unwrap();
        assert_ne!(a.auth_token_ref, b.auth_token_ref);
    }

    #[test]
    fn structural_problems_are_declines() {
        let gate = MockPreAuthGateway::new();
        let mut short = card();
        short.card_number = Secret::new("411111111111".to_string());
        let mut bad_cvv = card();
        bad_cvv.cvv = Secret::new("12".to_string());
        let mut expired = card();
        expired.expiry_year = 2026;
        expired.expiry_month = 9;
        let mut no_name = card();
        no_name.cardholder_name = " ".into();
        for (instrument, reason) in [
            (short, "13 to 19"),
            (bad_cvv, "CVV"),
            (expired, "expired"),
            (no_name, "cardholder"),
        ] {
            let outcome = gate.authorize_at(&instrument, Yen::from(500), now());
            assert!(!outcome.authorized);
            assert!(outcome.authorization.is_none());
            assert!(outcome.decline_reason.unwrap().contains(reason));
        }
        let zero = gate.authorize_at(&card(), Yen::from(0), now());
        assert!(!zero.authorized);
    }

    #[test]
    fn current_month_expiry_is_still_valid() {
        let mut c = card();
        c.expiry_year = 2026;
        c.expiry_month = 10;
        assert!(MockPreAuthGateway::validate(&c, Yen::from(1), now()).is_ok());
    }
}
