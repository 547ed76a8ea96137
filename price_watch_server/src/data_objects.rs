use price_watch_engine::traits::PaymentInstrument;
use pw_common::Yen;
use serde::Deserialize;

/// Body of `POST /api/payments/authorize`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeRequest {
    pub instrument: PaymentInstrument,
    pub amount: Yen,
}
