use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use log::*;
use price_watch_engine::db_types::UserId;
use pw_common::Secret;

use crate::errors::ServerError;

pub const USER_ID_HEADER: &str = "pw_user_id";
pub const SCAN_KEY_HEADER: &str = "pw_scan_key";

/// The authenticated caller. The upstream auth proxy puts the user id in the `pw_user_id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub UserId);

impl FromRequest for Caller {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let id = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .map(|id| Caller(UserId::from(id)));
        if id.is_none() {
            debug!("💻️ Request to {} without a usable {USER_ID_HEADER} header", req.path());
        }
        ready(id.ok_or(ServerError::MissingIdentity))
    }
}

/// The key that `POST /api/scan` callers must present, if one is configured.
#[derive(Debug, Clone, Default)]
pub struct ScanKey(pub Option<Secret<String>>);

impl ScanKey {
    pub fn check(&self, req: &HttpRequest) -> Result<(), ServerError> {
        let expected = match &self.0 {
            Some(key) => key.reveal(),
            None => return Ok(()),
        };
        let presented = req.headers().get(SCAN_KEY_HEADER).and_then(|v| v.to_str().ok());
        match presented {
            Some(key) if key == expected => Ok(()),
            _ => {
                warn!("💻️ Rejected a scan request with a missing or incorrect {SCAN_KEY_HEADER}");
                Err(ServerError::InvalidScanKey)
            },
        }
    }
}
