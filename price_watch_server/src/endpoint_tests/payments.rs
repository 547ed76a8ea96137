use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{Duration, Utc};
use price_watch_engine::{
    db_types::PaymentAuthorization,
    test_utils::fakes::{FakeCatalog, FakeNotifier, FakeUsers},
    traits::{AuthorizationOutcome, CollaboratorError},
};
use pw_common::Yen;
use serde_json::json;

use super::{
    helpers::{as_buyer, send_request, test_api},
    mocks::{MockGateway, MockWatchStore},
};
use crate::routes::AuthorizePaymentRoute;

fn configure(gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(test_api(MockWatchStore::new(), gateway)))
            .service(AuthorizePaymentRoute::<MockWatchStore, FakeCatalog, FakeUsers, MockGateway, FakeNotifier>::new());
    }
}

fn authorize_request() -> TestRequest {
    let body = json!({
        "instrument": {
            "card_number": "4111111111111111",
            "expiry_month": 12,
            "expiry_year": 2030,
            "cvv": "123",
            "cardholder_name": "HANAKO YAMADA"
        },
        "amount": 9500
    });
    as_buyer(TestRequest::post().uri("/payments/authorize")).set_json(body)
}

#[actix_web::test]
async fn approved_authorization() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_authorize().withf(|i, amount| i.cvv.reveal() == "123" && *amount == Yen::from(9_500)).returning(
        |_, amount| {
            Ok(AuthorizationOutcome::approved(PaymentAuthorization {
                payment_method_ref: "pm_1".into(),
                auth_token_ref: "auth_1".into(),
                authorized_amount: amount,
                expires_at: Utc::now() + Duration::days(30),
            }))
        },
    );
    let (status, body) = send_request(authorize_request(), configure(gateway)).await;
    assert_eq!(status, StatusCode::OK);
    let outcome: AuthorizationOutcome = serde_json::from_str(&body).unwrap();
    assert!(outcome.authorized);
    assert_eq!(outcome.authorization.unwrap().authorized_amount, Yen::from(9_500));
}

#[actix_web::test]
async fn declined_card_is_not_an_error() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_authorize().returning(|_, _| Ok(AuthorizationOutcome::declined("card expired")));
    let (status, body) = send_request(authorize_request(), configure(gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"authorized":false,"decline_reason":"card expired"}"#);
}

#[actix_web::test]
async fn unreachable_gateway_is_unavailable() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_authorize().returning(|_, _| Err(CollaboratorError::Unavailable("gateway is down".into())));
    let (status, _) = send_request(authorize_request(), configure(gateway)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
