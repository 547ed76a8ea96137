use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{Duration, Utc};
use price_watch_engine::{
    db_types::{NewWatch, Watch, WatchId, WatchStatus},
    test_utils::fakes::{FakeCatalog, FakeNotifier, FakeUsers},
    traits::StoreError,
};
use serde_json::{json, Value};

use super::{
    helpers::{as_buyer, send_request, test_api, watch, BUYER, SELLER},
    mocks::{MockGateway, MockWatchStore},
};
use crate::routes::{ArmWatchRoute, CancelWatchRoute, MyWatchesRoute, WatchByIdRoute, WatchHistoryRoute};

fn configure(store: MockWatchStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(test_api(store, MockGateway::new())))
            .service(ArmWatchRoute::<MockWatchStore, FakeCatalog, FakeUsers, MockGateway, FakeNotifier>::new())
            .service(MyWatchesRoute::<MockWatchStore, FakeCatalog, FakeUsers, MockGateway, FakeNotifier>::new())
            .service(WatchHistoryRoute::<MockWatchStore, FakeCatalog, FakeUsers, MockGateway, FakeNotifier>::new())
            .service(CancelWatchRoute::<MockWatchStore, FakeCatalog, FakeUsers, MockGateway, FakeNotifier>::new())
            .service(WatchByIdRoute::<MockWatchStore, FakeCatalog, FakeUsers, MockGateway, FakeNotifier>::new());
    }
}

fn arm_body(max_price: i64, authorized: i64) -> Value {
    json!({
        "item_id": 10,
        "max_price": max_price,
        "payment": {
            "payment_method_ref": "pm_0123",
            "auth_token_ref": "auth_0123",
            "authorized_amount": authorized,
            "expires_at": (Utc::now() + Duration::days(30)).to_rfc3339(),
        },
        "use_registered_address": true
    })
}

fn stored(new_watch: NewWatch) -> Watch {
    Watch {
        buyer_id: new_watch.buyer_id,
        max_price: new_watch.max_price,
        recipient: new_watch.recipient,
        expires_at: new_watch.expires_at,
        created_at: new_watch.created_at,
        updated_at: new_watch.created_at,
        ..watch(1, new_watch.buyer_id, WatchStatus::Active)
    }
}

#[actix_web::test]
async fn requests_without_identity_are_rejected() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/watches");
    let (status, body) = send_request(req, configure(MockWatchStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("pw_user_id"), "{body}");
}

#[actix_web::test]
async fn arm_a_watch() {
    let _ = env_logger::try_init().ok();
    let mut store = MockWatchStore::new();
    store.expect_insert_watch().times(1).returning(|w| Ok(stored(w)));
    let req = as_buyer(TestRequest::post().uri("/watches")).set_json(arm_body(9_500, 9_500));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let watch: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(watch["status"], "active");
    assert_eq!(watch["max_price"], 9_500);
    assert_eq!(watch["buyer_id"], BUYER.value());
    assert_eq!(watch["recipient"]["name"], "Hanako");
    assert!(watch.get("auth_token_ref").is_none(), "token references must not leak: {body}");
}

#[actix_web::test]
async fn arming_below_the_held_amount_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let mut store = MockWatchStore::new();
    store.expect_insert_watch().never();
    let req = as_buyer(TestRequest::post().uri("/watches")).set_json(arm_body(9_500, 9_000));
    let (status, body) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("below the ceiling"), "{body}");
}

#[actix_web::test]
async fn sellers_cannot_watch_their_own_items() {
    let _ = env_logger::try_init().ok();
    let mut store = MockWatchStore::new();
    store.expect_insert_watch().never();
    let req = TestRequest::post()
        .uri("/watches")
        .insert_header(("pw_user_id", SELLER.value().to_string()))
        .set_json(arm_body(9_500, 9_500));
    let (status, _) = send_request(req, configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn list_my_watches() {
    let _ = env_logger::try_init().ok();
    let mut store = MockWatchStore::new();
    store
        .expect_fetch_watches_for_buyer()
        .withf(|b| *b == BUYER)
        .returning(|b| Ok(vec![watch(1, b, WatchStatus::Active), watch(2, b, WatchStatus::Expired)]));
    let (status, body) = send_request(as_buyer(TestRequest::get().uri("/watches")), configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let watches: Vec<Value> = serde_json::from_str(&body).unwrap();
    let statuses = watches.iter().map(|w| w["status"].as_str().unwrap()).collect::<Vec<_>>();
    assert_eq!(statuses, vec!["active", "expired"]);
}

#[actix_web::test]
async fn someone_elses_watch_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let mut store = MockWatchStore::new();
    store.expect_fetch_watch().returning(|id| Ok(Some(watch(id.value(), SELLER, WatchStatus::Active))));
    store.expect_fetch_audit_entries().never();
    let (status, _) = send_request(as_buyer(TestRequest::get().uri("/watches/7")), configure(store)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn unknown_watch_is_not_found() {
    let _ = env_logger::try_init().ok();
    let mut store = MockWatchStore::new();
    store.expect_fetch_watch().returning(|_| Ok(None));
    let (status, _) = send_request(as_buyer(TestRequest::get().uri("/watches/7/history")), configure(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn cancel_a_watch() {
    let _ = env_logger::try_init().ok();
    let mut store = MockWatchStore::new();
    store.expect_fetch_watch().returning(|id| Ok(Some(watch(id.value(), BUYER, WatchStatus::Active))));
    store
        .expect_transition_watch()
        .withf(|id, expected, t| *id == WatchId(7) && *expected == WatchStatus::Active && t.status == WatchStatus::Cancelled)
        .times(1)
        .returning(|id, _, _| Ok(watch(id.value(), BUYER, WatchStatus::Cancelled)));
    let (status, body) = send_request(as_buyer(TestRequest::post().uri("/watches/7/cancel")), configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"cancelled""#), "{body}");
}

#[actix_web::test]
async fn cancel_during_a_purchase_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let mut store = MockWatchStore::new();
    store.expect_fetch_watch().returning(|id| Ok(Some(watch(id.value(), BUYER, WatchStatus::Active))));
    store
        .expect_transition_watch()
        .returning(|id, expected, _| Err(StoreError::StatusConflict { id, expected }));
    let (status, _) = send_request(as_buyer(TestRequest::post().uri("/watches/7/cancel")), configure(store)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn cancelling_twice_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let mut store = MockWatchStore::new();
    store.expect_fetch_watch().returning(|id| Ok(Some(watch(id.value(), BUYER, WatchStatus::Cancelled))));
    store.expect_transition_watch().never();
    let (status, body) = send_request(as_buyer(TestRequest::post().uri("/watches/7/cancel")), configure(store)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("already cancelled"), "{body}");
}
