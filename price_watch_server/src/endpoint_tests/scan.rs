use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use price_watch_engine::{
    events::EventProducers,
    test_utils::fakes::{FakeCatalog, FakeLabels, FakeNotifier, FakeUsers},
    watch_objects::{ScanConfig, ScanSummary},
    ClaimPipeline,
    PriceScanner,
};
use pw_common::Secret;

use super::{helpers::send_request, mocks::MockWatchStore};
use crate::{helpers::ScanKey, routes::ScanRoute};

fn configure(store: MockWatchStore, key: Option<&str>) -> impl FnOnce(&mut ServiceConfig) {
    let key = ScanKey(key.map(|k| Secret::new(k.to_string())));
    move |cfg| {
        let pipeline = ClaimPipeline::new(
            store,
            FakeCatalog::new(),
            FakeUsers::default(),
            FakeLabels::default(),
            FakeNotifier::default(),
            EventProducers::default(),
            ScanConfig::default(),
        );
        cfg.app_data(web::Data::new(PriceScanner::new(pipeline)))
            .app_data(web::Data::new(key))
            .service(ScanRoute::<MockWatchStore, FakeCatalog, FakeUsers, FakeLabels, FakeNotifier>::new());
    }
}

fn idle_store() -> MockWatchStore {
    let mut store = MockWatchStore::new();
    store.expect_fetch_eligible_watches().returning(|_| Ok(vec![]));
    store.expect_expire_watches().returning(|_| Ok(vec![]));
    store
}

#[actix_web::test]
async fn scan_without_a_configured_key() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::post().uri("/scan"), configure(idle_store(), None)).await;
    assert_eq!(status, StatusCode::OK);
    let summary: ScanSummary = serde_json::from_str(&body).unwrap();
    assert_eq!(summary, ScanSummary::default());
}

#[actix_web::test]
async fn scan_with_the_wrong_key_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let mut store = MockWatchStore::new();
    store.expect_fetch_eligible_watches().never();
    let req = TestRequest::post().uri("/scan").insert_header(("pw_scan_key", "guess"));
    let (status, _) = send_request(req, configure(store, Some("s3cret"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn scan_with_the_right_key() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/scan").insert_header(("pw_scan_key", "s3cret"));
    let (status, body) = send_request(req, configure(idle_store(), Some("s3cret"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""checked":0"#), "{body}");
}
