use actix_web::{http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{Duration, TimeZone, Utc};
use log::debug;
use price_watch_engine::{
    db_types::{ItemId, ItemSnapshot, ItemStatus, RecipientAddress, UserId, UserProfile, Watch, WatchId, WatchStatus},
    test_utils::fakes::{FakeCatalog, FakeNotifier, FakeUsers},
    CallPolicy,
    WatchFlowApi,
};
use pw_common::Yen;

use super::mocks::{MockGateway, MockWatchStore};

pub type TestApi = WatchFlowApi<MockWatchStore, FakeCatalog, FakeUsers, MockGateway, FakeNotifier>;

pub const BUYER: UserId = UserId(1);
pub const SELLER: UserId = UserId(2);

/// Sends `req` to an app built by `configure` and returns the status and body.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    (status, body)
}

pub fn as_buyer(req: TestRequest) -> TestRequest {
    req.insert_header(("pw_user_id", BUYER.value().to_string()))
}

pub fn test_api(store: MockWatchStore, gateway: MockGateway) -> TestApi {
    let catalog = FakeCatalog::new().with_item(camera());
    let users = FakeUsers::default().with_user(profile(BUYER, "Hanako")).with_user(profile(SELLER, "Sato"));
    WatchFlowApi::new(store, catalog, users, gateway, FakeNotifier::default(), CallPolicy::default())
}

pub fn camera() -> ItemSnapshot {
    ItemSnapshot {
        id: ItemId(10),
        seller_id: SELLER,
        title: "Camera".into(),
        price: Yen::from(10_000),
        status: ItemStatus::Active,
        weight_kg: 1.2,
    }
}

pub fn address(name: &str) -> RecipientAddress {
    RecipientAddress {
        name: name.into(),
        phone: "090-0000-0000".into(),
        postal_code: "100-0001".into(),
        region: "Tokyo".into(),
        city: "Chiyoda-ku".into(),
        address_line1: "1-1 Chiyoda".into(),
        address_line2: String::new(),
    }
}

pub fn profile(id: UserId, name: &str) -> UserProfile {
    let a = address(name);
    UserProfile {
        id,
        display_name: a.name,
        phone: a.phone,
        postal_code: a.postal_code,
        region: a.region,
        city: a.city,
        address_line1: a.address_line1,
        address_line2: a.address_line2,
    }
}

pub fn watch(id: i64, buyer: UserId, status: WatchStatus) -> Watch {
    let t0 = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap();
    Watch {
        id: WatchId(id),
        buyer_id: buyer,
        item_id: ItemId(10),
        max_price: Yen::from(9_500),
        status,
        payment_authorized: true,
        payment_method_ref: "pm_test".into(),
        auth_token_ref: "auth_test".into(),
        authorized_amount: Yen::from(9_500),
        payment_expires_at: t0 + Duration::days(30),
        use_registered_address: true,
        recipient: address("Hanako"),
        delivery_time_slot: None,
        last_checked_at: None,
        executed_at: None,
        order_id: None,
        expires_at: t0 + Duration::days(30),
        lease_token: None,
        lease_expires_at: None,
        created_at: t0,
        updated_at: t0,
    }
}
