use chrono::{Duration, Utc};
use cucumber::{then, when};
use pw_common::Yen;
use price_watch_engine::{
    db_types::{NotificationKind, WatchStatus},
    test_utils::prepare_env::test_authorization,
    traits::{OrderManagement, WatchManagement},
    watch_objects::ArmWatchRequest,
    WatchApiError,
};

use crate::cucumber::PriceWatchWorld;

async fn arm(world: &mut PriceWatchWorld, buyer: &str, title: &str, request: ArmWatchRequest) {
    let sys = world.system_mut();
    let buyer_id = sys.user(buyer).id;
    let request = ArmWatchRequest { item_id: sys.item(title).id, ..request };
    match sys.api.arm(buyer_id, request).await {
        Ok(watch) => {
            sys.watches.insert(buyer.to_string(), watch);
            sys.last_error = None;
        },
        Err(e) => sys.last_error = Some(e),
    }
}

#[when(expr = "'{word}' arms a watch on '{word}' at {int} yen")]
async fn arm_watch(world: &mut PriceWatchWorld, buyer: String, title: String, ceiling: i64) {
    let request = ArmWatchRequest::new(Default::default(), Yen::from(ceiling), test_authorization(ceiling));
    arm(world, &buyer, &title, request).await;
}

#[when(expr = "'{word}' arms a watch on '{word}' at {int} yen lasting {int} day(s)")]
async fn arm_watch_for_days(world: &mut PriceWatchWorld, buyer: String, title: String, ceiling: i64, days: i64) {
    let request =
        ArmWatchRequest::new(Default::default(), Yen::from(ceiling), test_authorization(ceiling)).expires_in_days(days);
    arm(world, &buyer, &title, request).await;
}

#[when(expr = "'{word}' arms a watch on '{word}' at {int} yen holding only {int} yen")]
async fn arm_watch_underfunded(world: &mut PriceWatchWorld, buyer: String, title: String, ceiling: i64, held: i64) {
    let request = ArmWatchRequest::new(Default::default(), Yen::from(ceiling), test_authorization(held));
    arm(world, &buyer, &title, request).await;
}

#[when(expr = "the price of '{word}' changes to {int} yen")]
async fn reprice(world: &mut PriceWatchWorld, title: String, price: i64) {
    let sys = world.system();
    let id = sys.item(&title).id;
    sys.db.set_item_price(id, Yen::from(price)).await.expect("Error repricing item");
}

#[when("the scanner runs")]
async fn scan(world: &mut PriceWatchWorld) {
    let sys = world.system_mut();
    let summary = sys.scanner.run_scan_cycle().await;
    sys.last_summary = Some(summary);
}

#[when(expr = "the scanner runs {int} day(s) from now")]
async fn scan_later(world: &mut PriceWatchWorld, days: i64) {
    let sys = world.system_mut();
    let summary = sys.scanner.run_scan_cycle_at(Utc::now() + Duration::days(days)).await;
    sys.last_summary = Some(summary);
}

#[when(expr = "'{word}' cancels their watch")]
async fn cancel(world: &mut PriceWatchWorld, buyer: String) {
    let sys = world.system_mut();
    let (watch_id, buyer_id) = (sys.watch_of(&buyer).id, sys.user(&buyer).id);
    match sys.api.cancel(watch_id, buyer_id).await {
        Ok(watch) => {
            sys.watches.insert(buyer, watch);
            sys.last_error = None;
        },
        Err(e) => sys.last_error = Some(e),
    }
}

#[then(expr = "the watch of '{word}' is {word}")]
async fn watch_status(world: &mut PriceWatchWorld, buyer: String, status: String) {
    let sys = world.system();
    let expected = status.parse::<WatchStatus>().expect("Not a watch status");
    let watch = sys.db.fetch_watch(sys.watch_of(&buyer).id).await.expect("Error fetching watch").expect("Watch vanished");
    assert_eq!(watch.status, expected, "Watch of {buyer} is {}", watch.status);
}

#[then(expr = "'{word}' has no watches")]
async fn no_watches(world: &mut PriceWatchWorld, buyer: String) {
    let sys = world.system();
    let watches = sys.api.watches_for_buyer(sys.user(&buyer).id).await.expect("Error fetching watches");
    assert!(watches.is_empty(), "{buyer} has {} watches", watches.len());
}

#[then("the request is rejected as invalid")]
async fn rejected_as_invalid(world: &mut PriceWatchWorld) {
    let err = world.system().last_error.as_ref();
    assert!(matches!(err, Some(WatchApiError::ValidationError(_))), "Expected a validation error, got {err:?}");
}

#[then("the request is rejected as out of state")]
async fn rejected_as_out_of_state(world: &mut PriceWatchWorld) {
    let err = world.system().last_error.as_ref();
    assert!(matches!(err, Some(WatchApiError::StateError(_))), "Expected a state error, got {err:?}");
}

#[then(expr = "the scanner executed {int} watch(es)")]
async fn scan_executed(world: &mut PriceWatchWorld, count: usize) {
    let summary = world.system().last_summary.expect("The scanner has not run");
    assert_eq!(summary.executed, count, "Summary: {summary:?}");
}

#[then(expr = "the scanner expired {int} watch(es)")]
async fn scan_expired(world: &mut PriceWatchWorld, count: usize) {
    let summary = world.system().last_summary.expect("The scanner has not run");
    assert_eq!(summary.expired, count, "Summary: {summary:?}");
}

#[then(expr = "'{word}' has {int} order(s)")]
async fn item_orders(world: &mut PriceWatchWorld, title: String, count: usize) {
    let sys = world.system();
    let orders = sys.db.fetch_orders_for_item(sys.item(&title).id).await.expect("Error fetching orders");
    assert_eq!(orders.len(), count);
}

#[then(expr = "'{word}' bought it for {int} yen")]
async fn bought_for(world: &mut PriceWatchWorld, buyer: String, price: i64) {
    let sys = world.system();
    let watch = sys.db.fetch_watch(sys.watch_of(&buyer).id).await.expect("Error fetching watch").expect("Watch vanished");
    let order_id = watch.order_id.expect("Watch has no order");
    let order = sys.db.fetch_order(order_id).await.expect("Error fetching order").expect("Order vanished");
    assert_eq!(order.price, Yen::from(price));
    assert_eq!(order.buyer_id, watch.buyer_id);
    assert!(order.shipping_label_ref.is_some(), "No shipping label on {order_id}");
}

#[then(expr = "'{word}' was notified with {word}")]
async fn notified(world: &mut PriceWatchWorld, user: String, kind: String) {
    let sys = world.system();
    let expected = kind.parse::<NotificationKind>().expect("Not a notification kind");
    let notes = sys.db.fetch_notifications_for_user(sys.user(&user).id).await.expect("Error fetching notifications");
    assert!(notes.iter().any(|n| n.kind == expected), "{user} was never sent {expected}");
}
