use cucumber::given;
use pw_common::Yen;
use price_watch_engine::{
    db_types::NewItem,
    test_utils::prepare_env::{seed_user, test_address},
};

use crate::cucumber::{world::WatchSystem, PriceWatchWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut PriceWatchWorld) {
    let system = WatchSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a user called '{word}'")]
async fn a_user(world: &mut PriceWatchWorld, name: String) {
    let sys = world.system_mut();
    let user = seed_user(&sys.db, &name).await;
    sys.users.insert(name, user);
}

#[given(expr = "a user called '{word}' with no postal code on file")]
async fn a_user_without_postcode(world: &mut PriceWatchWorld, name: String) {
    let sys = world.system_mut();
    let mut address = test_address(&name);
    address.postal_code = String::new();
    let user = sys.db.insert_user(address).await.expect("Error inserting user");
    sys.users.insert(name, user);
}

#[given(expr = "'{word}' lists '{word}' for {int} yen")]
async fn list_item(world: &mut PriceWatchWorld, seller: String, title: String, price: i64) {
    let sys = world.system_mut();
    let seller = sys.user(&seller).id;
    let item = NewItem::new(seller, title.clone(), Yen::from(price)).with_weight(3.5);
    let item = sys.db.insert_item(item).await.expect("Error listing item");
    sys.items.insert(title, item);
}
