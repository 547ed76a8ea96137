use crate::{
    db_types::{NewOrder, Order, OrderId},
    traits::StoreError,
};

#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Creates the order for `order.watch_id`. Idempotent: if an order already exists for the watch, that order is
    /// returned unchanged.
    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    async fn attach_shipping_label(&self, id: OrderId, label_ref: &str) -> Result<(), StoreError>;
}
