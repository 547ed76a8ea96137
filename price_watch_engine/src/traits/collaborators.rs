use pw_common::Yen;

use crate::{
    db_types::{ItemId, ItemSnapshot, LabelRequest, NotificationKind, UserId, UserProfile},
    traits::{AuthorizationOutcome, CollaboratorError, PaymentInstrument},
};

#[allow(async_fn_in_trait)]
pub trait Catalog {
    async fn fetch_item(&self, id: ItemId) -> Result<Option<ItemSnapshot>, CollaboratorError>;

    /// Atomically marks the item sold iff it is still `active` and priced at or below `ceiling`.
    ///
    /// Returns the price the item was sold at if, and only if, this call performed the transition. Of any number of
    /// concurrent callers, at most one ever receives `Some`.
    async fn claim_item(&self, id: ItemId, ceiling: Yen) -> Result<Option<Yen>, CollaboratorError>;
}

#[allow(async_fn_in_trait)]
pub trait UserDirectory {
    async fn fetch_user(&self, id: UserId) -> Result<Option<UserProfile>, CollaboratorError>;
}

#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Requests a hold of `amount` against the instrument. A decline is a successful call with
    /// `authorized == false`, not an error.
    async fn authorize(
        &self,
        instrument: &PaymentInstrument,
        amount: Yen,
    ) -> Result<AuthorizationOutcome, CollaboratorError>;
}

#[allow(async_fn_in_trait)]
pub trait ShippingLabelGenerator {
    /// Returns the reference of the generated label.
    async fn generate_label(&self, request: &LabelRequest) -> Result<String, CollaboratorError>;
}

#[allow(async_fn_in_trait)]
pub trait NotificationSink {
    async fn notify(
        &self,
        user: UserId,
        kind: NotificationKind,
        title: &str,
        body: &str,
    ) -> Result<(), CollaboratorError>;
}
