use crate::{
    db_types::{NewAuditEntry, WatchAuditEntry, WatchId},
    traits::StoreError,
};

/// Append-only audit trail. Nothing in the engine reads it back to make decisions.
#[allow(async_fn_in_trait)]
pub trait AuditLog {
    async fn append_audit_entry(&self, entry: NewAuditEntry) -> Result<WatchAuditEntry, StoreError>;

    /// Entries for the watch, ordered by timestamp and then insertion order.
    async fn fetch_audit_entries(&self, watch: WatchId) -> Result<Vec<WatchAuditEntry>, StoreError>;
}
