use crate::{
    db_types::{NewAnomaly, ReconciliationAnomaly},
    traits::StoreError,
};

/// The operator queue for purchases that claimed an item but could not be completed.
#[allow(async_fn_in_trait)]
pub trait ReconciliationQueue {
    async fn record_anomaly(&self, anomaly: NewAnomaly) -> Result<ReconciliationAnomaly, StoreError>;

    async fn fetch_unresolved_anomalies(&self) -> Result<Vec<ReconciliationAnomaly>, StoreError>;
}
