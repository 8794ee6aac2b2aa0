use crate::gateway::GameGateway;
use std::sync::{
    Arc,
    Mutex,
};
use tracing::warn;

/// Last known wallet balance, shared by both engines.
///
/// The cache is advisory: it backs client-side affordability checks and the
/// balance display, never settlement. It is written only from authoritative
/// server responses and is never derived locally (a placed bet does not
/// decrement it). Staleness is tolerated until the next refresh.
#[derive(Clone, Debug, Default)]
pub struct BalanceCache {
    inner: Arc<Mutex<f64>>,
}

impl BalanceCache {
    pub fn new(initial: f64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn read(&self) -> f64 {
        *self.inner.lock().expect("balance cache poisoned")
    }

    /// Record an authoritative figure from a server response.
    pub fn set(&self, value: f64) {
        *self.inner.lock().expect("balance cache poisoned") = value;
    }

    /// Query the server and update the cache. A failed query leaves the
    /// cache unchanged and is not escalated; the stale value stays good
    /// enough for affordability checks.
    pub async fn refresh<G: GameGateway>(&self, gateway: &G) -> Option<f64> {
        match gateway.balance().await {
            Ok(value) => {
                self.set(value);
                Some(value)
            }
            Err(err) => {
                warn!(error = %err, "balance refresh failed; keeping cached value");
                None
            }
        }
    }
}
