//! Single-flight refresh coalescing.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;
use tracing::debug;

use authhub_core::result::AppResult;

type InFlight = Shared<BoxFuture<'static, AppResult<()>>>;

/// Lets at most one refresh run at a time per client context.
///
/// The first caller starts the refresh; callers arriving while it runs
/// await the same outcome instead of rotating the refresh token again.
#[derive(Clone, Default)]
pub struct RefreshGuard {
    in_flight: Arc<Mutex<Option<InFlight>>>,
}

impl std::fmt::Debug for RefreshGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshGuard").finish()
    }
}

impl RefreshGuard {
    /// Creates an idle guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `refresh` unless one is already in flight, then returns the
    /// shared outcome.
    pub async fn run<F, Fut>(&self, refresh: F) -> AppResult<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        let shared = {
            let mut slot = self.in_flight.lock().await;
            match slot.as_ref() {
                Some(in_flight) => {
                    debug!("Joining in-flight refresh");
                    in_flight.clone()
                }
                None => {
                    let started = refresh().boxed().shared();
                    *slot = Some(started.clone());
                    started
                }
            }
        };

        let outcome = shared.clone().await;

        let mut slot = self.in_flight.lock().await;
        if slot.as_ref().is_some_and(|f| f.ptr_eq(&shared)) {
            *slot = None;
        }
        outcome
    }
}
