//! Subscription-based login gating.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error};

use authhub_database::store::SubscriptionStore;
use authhub_entity::account::Account;

/// Decides whether an account's tenant holds a current subscription.
///
/// Evaluated fresh on every login and refresh. A failed lookup denies.
#[derive(Clone)]
pub struct LicenseGate {
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl std::fmt::Debug for LicenseGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseGate").finish()
    }
}

impl LicenseGate {
    /// Creates a gate over the subscription store.
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>) -> Self {
        Self { subscriptions }
    }

    /// Super-administrators are always licensed; tenant accounts need an
    /// `ACTIVE` subscription that has not yet expired.
    pub async fn is_licensed(&self, account: &Account) -> bool {
        let Some(tenant_id) = account.tenant_id else {
            return true;
        };

        match self
            .subscriptions
            .find_current_subscription(tenant_id, Utc::now())
            .await
        {
            Ok(Some(_)) => true,
            Ok(None) => {
                debug!(tenant_id = %tenant_id, "Tenant has no current subscription");
                false
            }
            Err(e) => {
                error!(tenant_id = %tenant_id, error = %e, "License lookup failed, denying");
                false
            }
        }
    }
}
