//! Trial Usage Tracking
//!
//! Counts invoices created in this client session and gates creation once the
//! free trial is used up. State is written through to a [`KeyValueStore`] on
//! every mutation and read back once when the tracker is built.
//!
//! ```rust,ignore
//! let usage = UsageTracker::new(LocalStorage);
//!
//! match usage.record_invoice() {
//!     Ok(count) => tracing::info!(count, "Invoice created"),
//!     Err(e) => show_upgrade_prompt(e.user_message()),
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};

use crate::error::UsageError;
use crate::storage::KeyValueStore;

/// Invoices a non-subscribed user may create
pub const TRIAL_LIMIT: u32 = 3;

/// Storage key for the invoice count (decimal integer)
pub const INVOICE_COUNT_KEY: &str = "invoice-count";

/// Storage key for the subscribed flag (JSON boolean)
pub const SUBSCRIPTION_STATUS_KEY: &str = "subscription-status";

/// Storage key for the plan name
pub const SUBSCRIPTION_PLAN_KEY: &str = "subscription-plan";

/// Subscription plan tiers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Trial,
    Pro,
    None,
}

impl Plan {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Pro => "pro",
            Self::None => "none",
        }
    }

    /// Parse a stored plan name. Unknown names yield `None`.
    pub fn from_stored(s: &str) -> Option<Self> {
        match s.trim() {
            "trial" => Some(Self::Trial),
            "pro" => Some(Self::Pro),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a user's trial usage and subscription
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageState {
    pub invoice_count: u32,
    pub is_subscribed: bool,
    pub subscription_plan: Plan,
}

impl UsageState {
    pub const fn is_trial_exhausted(&self) -> bool {
        self.invoice_count >= TRIAL_LIMIT && !self.is_subscribed
    }

    /// Free invoices left, or `None` when subscribed (unlimited)
    pub const fn remaining_trial_invoices(&self) -> Option<u32> {
        if self.is_subscribed {
            None
        } else {
            Some(TRIAL_LIMIT.saturating_sub(self.invoice_count))
        }
    }
}

/// Subscription status as reported by the server
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub plan: Plan,
    pub is_subscribed: bool,
}

/// Usage tracker bound to a storage backend
///
/// Construct one per application (or per test) and share it; there is no
/// global instance.
pub struct UsageTracker<S: KeyValueStore> {
    store: S,
    state: RwLock<UsageState>,
}

impl<S: KeyValueStore> UsageTracker<S> {
    /// Create a tracker and hydrate it from `store`
    pub fn new(store: S) -> Self {
        let state = Self::hydrate(&store);
        tracing::debug!(
            invoice_count = state.invoice_count,
            subscribed = state.is_subscribed,
            plan = %state.subscription_plan,
            "Loaded usage state"
        );
        Self {
            store,
            state: RwLock::new(state),
        }
    }

    /// Read persisted state. Missing or malformed values fall back to defaults.
    fn hydrate(store: &S) -> UsageState {
        let mut state = UsageState::default();

        if let Some(count) = store
            .get(INVOICE_COUNT_KEY)
            .and_then(|v| v.trim().parse::<u32>().ok())
        {
            state.invoice_count = count;
        }

        if let Some(subscribed) = store
            .get(SUBSCRIPTION_STATUS_KEY)
            .and_then(|v| serde_json::from_str::<bool>(&v).ok())
        {
            state.is_subscribed = subscribed;
        }

        if let Some(plan) = store
            .get(SUBSCRIPTION_PLAN_KEY)
            .as_deref()
            .and_then(Plan::from_stored)
        {
            state.subscription_plan = plan;
        }

        if state.is_subscribed && state.subscription_plan != Plan::Pro {
            tracing::warn!(
                plan = %state.subscription_plan,
                "Stored subscription flag without Pro plan; ignoring flag"
            );
            state.is_subscribed = false;
        }

        state
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, UsageState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!(key, error = %e, "Failed to persist usage state");
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> UsageState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn invoice_count(&self) -> u32 {
        self.state().invoice_count
    }

    pub fn is_subscribed(&self) -> bool {
        self.state().is_subscribed
    }

    pub fn plan(&self) -> Plan {
        self.state().subscription_plan
    }

    pub fn is_trial_exhausted(&self) -> bool {
        self.state().is_trial_exhausted()
    }

    pub fn remaining_trial_invoices(&self) -> Option<u32> {
        self.state().remaining_trial_invoices()
    }

    /// Count one created invoice. Unbounded; see [`Self::record_invoice`].
    pub fn increment(&self) -> u32 {
        let mut state = self.write_state();
        state.invoice_count = state.invoice_count.saturating_add(1);
        self.persist(INVOICE_COUNT_KEY, &state.invoice_count.to_string());
        state.invoice_count
    }

    /// Count one created invoice if the trial gate allows it
    ///
    /// Returns the new count, or `TrialExhausted` with state left untouched.
    pub fn record_invoice(&self) -> Result<u32, UsageError> {
        let mut state = self.write_state();
        if state.is_trial_exhausted() {
            tracing::info!(
                invoice_count = state.invoice_count,
                "Invoice creation refused: trial exhausted"
            );
            return Err(UsageError::TrialExhausted { limit: TRIAL_LIMIT });
        }

        state.invoice_count = state.invoice_count.saturating_add(1);
        self.persist(INVOICE_COUNT_KEY, &state.invoice_count.to_string());
        Ok(state.invoice_count)
    }

    /// Zero the count and drop the persisted value
    pub fn reset(&self) {
        let mut state = self.write_state();
        state.invoice_count = 0;
        if let Err(e) = self.store.remove(INVOICE_COUNT_KEY) {
            tracing::warn!(key = INVOICE_COUNT_KEY, error = %e, "Failed to clear usage count");
        }
    }

    /// Overwrite plan and subscribed flag
    ///
    /// Callers invoke this only after the payment provider confirmed the
    /// subscription; nothing is checked against the provider here.
    pub fn set_subscription_status(&self, plan: Plan, subscribed: bool) -> Result<(), UsageError> {
        if subscribed && plan != Plan::Pro {
            return Err(UsageError::InvalidSubscription(plan));
        }

        let mut state = self.write_state();
        state.subscription_plan = plan;
        state.is_subscribed = subscribed;
        self.persist(SUBSCRIPTION_STATUS_KEY, if subscribed { "true" } else { "false" });
        self.persist(SUBSCRIPTION_PLAN_KEY, plan.as_str());

        tracing::info!(plan = %plan, subscribed, "Subscription status updated");
        Ok(())
    }

    /// Refresh from server-reported status after checkout
    ///
    /// Only upgrades to Pro are applied. Returns whether state changed.
    pub fn apply_remote_status(&self, status: SubscriptionStatus) -> bool {
        if !(status.is_subscribed && status.plan == Plan::Pro) || self.is_subscribed() {
            return false;
        }
        self.set_subscription_status(Plan::Pro, true).is_ok()
    }
}
