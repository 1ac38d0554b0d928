//! Shared Client State
//!
//! Provided once by `App` through Leptos context. The usage tracker owns the
//! truth; the signal is a reactive snapshot refreshed after every mutation.

use std::sync::Arc;

use leptos::prelude::*;

use invoice_core::{
    InvoiceSummary, KeyValueStore, SubscriptionStatus, UsageError, UsageState, UsageTracker,
};

use crate::api::BrowserStorage;

/// Storage key for invoices created in this browser
pub const INVOICES_KEY: &str = "invoices";

#[derive(Clone)]
pub struct UsageContext {
    tracker: Arc<UsageTracker<BrowserStorage>>,
    snapshot: RwSignal<UsageState>,
}

impl UsageContext {
    pub fn new() -> Self {
        let tracker = UsageTracker::new(BrowserStorage);
        let snapshot = RwSignal::new(tracker.state());
        Self {
            tracker: Arc::new(tracker),
            snapshot,
        }
    }

    /// Read-only handle for views
    pub fn snapshot(&self) -> ReadSignal<UsageState> {
        self.snapshot.read_only()
    }

    fn refresh(&self) {
        self.snapshot.set(self.tracker.state());
    }

    /// Count one created invoice, refusing once the trial is used up
    pub fn record_invoice(&self) -> Result<u32, UsageError> {
        let result = self.tracker.record_invoice();
        self.refresh();
        result
    }

    /// Merge the server's view after returning from checkout
    pub fn apply_remote_status(&self, status: SubscriptionStatus) -> bool {
        let changed = self.tracker.apply_remote_status(status);
        self.refresh();
        changed
    }
}

impl Default for UsageContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Invoices created in this browser, newest last
#[derive(Clone, Copy)]
pub struct InvoiceBook {
    invoices: RwSignal<Vec<InvoiceSummary>>,
}

impl InvoiceBook {
    pub fn new() -> Self {
        let invoices = BrowserStorage
            .get(INVOICES_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self {
            invoices: RwSignal::new(invoices),
        }
    }

    pub const fn invoices(&self) -> RwSignal<Vec<InvoiceSummary>> {
        self.invoices
    }

    pub fn add(&self, invoice: InvoiceSummary) {
        self.invoices.update(|list| list.push(invoice));
        let stored = self.invoices.with_untracked(|list| serde_json::to_string(list));
        match stored {
            Ok(json) => {
                if let Err(e) = BrowserStorage.set(INVOICES_KEY, &json) {
                    tracing::warn!(error = %e, "Could not persist invoices");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Could not serialize invoices"),
        }
    }
}

impl Default for InvoiceBook {
    fn default() -> Self {
        Self::new()
    }
}

pub fn use_usage() -> UsageContext {
    use_context::<UsageContext>().unwrap_or_default()
}

pub fn use_invoices() -> InvoiceBook {
    use_context::<InvoiceBook>().unwrap_or_default()
}
