//! # invoice-core
//!
//! Client-side billing logic for Invoice Assistant.
//!
//! - **Usage tracking**: trial quota gating backed by a pluggable key-value store
//! - **Checkout**: request a Stripe checkout session and hand it to the redirect
//! - **Invoices**: draft editing with decimal totals, list filtering and stats
//! - **Clients**: directory rolled up from invoices
//!
//! Compiles for native targets and `wasm32-unknown-unknown`; browser-specific
//! adapters live in `invoice-web`.

pub mod checkout;
pub mod client;
pub mod error;
pub mod invoice;
pub mod storage;
pub mod usage;

pub use checkout::{
    CheckoutEndpoint, CheckoutInitiator, CheckoutRedirect, CheckoutReply, CheckoutRequest,
    CheckoutSession, HttpCheckoutEndpoint, HttpReply,
};
pub use client::{ClientFilter, ClientQuery, ClientStats, ClientStatus, ClientSummary};
pub use error::{CheckoutError, InvoiceError, StorageError, UsageError};
pub use invoice::{InvoiceDraft, InvoiceQuery, InvoiceStats, InvoiceStatus, InvoiceSummary};
pub use storage::{KeyValueStore, MemoryStore};
pub use usage::{Plan, SubscriptionStatus, TRIAL_LIMIT, UsageState, UsageTracker};
