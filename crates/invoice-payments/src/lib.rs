//! # invoice-payments
//!
//! Stripe integration for Invoice Assistant.
//!
//! Uses the Stripe Checkout (Hosted) approach: the server creates a session
//! for a dashboard price id, the browser hands the session id to Stripe.js,
//! and Stripe redirects back once the subscription is paid.
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────┐
//! │  Billing    │────▶│  Stripe Hosted  │────▶│  Billing    │
//! │  page       │     │  Checkout Page  │     │  ?success   │
//! └─────────────┘     └─────────────────┘     └─────────────┘
//!                              │
//!                              ▼ webhook
//!                     ┌─────────────────┐
//!                     │ Subscription    │
//!                     │ store           │
//!                     └─────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use invoice_payments::{StripeClient, CheckoutRequest};
//!
//! let client = StripeClient::new("sk_test_xxx", "whsec_xxx");
//!
//! let session = client.create_checkout_session(CheckoutRequest {
//!     price_id: "price_pro_monthly".into(),
//!     success_url: "https://yoursite.com/billing?success=true".into(),
//!     cancel_url: "https://yoursite.com/billing".into(),
//!     user_id: Some(user.id),
//!     customer_email: None,
//! }).await?;
//!
//! // Hand session.id to Stripe.js redirectToCheckout
//! ```

mod checkout;
mod error;
mod subscription;
mod webhook;

pub use checkout::{CheckoutRequest, CheckoutSession, StripeClient};
pub use error::{PaymentError, Result};
pub use subscription::{MemorySubscriptionStore, SubscriptionRecord, SubscriptionStore};
pub use webhook::{WebhookEvent, WebhookHandler};
