//! Application State

use std::sync::Arc;

use invoice_payments::{MemorySubscriptionStore, StripeClient};

use crate::auth::SessionVerifier;
use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,

    /// Subscription records written by the Stripe webhook
    pub subscriptions: Arc<MemorySubscriptionStore>,

    /// Stripe client (optional - None if not configured)
    pub stripe: Option<Arc<StripeClient>>,

    /// Session token verifier (optional - None without AUTH_SECRET)
    pub sessions: Option<Arc<SessionVerifier>>,
}

impl AppState {
    pub fn new(config: ServerConfig, stripe: Option<StripeClient>) -> Self {
        let sessions = config
            .auth_secret
            .as_deref()
            .map(|secret| Arc::new(SessionVerifier::new(secret)));

        Self {
            config: Arc::new(config),
            subscriptions: Arc::new(MemorySubscriptionStore::new()),
            stripe: stripe.map(Arc::new),
            sessions,
        }
    }
}
