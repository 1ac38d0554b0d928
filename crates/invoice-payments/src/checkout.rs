//! Stripe Checkout Integration
//!
//! Server half of the "Stripe Checkout (Hosted)" flow: turns a dashboard
//! price id into a checkout session the browser can redirect to.

use serde::{Deserialize, Serialize};
use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession,
    CreateCheckoutSessionLineItems,
};

use crate::error::{PaymentError, Result};

/// Metadata key carrying the application user id
pub const USER_ID_METADATA_KEY: &str = "user_id";

/// Stripe client wrapper
pub struct StripeClient {
    client: Client,
    webhook_secret: String,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(secret_key: &str, webhook_secret: &str) -> Self {
        Self {
            client: Client::new(secret_key),
            webhook_secret: webhook_secret.to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;
        let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| PaymentError::Config("STRIPE_WEBHOOK_SECRET not set".into()))?;

        Ok(Self::new(&secret_key, &webhook_secret))
    }

    /// Get the webhook secret
    pub fn webhook_secret(&self) -> &str {
        &self.webhook_secret
    }

    /// Create a subscription-mode Checkout session for a pre-configured price
    pub async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        let mut params = CreateCheckoutSession::new();
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);
        params.mode = Some(CheckoutSessionMode::Subscription);
        params.customer_email = request.customer_email.as_deref();
        params.client_reference_id = request.user_id.as_deref();

        if let Some(ref user_id) = request.user_id {
            let mut metadata = std::collections::HashMap::new();
            metadata.insert(USER_ID_METADATA_KEY.to_string(), user_id.clone());
            params.metadata = Some(metadata);
        }

        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            price: Some(request.price_id.clone()),
            quantity: Some(1),
            ..Default::default()
        }]);

        let session = StripeCheckoutSession::create(&self.client, params).await?;

        tracing::info!(
            session_id = %session.id,
            price_id = %request.price_id,
            user_id = ?request.user_id,
            "Created checkout session"
        );

        Ok(CheckoutSession {
            id: session.id.to_string(),
        })
    }
}

/// Request to create a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Stripe price id configured in the dashboard (e.g. `price_pro_monthly`)
    pub price_id: String,

    /// URL to redirect after successful payment
    pub success_url: String,

    /// URL to redirect if checkout is cancelled
    pub cancel_url: String,

    /// Application user id, echoed back in the completion webhook
    #[serde(default)]
    pub user_id: Option<String>,

    /// Prefills the checkout email field
    #[serde(default)]
    pub customer_email: Option<String>,
}

/// Result of creating a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Stripe session ID, handed to Stripe.js for the redirect
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_carries_only_the_id() {
        let session = CheckoutSession {
            id: "cs_test_a1".into(),
        };
        assert_eq!(
            serde_json::to_value(&session).unwrap(),
            serde_json::json!({ "id": "cs_test_a1" })
        );
    }

    #[test]
    fn test_request_optional_fields_default() {
        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "price_id": "price_pro_monthly",
            "success_url": "http://localhost:3000/billing?success=true",
            "cancel_url": "http://localhost:3000/billing?canceled=true",
        }))
        .unwrap();
        assert_eq!(request.user_id, None);
        assert_eq!(request.customer_email, None);
    }
}
