//! Stripe Webhook Handling
//!
//! Processes Stripe webhook events for subscription lifecycle management.

use std::sync::Arc;
use stripe::{Event, EventObject, EventType, Webhook};

use crate::checkout::USER_ID_METADATA_KEY;
use crate::error::{PaymentError, Result};
use crate::subscription::{SubscriptionRecord, SubscriptionStore};

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Checkout completed - user becomes Pro
    CheckoutCompleted {
        session_id: String,
        user_id: Option<String>,
        subscription_id: String,
        customer_email: Option<String>,
    },

    /// Subscription status changed on Stripe's side
    SubscriptionUpdated {
        subscription_id: String,
        status: String,
    },

    /// Subscription cancelled - deactivate record
    SubscriptionCancelled { subscription_id: String },

    /// Payment failed - logged only
    PaymentFailed {
        subscription_id: Option<String>,
        customer_email: Option<String>,
    },

    /// Unhandled event type
    Other { event_type: String },
}

/// Webhook handler
pub struct WebhookHandler<S: SubscriptionStore> {
    store: Arc<S>,
}

impl<S: SubscriptionStore> WebhookHandler<S> {
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Verify webhook signature and parse event
    pub fn parse_event(&self, payload: &str, signature: &str, secret: &str) -> Result<Event> {
        Webhook::construct_event(payload, signature, secret)
            .map_err(|e| PaymentError::WebhookSignature(e.to_string()))
    }

    /// Process a verified webhook event
    pub fn handle(&self, event: &Event) -> Result<WebhookEvent> {
        tracing::info!(event_type = ?event.type_, "Processing Stripe webhook");

        let parsed = Self::parse_webhook_event(event)?;
        self.apply(&parsed)?;
        Ok(parsed)
    }

    /// Apply a parsed event to the subscription store
    pub fn apply(&self, event: &WebhookEvent) -> Result<()> {
        match event {
            WebhookEvent::CheckoutCompleted {
                session_id,
                user_id: Some(user_id),
                subscription_id,
                customer_email,
            } => {
                let record = SubscriptionRecord::new(
                    user_id.clone(),
                    subscription_id.clone(),
                    customer_email.clone(),
                );
                self.store.save(&record)?;

                tracing::info!(
                    user_id = %user_id,
                    session_id = %session_id,
                    subscription_id = %subscription_id,
                    "Activated Pro subscription"
                );
            }

            WebhookEvent::CheckoutCompleted {
                session_id,
                user_id: None,
                ..
            } => {
                tracing::warn!(
                    session_id = %session_id,
                    "Checkout completed without a user reference; not recorded"
                );
            }

            WebhookEvent::SubscriptionCancelled { subscription_id } => {
                if let Some(mut record) = self.store.get_by_subscription(subscription_id)? {
                    record.set_active(false);
                    self.store.save(&record)?;

                    tracing::info!(
                        user_id = %record.user_id,
                        subscription_id = %subscription_id,
                        "Deactivated subscription"
                    );
                }
            }

            WebhookEvent::SubscriptionUpdated {
                subscription_id,
                status,
            } => {
                if let Some(mut record) = self.store.get_by_subscription(subscription_id)? {
                    let is_active = matches!(status.as_str(), "active" | "trialing");
                    record.set_active(is_active);
                    self.store.save(&record)?;

                    tracing::info!(
                        user_id = %record.user_id,
                        status = %status,
                        active = is_active,
                        "Updated subscription"
                    );
                }
            }

            WebhookEvent::PaymentFailed {
                subscription_id,
                customer_email,
            } => {
                tracing::warn!(
                    subscription_id = ?subscription_id,
                    email = ?customer_email,
                    "Payment failed"
                );
            }

            WebhookEvent::Other { event_type } => {
                tracing::debug!(event_type = %event_type, "Unhandled webhook event");
            }
        }

        Ok(())
    }

    /// Parse Stripe event into our event type
    fn parse_webhook_event(event: &Event) -> Result<WebhookEvent> {
        match event.type_ {
            EventType::CheckoutSessionCompleted => {
                if let EventObject::CheckoutSession(session) = &event.data.object {
                    let user_id = session.client_reference_id.clone().or_else(|| {
                        session
                            .metadata
                            .as_ref()
                            .and_then(|m| m.get(USER_ID_METADATA_KEY))
                            .cloned()
                    });

                    Ok(WebhookEvent::CheckoutCompleted {
                        session_id: session.id.to_string(),
                        user_id,
                        subscription_id: session
                            .subscription
                            .as_ref()
                            .map(|s| s.id().to_string())
                            .unwrap_or_default(),
                        customer_email: session.customer_email.clone(),
                    })
                } else {
                    Err(PaymentError::WebhookParse("Invalid checkout session data".into()))
                }
            }

            EventType::CustomerSubscriptionUpdated => {
                if let EventObject::Subscription(sub) = &event.data.object {
                    Ok(WebhookEvent::SubscriptionUpdated {
                        subscription_id: sub.id.to_string(),
                        status: sub.status.to_string(),
                    })
                } else {
                    Err(PaymentError::WebhookParse("Invalid subscription data".into()))
                }
            }

            EventType::CustomerSubscriptionDeleted => {
                if let EventObject::Subscription(sub) = &event.data.object {
                    Ok(WebhookEvent::SubscriptionCancelled {
                        subscription_id: sub.id.to_string(),
                    })
                } else {
                    Err(PaymentError::WebhookParse("Invalid subscription data".into()))
                }
            }

            EventType::InvoicePaymentFailed => {
                if let EventObject::Invoice(invoice) = &event.data.object {
                    Ok(WebhookEvent::PaymentFailed {
                        subscription_id: invoice.subscription.as_ref().map(|s| s.id().to_string()),
                        customer_email: invoice.customer_email.clone(),
                    })
                } else {
                    Err(PaymentError::WebhookParse("Invalid invoice data".into()))
                }
            }

            _ => Ok(WebhookEvent::Other {
                event_type: format!("{:?}", event.type_),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::MemorySubscriptionStore;
    use invoice_core::Plan;

    fn completed(user_id: Option<&str>) -> WebhookEvent {
        WebhookEvent::CheckoutCompleted {
            session_id: "cs_test_123".into(),
            user_id: user_id.map(Into::into),
            subscription_id: "sub_123".into(),
            customer_email: Some("test@example.com".into()),
        }
    }

    #[test]
    fn test_checkout_completed_activates_pro() {
        let store = Arc::new(MemorySubscriptionStore::new());
        let handler = WebhookHandler::new(Arc::clone(&store));

        handler.apply(&completed(Some("user_1"))).unwrap();

        let status = store.status("user_1").unwrap();
        assert_eq!(status.plan, Plan::Pro);
        assert!(status.is_subscribed);
    }

    #[test]
    fn test_checkout_without_user_is_ignored() {
        let store = Arc::new(MemorySubscriptionStore::new());
        let handler = WebhookHandler::new(Arc::clone(&store));

        handler.apply(&completed(None)).unwrap();

        assert!(store.get_by_subscription("sub_123").unwrap().is_none());
    }

    #[test]
    fn test_cancellation_deactivates() {
        let store = Arc::new(MemorySubscriptionStore::new());
        let handler = WebhookHandler::new(Arc::clone(&store));
        handler.apply(&completed(Some("user_1"))).unwrap();

        handler
            .apply(&WebhookEvent::SubscriptionCancelled {
                subscription_id: "sub_123".into(),
            })
            .unwrap();

        assert!(!store.status("user_1").unwrap().is_subscribed);
    }

    #[test]
    fn test_past_due_update_deactivates_and_active_restores() {
        let store = Arc::new(MemorySubscriptionStore::new());
        let handler = WebhookHandler::new(Arc::clone(&store));
        handler.apply(&completed(Some("user_1"))).unwrap();

        let update = |status: &str| WebhookEvent::SubscriptionUpdated {
            subscription_id: "sub_123".into(),
            status: status.into(),
        };

        handler.apply(&update("past_due")).unwrap();
        assert!(!store.status("user_1").unwrap().is_subscribed);

        handler.apply(&update("active")).unwrap();
        assert!(store.status("user_1").unwrap().is_subscribed);
    }

    #[test]
    fn test_bad_signature_rejected() {
        let store = Arc::new(MemorySubscriptionStore::new());
        let handler = WebhookHandler::new(store);

        let result = handler.parse_event("{}", "t=1,v1=deadbeef", "whsec_test");
        assert!(matches!(result, Err(PaymentError::WebhookSignature(_))));
    }
}
