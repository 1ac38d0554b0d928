//! Checkout Initiation
//!
//! Client half of the Stripe Checkout (Hosted) flow:
//!
//! ```text
//! ┌─────────────┐ priceId ┌──────────────────────────────┐ sessionId ┌─────────────────┐
//! │ Billing UI  │────────▶│ POST /api/create-checkout-.. │──────────▶│ Stripe redirect │
//! └─────────────┘         └──────────────────────────────┘           └─────────────────┘
//! ```
//!
//! Both hops sit behind ports ([`CheckoutEndpoint`], [`CheckoutRedirect`]) so
//! the browser wires in `reqwest` and Stripe.js while tests wire in fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

use crate::error::CheckoutError;

/// Server route that creates provider checkout sessions
pub const CHECKOUT_SESSION_PATH: &str = "/api/create-checkout-session";

/// Fallback when a failed reply carries no `error` field
pub const GENERIC_CHECKOUT_ERROR: &str = "Failed to create checkout session";

/// Body of the checkout-session request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(rename = "priceId")]
    pub price_id: String,
}

/// Provider checkout session handle
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Raw HTTP reply from the checkout endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Checkout endpoint reply, parsed without trusting field presence
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutReply {
    Session(CheckoutSession),
    Failed { status: u16, message: String },
}

impl CheckoutReply {
    pub fn parse(reply: &HttpReply) -> Self {
        let body: serde_json::Value = serde_json::from_str(&reply.body).unwrap_or_default();

        if reply.is_success() {
            if let Some(id) = body
                .get("sessionId")
                .and_then(serde_json::Value::as_str)
                .filter(|id| !id.is_empty())
            {
                return Self::Session(CheckoutSession {
                    session_id: id.to_string(),
                });
            }
        }

        let message = body
            .get("error")
            .and_then(serde_json::Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(GENERIC_CHECKOUT_ERROR)
            .to_string();

        Self::Failed {
            status: reply.status,
            message,
        }
    }
}

/// Server endpoint that creates checkout sessions
///
/// `Err` is reserved for transport failures; HTTP error statuses come back as
/// an [`HttpReply`].
#[async_trait(?Send)]
pub trait CheckoutEndpoint {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<HttpReply, CheckoutError>;
}

/// Payment provider's client-side redirect primitive
#[async_trait(?Send)]
pub trait CheckoutRedirect {
    /// Send the browser to the hosted checkout page.
    ///
    /// Returns `ProviderUnavailable` when the provider client failed to load.
    async fn redirect_to_checkout(&self, session: &CheckoutSession) -> Result<(), CheckoutError>;
}

/// `reqwest`-backed checkout endpoint
#[derive(Clone, Debug)]
pub struct HttpCheckoutEndpoint {
    client: reqwest::Client,
    url: String,
}

impl HttpCheckoutEndpoint {
    /// `base_url` is the application origin, e.g. `https://app.example.com`
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}{CHECKOUT_SESSION_PATH}", base_url.trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait(?Send)]
impl CheckoutEndpoint for HttpCheckoutEndpoint {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<HttpReply, CheckoutError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| CheckoutError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(HttpReply { status, body })
    }
}

/// Clears the in-flight slot on every exit path
struct InFlightGuard<'a> {
    slot: &'a Mutex<Option<String>>,
    price_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_deref() == Some(self.price_id.as_str()) {
            *slot = None;
        }
    }
}

/// Requests a checkout session and hands it to the provider redirect
///
/// Holds an advisory in-flight slot (the selected price id) so the UI can
/// disable re-submission while a request is pending. It is not a mutex:
/// a different price id simply takes over the slot.
pub struct CheckoutInitiator<E, R> {
    endpoint: E,
    redirect: R,
    in_flight: Mutex<Option<String>>,
}

impl<E: CheckoutEndpoint, R: CheckoutRedirect> CheckoutInitiator<E, R> {
    pub const fn new(endpoint: E, redirect: R) -> Self {
        Self {
            endpoint,
            redirect,
            in_flight: Mutex::new(None),
        }
    }

    /// Price id of the pending checkout, if any
    pub fn in_flight(&self) -> Option<String> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_in_flight(&self, price_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            == Some(price_id)
    }

    fn acquire(&self, price_id: &str) -> Result<InFlightGuard<'_>, CheckoutError> {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_deref() == Some(price_id) {
            return Err(CheckoutError::AlreadyInFlight(price_id.to_string()));
        }
        *slot = Some(price_id.to_string());
        Ok(InFlightGuard {
            slot: &self.in_flight,
            price_id: price_id.to_string(),
        })
    }

    /// Run one checkout attempt for `price_id`
    ///
    /// Returns the session that was handed to the redirect. Any failure ends
    /// the attempt; the user retries by invoking this again.
    pub async fn start_checkout(&self, price_id: &str) -> Result<CheckoutSession, CheckoutError> {
        let _guard = self.acquire(price_id)?;

        let request = CheckoutRequest {
            price_id: price_id.to_string(),
        };

        tracing::info!(price_id, "Requesting checkout session");
        let reply = self.endpoint.create_session(&request).await.map_err(|e| {
            tracing::warn!(price_id, error = %e, "Checkout endpoint unreachable");
            e
        })?;

        let session = match CheckoutReply::parse(&reply) {
            CheckoutReply::Session(session) => session,
            CheckoutReply::Failed { status, message } if reply.is_success() => {
                tracing::warn!(price_id, status, %message, "Checkout reply missing session id");
                return Err(CheckoutError::MissingSession);
            }
            CheckoutReply::Failed { status, message } => {
                tracing::warn!(price_id, status, %message, "Checkout session rejected");
                return Err(CheckoutError::Rejected { status, message });
            }
        };

        tracing::info!(price_id, session_id = %session.session_id, "Redirecting to checkout");
        self.redirect.redirect_to_checkout(&session).await?;

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use tokio::sync::oneshot;

    struct FixedEndpoint {
        reply: Result<HttpReply, CheckoutError>,
        calls: Cell<u32>,
        last_price: RefCell<Option<String>>,
    }

    impl FixedEndpoint {
        fn new(status: u16, body: &str) -> Self {
            Self {
                reply: Ok(HttpReply::new(status, body)),
                calls: Cell::new(0),
                last_price: RefCell::new(None),
            }
        }

        fn unreachable() -> Self {
            Self {
                reply: Err(CheckoutError::Transport("connection refused".into())),
                calls: Cell::new(0),
                last_price: RefCell::new(None),
            }
        }
    }

    #[async_trait(?Send)]
    impl CheckoutEndpoint for FixedEndpoint {
        async fn create_session(
            &self,
            request: &CheckoutRequest,
        ) -> Result<HttpReply, CheckoutError> {
            self.calls.set(self.calls.get() + 1);
            *self.last_price.borrow_mut() = Some(request.price_id.clone());
            self.reply.clone()
        }
    }

    struct PendingEndpoint {
        reply: RefCell<Option<oneshot::Receiver<HttpReply>>>,
    }

    #[async_trait(?Send)]
    impl CheckoutEndpoint for PendingEndpoint {
        async fn create_session(
            &self,
            _request: &CheckoutRequest,
        ) -> Result<HttpReply, CheckoutError> {
            let rx = self.reply.borrow_mut().take();
            match rx {
                Some(rx) => rx
                    .await
                    .map_err(|e| CheckoutError::Transport(e.to_string())),
                None => Err(CheckoutError::Transport("already used".into())),
            }
        }
    }

    #[derive(Default)]
    struct RecordingRedirect {
        unavailable: bool,
        sessions: RefCell<Vec<String>>,
    }

    #[async_trait(?Send)]
    impl CheckoutRedirect for RecordingRedirect {
        async fn redirect_to_checkout(
            &self,
            session: &CheckoutSession,
        ) -> Result<(), CheckoutError> {
            if self.unavailable {
                return Err(CheckoutError::ProviderUnavailable);
            }
            self.sessions.borrow_mut().push(session.session_id.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_success_redirects_once() {
        let initiator = CheckoutInitiator::new(
            FixedEndpoint::new(200, r#"{"sessionId":"cs_test_123"}"#),
            RecordingRedirect::default(),
        );

        let session = initiator.start_checkout("price_pro_monthly").await.unwrap();

        assert_eq!(session.session_id, "cs_test_123");
        assert_eq!(*initiator.redirect.sessions.borrow(), vec!["cs_test_123"]);
        assert_eq!(initiator.endpoint.calls.get(), 1);
        assert_eq!(
            initiator.endpoint.last_price.borrow().as_deref(),
            Some("price_pro_monthly")
        );
    }

    #[tokio::test]
    async fn test_error_status_surfaces_server_message() {
        let initiator = CheckoutInitiator::new(
            FixedEndpoint::new(400, r#"{"error":"Invalid price"}"#),
            RecordingRedirect::default(),
        );

        let err = initiator.start_checkout("price_bogus").await.unwrap_err();

        assert!(err.user_message().contains("Invalid price"));
        assert!(initiator.redirect.sessions.borrow().is_empty());
        assert!(!initiator.is_in_flight("price_bogus"));
    }

    #[tokio::test]
    async fn test_error_status_without_body_uses_generic_message() {
        let initiator = CheckoutInitiator::new(
            FixedEndpoint::new(502, "<html>Bad Gateway</html>"),
            RecordingRedirect::default(),
        );

        let err = initiator.start_checkout("price_pro_monthly").await.unwrap_err();

        assert_eq!(
            err,
            CheckoutError::Rejected {
                status: 502,
                message: GENERIC_CHECKOUT_ERROR.into(),
            }
        );
    }

    #[tokio::test]
    async fn test_success_without_session_id() {
        let initiator = CheckoutInitiator::new(
            FixedEndpoint::new(200, r#"{"sessionId":42}"#),
            RecordingRedirect::default(),
        );

        let err = initiator.start_checkout("price_pro_monthly").await.unwrap_err();

        assert_eq!(err, CheckoutError::MissingSession);
        assert!(initiator.redirect.sessions.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_provider_unavailable() {
        let initiator = CheckoutInitiator::new(
            FixedEndpoint::new(200, r#"{"sessionId":"cs_test_123"}"#),
            RecordingRedirect {
                unavailable: true,
                ..Default::default()
            },
        );

        let err = initiator.start_checkout("price_pro_monthly").await.unwrap_err();

        assert_eq!(err, CheckoutError::ProviderUnavailable);
        assert_eq!(err.user_message(), "Payment provider not available.");
        assert!(initiator.in_flight().is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let initiator =
            CheckoutInitiator::new(FixedEndpoint::unreachable(), RecordingRedirect::default());

        let err = initiator.start_checkout("price_pro_monthly").await.unwrap_err();

        assert!(matches!(err, CheckoutError::Transport(_)));
        assert_eq!(initiator.endpoint.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_in_flight_only_while_pending() {
        let (tx, rx) = oneshot::channel();
        let initiator = CheckoutInitiator::new(
            PendingEndpoint {
                reply: RefCell::new(Some(rx)),
            },
            RecordingRedirect::default(),
        );
        assert!(!initiator.is_in_flight("price_pro_monthly"));

        let observer = {
            let initiator = &initiator;
            async move {
                tokio::task::yield_now().await;
                let during = initiator.is_in_flight("price_pro_monthly");
                let resubmit = initiator.start_checkout("price_pro_monthly").await;
                let _ = tx.send(HttpReply::new(200, r#"{"sessionId":"cs_test_123"}"#));
                (during, resubmit)
            }
        };

        let (result, (during, resubmit)) =
            tokio::join!(initiator.start_checkout("price_pro_monthly"), observer);

        assert!(during);
        assert_eq!(
            resubmit,
            Err(CheckoutError::AlreadyInFlight("price_pro_monthly".into()))
        );
        assert_eq!(result.unwrap().session_id, "cs_test_123");
        assert!(!initiator.is_in_flight("price_pro_monthly"));
        assert_eq!(initiator.redirect.sessions.borrow().len(), 1);
    }

    #[test]
    fn test_reply_parsing() {
        assert_eq!(
            CheckoutReply::parse(&HttpReply::new(201, r#"{"sessionId":"cs_1"}"#)),
            CheckoutReply::Session(CheckoutSession {
                session_id: "cs_1".into()
            })
        );
        assert_eq!(
            CheckoutReply::parse(&HttpReply::new(500, "")),
            CheckoutReply::Failed {
                status: 500,
                message: GENERIC_CHECKOUT_ERROR.into(),
            }
        );
    }

    #[test]
    fn test_endpoint_url() {
        let endpoint = HttpCheckoutEndpoint::new("https://app.example.com/");
        assert_eq!(
            endpoint.url(),
            "https://app.example.com/api/create-checkout-session"
        );
    }
}
