//! API Client and Browser Adapters
//!
//! `BrowserStorage` backs the usage tracker with `window.localStorage`,
//! `StripeJsRedirect` hands checkout sessions to Stripe.js. Both are
//! looked up lazily so a missing global degrades into an error rather
//! than a panic.

use async_trait::async_trait;
use js_sys::{Function, Object, Promise, Reflect};
use serde::Deserialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use invoice_core::{
    CheckoutError, CheckoutRedirect, CheckoutSession, HttpCheckoutEndpoint, KeyValueStore,
    StorageError, SubscriptionStatus,
};

/// `<meta>` tag carrying the Stripe publishable key
pub const PUBLISHABLE_KEY_META: &str = "stripe-publishable-key";

const FALLBACK_ORIGIN: &str = "http://localhost:3000";

/// Page origin; reqwest needs absolute URLs
pub fn origin() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| FALLBACK_ORIGIN.into())
}

fn api_url(path: &str) -> String {
    format!("{}{path}", origin())
}

fn js_error(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            Reflect::get(value, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Show a blocking browser alert
pub fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}

/// Full-page navigation outside the router
pub fn navigate_to(url: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_href(url);
    }
}

fn meta_content(name: &str) -> Option<String> {
    web_sys::window()?
        .document()?
        .query_selector(&format!("meta[name=\"{name}\"]"))
        .ok()??
        .get_attribute("content")
        .filter(|content| !content.is_empty())
}

// ============================================================================
// Storage
// ============================================================================

/// `window.localStorage` adapter
///
/// Holds no handle, so it stays `Send + Sync` and can live in Leptos context.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStorage;

impl BrowserStorage {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".into()))?
            .local_storage()
            .map_err(|e| StorageError::Unavailable(js_error(&e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage().ok()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Write {
                key: key.into(),
                reason: js_error(&e),
            })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Write {
                key: key.into(),
                reason: js_error(&e),
            })
    }
}

// ============================================================================
// Stripe.js
// ============================================================================

/// Redirects through the global `Stripe(publishableKey)` client
#[derive(Clone, Debug)]
pub struct StripeJsRedirect {
    publishable_key: Option<String>,
}

impl StripeJsRedirect {
    /// Read the publishable key from the page's `<meta>` tag
    pub fn from_document() -> Self {
        let publishable_key = meta_content(PUBLISHABLE_KEY_META);
        if publishable_key.is_none() {
            tracing::warn!("Stripe publishable key missing; checkout disabled");
        }
        Self { publishable_key }
    }

    fn client(&self) -> Option<JsValue> {
        let key = self.publishable_key.as_deref()?;
        let constructor: Function = Reflect::get(&js_sys::global(), &JsValue::from_str("Stripe"))
            .ok()?
            .dyn_into()
            .ok()?;
        constructor
            .call1(&JsValue::NULL, &JsValue::from_str(key))
            .ok()
            .filter(|client| client.is_object())
    }
}

#[async_trait(?Send)]
impl CheckoutRedirect for StripeJsRedirect {
    async fn redirect_to_checkout(&self, session: &CheckoutSession) -> Result<(), CheckoutError> {
        let stripe = self.client().ok_or(CheckoutError::ProviderUnavailable)?;
        let redirect: Function = Reflect::get(&stripe, &JsValue::from_str("redirectToCheckout"))
            .ok()
            .and_then(|f| f.dyn_into().ok())
            .ok_or(CheckoutError::ProviderUnavailable)?;

        let options = Object::new();
        Reflect::set(
            &options,
            &JsValue::from_str("sessionId"),
            &JsValue::from_str(&session.session_id),
        )
        .map_err(|e| CheckoutError::Redirect(js_error(&e)))?;

        let promise: Promise = redirect
            .call1(&stripe, &options)
            .map_err(|e| CheckoutError::Redirect(js_error(&e)))?
            .dyn_into()
            .map_err(|_| CheckoutError::Redirect("redirectToCheckout returned no promise".into()))?;

        let result = JsFuture::from(promise)
            .await
            .map_err(|e| CheckoutError::Redirect(js_error(&e)))?;

        // Resolves with `{ error }` only when the redirect could not happen
        let error = Reflect::get(&result, &JsValue::from_str("error")).unwrap_or(JsValue::UNDEFINED);
        if error.is_undefined() || error.is_null() {
            Ok(())
        } else {
            Err(CheckoutError::Redirect(js_error(&error)))
        }
    }
}

/// Checkout endpoint on this origin
pub fn checkout_endpoint() -> HttpCheckoutEndpoint {
    HttpCheckoutEndpoint::new(&origin())
}

// ============================================================================
// Server API
// ============================================================================

/// Signed-in user as reported by `/api/session`
#[derive(Clone, Debug, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl SessionUser {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    response
        .json::<ErrorBody>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| format!("Request failed ({status})"))
}

/// Current session, `None` when signed out
pub async fn fetch_session() -> Result<Option<SessionUser>, String> {
    let response = reqwest::Client::new()
        .get(api_url("/api/session"))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(error_message(response).await);
    }
    response.json().await.map(Some).map_err(|e| e.to_string())
}

/// Subscription state recorded server-side by the Stripe webhook
pub async fn fetch_subscription_status() -> Result<SubscriptionStatus, String> {
    let response = reqwest::Client::new()
        .get(api_url("/api/subscription"))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(error_message(response).await);
    }
    response.json().await.map_err(|e| e.to_string())
}

#[derive(Deserialize)]
struct SignOutBody {
    url: String,
}

/// End the session, returning where to send the browser
pub async fn sign_out() -> Result<String, String> {
    let response = reqwest::Client::new()
        .post(api_url("/api/auth/signout"))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(error_message(response).await);
    }
    response
        .json::<SignOutBody>()
        .await
        .map(|body| body.url)
        .map_err(|e| e.to_string())
}
