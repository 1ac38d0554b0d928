//! HTTP Handlers

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect},
};
use serde::{Deserialize, Serialize};

use invoice_core::{CheckoutSession, SubscriptionStatus};
use invoice_payments::{
    CheckoutRequest as PaymentCheckoutRequest, PaymentError, SubscriptionStore, WebhookHandler,
};

use crate::auth::{CurrentUser, MaybeUser, SESSION_COOKIE, SessionUser, resolve_redirect};
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub stripe_configured: bool,
    pub auth_configured: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

/// Body of `POST /api/create-checkout-session`
#[derive(Debug, Deserialize)]
pub struct CreateCheckoutBody {
    #[serde(rename = "priceId", default)]
    pub price_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    #[serde(rename = "callbackUrl", default)]
    pub callback_url: String,
}

#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub url: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        stripe_configured: state.stripe.is_some(),
        auth_configured: state.sessions.is_some(),
    })
}

/// Create Stripe checkout session for a dashboard price id
pub async fn create_checkout_session(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(payload): Json<CreateCheckoutBody>,
) -> Result<Json<CheckoutSession>, ApiError> {
    let price_id = payload.price_id.trim();
    if price_id.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing priceId", "MISSING_PRICE"));
    }

    let stripe = state.stripe.as_ref().ok_or_else(|| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Payments not configured",
            "PAYMENTS_DISABLED",
        )
    })?;

    let request = PaymentCheckoutRequest {
        price_id: price_id.to_string(),
        success_url: state.config.checkout_success_url(),
        cancel_url: state.config.checkout_cancel_url(),
        customer_email: user.as_ref().and_then(|u| u.email.clone()),
        user_id: user.map(|u| u.id),
    };

    let session = stripe
        .create_checkout_session(request)
        .await
        .map_err(checkout_error)?;

    Ok(Json(CheckoutSession {
        session_id: session.id,
    }))
}

/// Provider refusals are the caller's fault (400), anything else is ours (500)
fn checkout_error(e: PaymentError) -> ApiError {
    if let PaymentError::Rejected(_) = e {
        tracing::warn!("Checkout rejected: {}", e);
        api_error(StatusCode::BAD_REQUEST, e.user_message(), "INVALID_PRICE")
    } else {
        tracing::error!("Checkout error: {}", e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.user_message(),
            "CHECKOUT_ERROR",
        )
    }
}

/// Subscription status for the signed-in user
pub async fn subscription_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SubscriptionStatus>, ApiError> {
    state.subscriptions.status(&user.id).map(Json).map_err(|e| {
        tracing::error!("Subscription lookup error: {}", e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.user_message(),
            "SUBSCRIPTION_ERROR",
        )
    })
}

/// Signed-in user's id, name and email
pub async fn current_session(CurrentUser(user): CurrentUser) -> Json<SessionUser> {
    Json(user)
}

/// Post-login redirect, kept on our origin
pub async fn auth_redirect(
    State(state): State<AppState>,
    Query(query): Query<RedirectQuery>,
) -> Redirect {
    Redirect::to(&resolve_redirect(&query.callback_url, &state.config.app_url))
}

/// Drop the session cookie and point the client at the login page
pub async fn sign_out() -> impl IntoResponse {
    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax"),
        )],
        Json(SignOutResponse { url: "/login" }),
    )
}

/// Stripe webhook handler
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, ApiError> {
    let stripe = state.stripe.as_ref().ok_or_else(|| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Payments not configured",
            "PAYMENTS_DISABLED",
        )
    })?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            api_error(
                StatusCode::BAD_REQUEST,
                "Missing Stripe signature",
                "MISSING_SIGNATURE",
            )
        })?;

    let handler = WebhookHandler::new(state.subscriptions.clone());

    let event = handler
        .parse_event(&body, signature, stripe.webhook_secret())
        .map_err(|e| {
            tracing::warn!("Webhook signature failed: {}", e);
            api_error(StatusCode::BAD_REQUEST, "Invalid signature", "INVALID_SIGNATURE")
        })?;

    handler.handle(&event).map_err(|e| {
        tracing::error!("Webhook processing error: {}", e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Webhook processing failed",
            "WEBHOOK_ERROR",
        )
    })?;

    Ok(StatusCode::OK)
}
