//! Invoice Assistant HTTP Server
//!
//! Axum-based server behind the WASM dashboard: checkout session creation,
//! subscription lookups, session introspection and the Stripe webhook.

mod auth;
mod config;
mod handlers;
mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use invoice_payments::StripeClient;

use crate::config::ServerConfig;
use crate::handlers::{
    auth_redirect, create_checkout_session, current_session, health_check, sign_out,
    stripe_webhook, subscription_status,
};
use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/health", get(health_check))
        // Payments
        .route("/api/create-checkout-session", post(create_checkout_session))
        .route("/api/subscription", get(subscription_status))
        .route("/api/webhooks/stripe", post(stripe_webhook))
        // Session
        .route("/api/session", get(current_session))
        .route("/api/auth/signout", post(sign_out))
        .route("/auth/redirect", get(auth_redirect))
        // Static files (WASM frontend)
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env();

    let stripe = StripeClient::from_env().ok();
    if stripe.is_some() {
        tracing::info!("✓ Stripe configured");
    } else {
        tracing::warn!("⚠ Stripe not configured - payments disabled");
        tracing::warn!("  Set STRIPE_SECRET_KEY and STRIPE_WEBHOOK_SECRET in .env");
    }

    if config.auth_secret.is_none() {
        tracing::warn!("⚠ AUTH_SECRET not set - signed-in endpoints will return 401");
    }

    let addr = config.bind_addr.clone();
    let app_url = config.app_url.clone();
    let state = AppState::new(config, stripe);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 invoice-server listening on http://{}", addr);
    tracing::info!("   public URL: {}", app_url);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                       - Health check");
    tracing::info!("  POST /api/create-checkout-session  - Start Stripe checkout");
    tracing::info!("  GET  /api/subscription             - Subscription status");
    tracing::info!("  GET  /api/session                  - Current user");
    tracing::info!("  POST /api/auth/signout             - Sign out");
    tracing::info!("  GET  /auth/redirect                - Post-login redirect");
    tracing::info!("  POST /api/webhooks/stripe          - Stripe webhooks");

    axum::serve(listener, router(state)).await?;

    Ok(())
}
