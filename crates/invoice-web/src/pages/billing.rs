//! Billing Page

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_query_map;

use invoice_core::{CheckoutError, CheckoutInitiator, HttpCheckoutEndpoint, Plan};

use crate::api::{self, StripeJsRedirect};
use crate::components::UsageMeter;
use crate::state::use_usage;

/// Stripe price configured for the monthly Pro plan
pub const PRO_PRICE_ID: &str = "price_pro_monthly";

type Initiator = CheckoutInitiator<HttpCheckoutEndpoint, StripeJsRedirect>;

const TRIAL_FEATURES: &[&str] = &[
    "3 free invoice creations",
    "PDF download & email",
    "Basic templates",
    "Client management",
];

const PRO_FEATURES: &[&str] = &[
    "Unlimited invoices",
    "PDF download & email",
    "Premium templates",
    "Advanced client management",
    "Analytics & reporting",
    "Priority support",
];

fn feature_list(features: &'static [&'static str]) -> impl IntoView {
    view! {
        <ul class="features">
            {features.iter().map(|f| view! { <li>"✓ " {*f}</li> }).collect_view()}
        </ul>
    }
}

#[component]
pub fn BillingPage() -> impl IntoView {
    let usage = use_usage();
    let state = usage.snapshot();
    let query = use_query_map();
    let (pending, set_pending) = signal(None::<String>);
    let (notice, set_notice) = signal(None::<String>);

    let initiator = StoredValue::new_local(Rc::new(Initiator::new(
        api::checkout_endpoint(),
        StripeJsRedirect::from_document(),
    )));

    // Returning from the hosted checkout page
    let (succeeded, canceled) =
        query.with_untracked(|q| (q.get("success").is_some(), q.get("canceled").is_some()));
    if succeeded {
        spawn_local(async move {
            let message = match api::fetch_subscription_status().await {
                Ok(status) if usage.apply_remote_status(status) => {
                    "Welcome to Pro! Unlimited invoicing is now enabled.".to_string()
                }
                Ok(_) => "Payment received. Your plan will update shortly.".to_string(),
                Err(e) => format!("Payment received, but your plan could not be refreshed: {e}"),
            };
            set_notice.set(Some(message));
        });
    } else if canceled {
        set_notice.set(Some("Checkout canceled. You have not been charged.".into()));
    }

    let subscribe = move |price_id: &'static str| {
        let initiator = initiator.get_value();
        set_pending.set(Some(price_id.to_string()));
        spawn_local(async move {
            match initiator.start_checkout(price_id).await {
                Ok(_) | Err(CheckoutError::AlreadyInFlight(_)) => {}
                Err(e) => api::alert(&e.user_message()),
            }
            set_pending.set(initiator.in_flight());
        });
    };

    let is_pending = move |price_id: &str| pending.with(|p| p.as_deref() == Some(price_id));
    let on_trial = move || {
        let s = state.get();
        s.subscription_plan == Plan::Trial && !s.is_subscribed
    };
    let subscribed = move || state.get().is_subscribed;

    view! {
        <div class="billing">
            <header class="page-header">
                <h1>"Choose Your Plan"</h1>
                <p class="subtitle">
                    "Start with our free trial, then upgrade to unlock unlimited invoicing"
                </p>
            </header>

            {move || notice.get().map(|msg| view! { <div class="banner">{msg}</div> })}

            <section class="card">
                <h2>"Current Usage"</h2>
                <UsageMeter />
            </section>

            <div class="plans">
                <div class="plan" class:current=on_trial>
                    <div class="plan-header">
                        <h2>"Trial Plan"</h2>
                        <Show when=on_trial>
                            <span class="badge">"Current Plan"</span>
                        </Show>
                    </div>
                    <div class="price">"Free"</div>
                    <p class="plan-description">"Perfect to get started"</p>
                    {feature_list(TRIAL_FEATURES)}
                    <button class="btn" disabled=true>
                        {move || if on_trial() { "Current Plan" } else { "Free Forever" }}
                    </button>
                </div>

                <div class="plan featured" class:current=subscribed>
                    <Show when=move || !subscribed()>
                        <span class="ribbon">"Most Popular"</span>
                    </Show>
                    <div class="plan-header">
                        <h2>"Pro Plan"</h2>
                        <Show when=subscribed>
                            <span class="badge badge-pro">"Current Plan"</span>
                        </Show>
                    </div>
                    <div class="price">"$24.99"<span>"/month"</span></div>
                    <p class="plan-description">"per month"</p>
                    {feature_list(PRO_FEATURES)}
                    <Show
                        when=move || !subscribed()
                        fallback=|| view! { <button class="btn" disabled=true>"Current Plan"</button> }
                    >
                        <button
                            class="btn btn-primary"
                            on:click=move |_| subscribe(PRO_PRICE_ID)
                            disabled=move || is_pending(PRO_PRICE_ID)
                        >
                            {move || if is_pending(PRO_PRICE_ID) { "Processing..." } else { "Upgrade to Pro" }}
                        </button>
                    </Show>
                </div>
            </div>

            <section class="card">
                <h2>"Feature Comparison"</h2>
                <table class="comparison">
                    <thead>
                        <tr><th>"Feature"</th><th>"Trial"</th><th>"Pro"</th></tr>
                    </thead>
                    <tbody>
                        <tr><td>"Invoice Creation"</td><td>"3 invoices"</td><td>"Unlimited"</td></tr>
                        <tr><td>"PDF Download"</td><td>"✓"</td><td>"✓"</td></tr>
                        <tr><td>"Email Invoices"</td><td>"✓"</td><td>"✓"</td></tr>
                        <tr><td>"Client Management"</td><td>"Basic"</td><td>"Advanced"</td></tr>
                        <tr><td>"Analytics"</td><td>"✕"</td><td>"✓"</td></tr>
                        <tr><td>"Priority Support"</td><td>"✕"</td><td>"✓"</td></tr>
                    </tbody>
                </table>
            </section>
        </div>
    }
}
