//! Settings Page
//!
//! Read-only account overview: who is signed in and which plan applies.

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;

use invoice_core::{TRIAL_LIMIT, UsageState};

use crate::api::{self, SessionUser};
use crate::components::{UsageMeter, plan_label};
use crate::state::use_usage;

fn trial_remaining(state: &UsageState) -> String {
    if state.is_subscribed {
        "Unlimited invoices".into()
    } else {
        let left = TRIAL_LIMIT.saturating_sub(state.invoice_count);
        format!("{left} of {TRIAL_LIMIT} free invoices left")
    }
}

#[component]
pub fn SettingsPage() -> impl IntoView {
    let state = use_usage().snapshot();
    let (user, set_user) = signal(None::<SessionUser>);
    let (lookup_error, set_lookup_error) = signal(None::<String>);

    spawn_local(async move {
        match api::fetch_session().await {
            Ok(session) => set_user.set(session),
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed");
                set_lookup_error.set(Some(e));
            }
        }
    });

    view! {
        <div class="settings">
            <header class="page-header">
                <div>
                    <h1>"Settings"</h1>
                    <p class="subtitle">"Your account and plan"</p>
                </div>
            </header>

            <section class="card">
                <h2>"Profile"</h2>
                {move || lookup_error.get().map(|msg| view! { <div class="banner banner-error">{msg}</div> })}
                {move || match user.get() {
                    Some(u) => view! {
                        <dl>
                            <dt>"Name"</dt><dd>{u.display_name().to_string()}</dd>
                            <dt>"Email"</dt><dd>{u.email.clone().unwrap_or_default()}</dd>
                            <dt>"User ID"</dt><dd class="muted">{u.id.clone()}</dd>
                        </dl>
                    }
                    .into_any(),
                    None => view! { <p class="muted">"Not signed in."</p> }.into_any(),
                }}
            </section>

            <section class="card">
                <h2>"Plan"</h2>
                <p class="plan-name">{move || plan_label(&state.get())}</p>
                <p>{move || trial_remaining(&state.get())}</p>
                <UsageMeter />
                <Show when=move || !state.get().is_subscribed>
                    <A href="/billing" attr:class="btn btn-primary">"Upgrade to Pro"</A>
                </Show>
            </section>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoice_core::Plan;

    #[test]
    fn test_trial_remaining() {
        let mut state = UsageState::default();
        assert_eq!(trial_remaining(&state), "3 of 3 free invoices left");
        state.invoice_count = 5;
        assert_eq!(trial_remaining(&state), "0 of 3 free invoices left");
        state.is_subscribed = true;
        state.subscription_plan = Plan::Pro;
        assert_eq!(trial_remaining(&state), "Unlimited invoices");
    }
}
