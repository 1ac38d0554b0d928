//! UI Components

use leptos::prelude::*;
use leptos_router::components::A;
use rust_decimal::Decimal;

use invoice_core::{InvoiceStatus, TRIAL_LIMIT, UsageState};

use crate::state::use_usage;

/// `$1,234.50`-style display
pub fn money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let text = format!("{rounded:.2}");
    let (sign, digits) = text.strip_prefix('-').map_or(("", text.as_str()), |d| ("-", d));
    let (whole, cents) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{cents}")
}

pub fn plan_label(state: &UsageState) -> &'static str {
    if state.is_subscribed {
        "Pro Plan"
    } else if state.is_trial_exhausted() {
        "Trial Expired"
    } else {
        "Trial"
    }
}

/// Invoices used against the trial allowance
#[component]
pub fn UsageMeter() -> impl IntoView {
    let state = use_usage().snapshot();

    let width = move || {
        let s = state.get();
        if s.is_subscribed {
            "100%".to_string()
        } else {
            let pct = (s.invoice_count.min(TRIAL_LIMIT) * 100) / TRIAL_LIMIT;
            format!("{pct}%")
        }
    };

    let used = move || {
        let s = state.get();
        let limit = if s.is_subscribed { "∞".to_string() } else { TRIAL_LIMIT.to_string() };
        format!("Invoices created: {} / {limit}", s.invoice_count)
    };

    let badge_class = move || {
        let s = state.get();
        if s.is_subscribed {
            "badge badge-pro"
        } else if s.is_trial_exhausted() {
            "badge badge-expired"
        } else {
            "badge"
        }
    };

    view! {
        <div class="usage-meter">
            <div>
                <p class="usage-count">{used}</p>
                <div class="meter">
                    <div class="meter-fill" style:width=width></div>
                </div>
            </div>
            <span class=badge_class>{move || plan_label(&state.get())}</span>
        </div>
    }
}

/// Upgrade call-to-action once the trial is used up
#[component]
pub fn TrialBanner() -> impl IntoView {
    let state = use_usage().snapshot();
    let show = move || state.get().is_trial_exhausted();

    view! {
        <Show when=show>
            <div class="banner banner-warning">
                <p>"You've used all your free invoices."</p>
                <A href="/billing" attr:class="btn btn-primary">"Upgrade to Pro"</A>
            </div>
        </Show>
    }
}

#[component]
pub fn StatusBadge(status: InvoiceStatus) -> impl IntoView {
    let class = format!("badge status-{}", status.as_str());
    view! { <span class=class>{status.label()}</span> }
}

#[component]
pub fn StatCard(title: &'static str, #[prop(into)] value: Signal<String>) -> impl IntoView {
    view! {
        <div class="stat-card">
            <p class="stat-title">{title}</p>
            <p class="stat-value">{move || value.get()}</p>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_groups_thousands() {
        assert_eq!(money(dec!(0)), "$0.00");
        assert_eq!(money(dec!(12.5)), "$12.50");
        assert_eq!(money(dec!(1234.567)), "$1,234.57");
        assert_eq!(money(dec!(1000000)), "$1,000,000.00");
        assert_eq!(money(dec!(-950)), "-$950.00");
    }

    #[test]
    fn test_plan_label() {
        let mut state = UsageState::default();
        assert_eq!(plan_label(&state), "Trial");
        state.invoice_count = 3;
        assert_eq!(plan_label(&state), "Trial Expired");
        state.is_subscribed = true;
        assert_eq!(plan_label(&state), "Pro Plan");
    }
}
