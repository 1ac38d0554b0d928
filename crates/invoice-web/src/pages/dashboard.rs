//! Dashboard Page

use leptos::prelude::*;
use leptos_router::components::A;

use invoice_core::InvoiceStats;

use crate::components::{StatCard, StatusBadge, TrialBanner, UsageMeter, money};
use crate::state::{use_invoices, use_usage};

const RECENT_LIMIT: usize = 5;

#[component]
pub fn DashboardPage() -> impl IntoView {
    let state = use_usage().snapshot();
    let invoices = use_invoices().invoices();

    let stats = Memo::new(move |_| invoices.with(|list| InvoiceStats::from_invoices(list)));
    let recent = move || {
        invoices.with(|list| list.iter().rev().take(RECENT_LIMIT).cloned().collect::<Vec<_>>())
    };
    let remaining = move || {
        state.get().remaining_trial_invoices().map_or_else(
            || "Unlimited invoices on Pro".to_string(),
            |left| format!("{left} free invoices left"),
        )
    };

    view! {
        <div class="dashboard">
            <header class="page-header">
                <div>
                    <h1>"Dashboard"</h1>
                    <p class="subtitle">{remaining}</p>
                </div>
            </header>

            <TrialBanner />

            <section class="card">
                <UsageMeter />
            </section>

            <div class="stats">
                <StatCard
                    title="Total Invoices"
                    value=Signal::derive(move || stats.get().total_invoices.to_string())
                />
                <StatCard
                    title="Revenue"
                    value=Signal::derive(move || money(stats.get().total_revenue))
                />
                <StatCard
                    title="Outstanding"
                    value=Signal::derive(move || {
                        let s = stats.get();
                        money(s.pending_amount + s.overdue_amount)
                    })
                />
            </div>

            <div class="quick-actions">
                <A href="/invoices/new" attr:class="action">"Create Invoice"</A>
                <A href="/invoices" attr:class="action">"View Invoices"</A>
                <A href="/billing" attr:class="action">"Billing"</A>
            </div>

            <section class="card">
                <h2>"Recent Invoices"</h2>
                <Show
                    when=move || !recent().is_empty()
                    fallback=|| view! { <p class="empty">"No invoices yet."</p> }
                >
                    <ul class="recent">
                        <For
                            each=recent
                            key=|inv| inv.id.clone()
                            children=|inv| view! {
                                <li>
                                    <span>{inv.id.clone()}</span>
                                    <span>{inv.client.clone()}</span>
                                    <span>{money(inv.amount)}</span>
                                    <StatusBadge status=inv.status />
                                </li>
                            }
                        />
                    </ul>
                </Show>
            </section>
        </div>
    }
}
