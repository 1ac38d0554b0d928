//! Invoices Page

use leptos::prelude::*;
use leptos_router::components::A;

use invoice_core::invoice::{SortDirection, SortField, StatusFilter};
use invoice_core::{InvoiceQuery, InvoiceStats, InvoiceStatus};

use crate::components::{StatCard, StatusBadge, TrialBanner, money};
use crate::state::use_invoices;

fn status_filter(value: &str) -> StatusFilter {
    match value {
        "paid" => StatusFilter::Only(InvoiceStatus::Paid),
        "pending" => StatusFilter::Only(InvoiceStatus::Pending),
        "overdue" => StatusFilter::Only(InvoiceStatus::Overdue),
        "draft" => StatusFilter::Only(InvoiceStatus::Draft),
        _ => StatusFilter::All,
    }
}

fn sort_field(value: &str) -> SortField {
    match value {
        "client" => SortField::Client,
        "amount" => SortField::Amount,
        "due" => SortField::DueDate,
        "status" => SortField::Status,
        _ => SortField::Id,
    }
}

#[component]
pub fn InvoicesPage() -> impl IntoView {
    let invoices = use_invoices().invoices();
    let query = RwSignal::new(InvoiceQuery::default());

    let stats = Memo::new(move |_| invoices.with(|list| InvoiceStats::from_invoices(list)));
    let visible = move || {
        invoices.with(|list| {
            query.with(|q| q.apply(list).into_iter().cloned().collect::<Vec<_>>())
        })
    };

    let toggle_direction = move |_| {
        query.update(|q| {
            q.direction = match q.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
        });
    };

    view! {
        <div class="invoices">
            <header class="page-header">
                <div>
                    <h1>"Invoices"</h1>
                    <p class="subtitle">"Manage and track all your invoices"</p>
                </div>
                <A href="/invoices/new" attr:class="btn btn-primary">"+ New Invoice"</A>
            </header>

            <TrialBanner />

            <div class="stats">
                <StatCard
                    title="Total Invoices"
                    value=Signal::derive(move || stats.get().total_invoices.to_string())
                />
                <StatCard
                    title="Total Revenue"
                    value=Signal::derive(move || money(stats.get().total_revenue))
                />
                <StatCard
                    title="Pending"
                    value=Signal::derive(move || money(stats.get().pending_amount))
                />
                <StatCard
                    title="Overdue"
                    value=Signal::derive(move || money(stats.get().overdue_amount))
                />
            </div>

            <div class="filters">
                <input
                    type="search"
                    placeholder="Search invoices or clients..."
                    on:input=move |ev| query.update(|q| q.search = event_target_value(&ev))
                />
                <select on:change=move |ev| {
                    query.update(|q| q.status = status_filter(&event_target_value(&ev)));
                }>
                    <option value="all">"All statuses"</option>
                    <option value="paid">"Paid"</option>
                    <option value="pending">"Pending"</option>
                    <option value="overdue">"Overdue"</option>
                    <option value="draft">"Draft"</option>
                </select>
                <select on:change=move |ev| {
                    query.update(|q| q.sort_field = sort_field(&event_target_value(&ev)));
                }>
                    <option value="id">"Invoice #"</option>
                    <option value="client">"Client"</option>
                    <option value="amount">"Amount"</option>
                    <option value="due">"Due date"</option>
                    <option value="status">"Status"</option>
                </select>
                <button class="btn" on:click=toggle_direction>
                    {move || match query.with(|q| q.direction) {
                        SortDirection::Asc => "↑",
                        SortDirection::Desc => "↓",
                    }}
                </button>
            </div>

            <Show
                when=move || !visible().is_empty()
                fallback=|| view! { <p class="empty">"No invoices found."</p> }
            >
                <table class="invoice-table">
                    <thead>
                        <tr>
                            <th>"Invoice"</th>
                            <th>"Client"</th>
                            <th>"Amount"</th>
                            <th>"Status"</th>
                            <th>"Due"</th>
                        </tr>
                    </thead>
                    <tbody>
                        <For
                            each=visible
                            key=|inv| (inv.id.clone(), inv.status, inv.amount)
                            children=|inv| view! {
                                <tr>
                                    <td>{inv.id.clone()}</td>
                                    <td>
                                        <div>{inv.client.clone()}</div>
                                        <div class="muted">{inv.client_email.clone()}</div>
                                    </td>
                                    <td>{money(inv.amount)}</td>
                                    <td><StatusBadge status=inv.status /></td>
                                    <td>{inv.due_date.to_string()}</td>
                                </tr>
                            }
                        />
                    </tbody>
                </table>
            </Show>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_values_map_to_query() {
        assert_eq!(status_filter("overdue"), StatusFilter::Only(InvoiceStatus::Overdue));
        assert_eq!(status_filter("all"), StatusFilter::All);
        assert_eq!(sort_field("due"), SortField::DueDate);
        assert_eq!(sort_field("unknown"), SortField::Id);
    }
}
