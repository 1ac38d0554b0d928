//! Clients Page

use leptos::prelude::*;
use leptos_router::components::A;

use invoice_core::{ClientFilter, ClientQuery, ClientStats, ClientStatus, ClientSummary};

use crate::components::{StatCard, money};
use crate::state::use_invoices;

fn client_filter(value: &str) -> ClientFilter {
    match value {
        "active" => ClientFilter::Only(ClientStatus::Active),
        "new" => ClientFilter::Only(ClientStatus::New),
        "overdue" => ClientFilter::Only(ClientStatus::Overdue),
        _ => ClientFilter::All,
    }
}

#[component]
pub fn ClientsPage() -> impl IntoView {
    let invoices = use_invoices().invoices();
    let query = RwSignal::new(ClientQuery::default());

    let clients = Memo::new(move |_| invoices.with(|list| ClientSummary::from_invoices(list)));
    let stats = Memo::new(move |_| clients.with(|list| ClientStats::from_clients(list)));
    let visible = move || {
        clients.with(|list| {
            query.with(|q| q.apply(list).into_iter().cloned().collect::<Vec<_>>())
        })
    };

    view! {
        <div class="clients">
            <header class="page-header">
                <div>
                    <h1>"Clients"</h1>
                    <p class="subtitle">"Everyone you've invoiced, at a glance"</p>
                </div>
                <A href="/invoices/new" attr:class="btn btn-primary">"+ New Invoice"</A>
            </header>

            <div class="stats">
                <StatCard
                    title="Total Clients"
                    value=Signal::derive(move || stats.get().total_clients.to_string())
                />
                <StatCard
                    title="Active Clients"
                    value=Signal::derive(move || stats.get().active_clients.to_string())
                />
                <StatCard
                    title="Outstanding"
                    value=Signal::derive(move || money(stats.get().outstanding_amount))
                />
                <StatCard
                    title="Avg Revenue"
                    value=Signal::derive(move || money(stats.get().average_revenue))
                />
            </div>

            <div class="filters">
                <input
                    type="search"
                    placeholder="Search by name, email or company..."
                    on:input=move |ev| query.update(|q| q.search = event_target_value(&ev))
                />
                <select on:change=move |ev| {
                    query.update(|q| q.status = client_filter(&event_target_value(&ev)));
                }>
                    <option value="all">"All clients"</option>
                    <option value="active">"Active"</option>
                    <option value="new">"New"</option>
                    <option value="overdue">"Overdue"</option>
                </select>
            </div>

            <Show
                when=move || !visible().is_empty()
                fallback=|| view! { <p class="empty">"No clients yet. They appear once you save an invoice."</p> }
            >
                <table class="client-table">
                    <thead>
                        <tr>
                            <th>"Client"</th>
                            <th>"Invoices"</th>
                            <th>"Revenue"</th>
                            <th>"Outstanding"</th>
                            <th>"Last invoice"</th>
                            <th>"Status"</th>
                        </tr>
                    </thead>
                    <tbody>
                        <For
                            each=visible
                            key=|c| (c.email.clone(), c.name.clone(), c.total_invoices)
                            children=|c| {
                                let class = format!("badge client-{}", c.status.as_str());
                                view! {
                                    <tr>
                                        <td>
                                            <div>{c.name.clone()}</div>
                                            <div class="muted">{c.email.clone()}</div>
                                            {c.company.clone().map(|co| view! { <div class="muted">{co}</div> })}
                                        </td>
                                        <td>{c.total_invoices}</td>
                                        <td>{money(c.total_revenue)}</td>
                                        <td>{money(c.outstanding_amount)}</td>
                                        <td>{c.last_invoice_date.to_string()}</td>
                                        <td><span class=class>{c.status.label()}</span></td>
                                    </tr>
                                }
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
    fn test_select_values_map_to_filter() {
        assert_eq!(client_filter("active"), ClientFilter::Only(ClientStatus::Active));
        assert_eq!(client_filter("overdue"), ClientFilter::Only(ClientStatus::Overdue));
        assert_eq!(client_filter("all"), ClientFilter::All);
        assert_eq!(client_filter("bogus"), ClientFilter::All);
    }
}
