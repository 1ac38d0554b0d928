//! New Invoice Page

use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_navigate;
use rust_decimal::Decimal;

use invoice_core::invoice::ItemUpdate;
use invoice_core::{InvoiceDraft, InvoiceError};

use crate::components::{TrialBanner, money};
use crate::state::{use_invoices, use_usage};

/// Lenient numeric input: blanks and junk read as zero
fn parse_decimal(input: &str) -> Decimal {
    input.trim().parse().unwrap_or(Decimal::ZERO)
}

fn amount_text(amount: Result<Decimal, InvoiceError>) -> String {
    amount.map_or_else(|_| "Amount too large".to_string(), money)
}

#[component]
pub fn NewInvoicePage() -> impl IntoView {
    let usage = use_usage();
    let state = usage.snapshot();
    let book = use_invoices();
    let navigate = use_navigate();

    let draft = RwSignal::new(InvoiceDraft::new(chrono::Utc::now()));
    let (error, set_error) = signal(None::<String>);

    let update_item = move |id: u32, update: ItemUpdate| {
        draft.update(|d| {
            if let Err(e) = d.update_item(id, update) {
                set_error.set(Some(e.to_string()));
            }
        });
    };

    let remove_item = move |id: u32| {
        draft.update(|d| {
            if let Err(e) = d.remove_item(id) {
                set_error.set(Some(e.to_string()));
            }
        });
    };

    let save = move |_| {
        if draft.with_untracked(|d| d.client.name.trim().is_empty()) {
            set_error.set(Some("Add the client's name before saving.".into()));
            return;
        }
        let summary = match draft.with_untracked(InvoiceDraft::summary) {
            Ok(summary) => summary,
            Err(e) => {
                set_error.set(Some(e.to_string()));
                return;
            }
        };
        match usage.record_invoice() {
            Ok(_) => {
                book.add(summary);
                navigate("/invoices", Default::default());
            }
            Err(e) => set_error.set(Some(e.user_message())),
        }
    };

    let print = |_| {
        if let Some(window) = web_sys::window() {
            let _ = window.print();
        }
    };

    let totals = move || draft.with(InvoiceDraft::totals);
    let single_item = move || draft.with(|d| d.items().len() == 1);
    let locked = move || state.get().is_trial_exhausted();

    view! {
        <div class="new-invoice">
            <header class="page-header">
                <div>
                    <A href="/invoices">"← Back"</A>
                    <h1>"New Invoice"</h1>
                    <p class="subtitle">{move || draft.with(|d| d.number.clone())}</p>
                </div>
                <div class="actions">
                    <button class="btn" on:click=print>"Print"</button>
                    <button class="btn btn-primary" on:click=save disabled=locked>
                        "Save Invoice"
                    </button>
                </div>
            </header>

            <TrialBanner />
            {move || error.get().map(|msg| view! { <div class="banner banner-error">{msg}</div> })}

            <section class="card">
                <h2>"Invoice Details"</h2>
                <div class="grid">
                    <label>"Issue date"
                        <span>{move || draft.with(|d| d.issue_date.to_string())}</span>
                    </label>
                    <label>"Due date"
                        <span>{move || draft.with(|d| d.due_date.to_string())}</span>
                    </label>
                </div>
            </section>

            <section class="card">
                <h2>"Bill To"</h2>
                <div class="grid">
                    <input
                        type="text"
                        placeholder="Client name"
                        on:input=move |ev| draft.update(|d| d.client.name = event_target_value(&ev))
                    />
                    <input
                        type="email"
                        placeholder="client@example.com"
                        on:input=move |ev| draft.update(|d| d.client.email = event_target_value(&ev))
                    />
                    <textarea
                        placeholder="Address"
                        on:input=move |ev| draft.update(|d| d.client.address = event_target_value(&ev))
                    />
                    <input
                        type="text"
                        placeholder="Company (optional)"
                        on:input=move |ev| {
                            let company = event_target_value(&ev);
                            draft.update(|d| d.client.company = (!company.trim().is_empty()).then_some(company));
                        }
                    />
                    <input
                        type="tel"
                        placeholder="Phone (optional)"
                        on:input=move |ev| {
                            let phone = event_target_value(&ev);
                            draft.update(|d| d.client.phone = (!phone.is_empty()).then_some(phone));
                        }
                    />
                </div>
            </section>

            <section class="card">
                <h2>"Items"</h2>
                <table class="items">
                    <thead>
                        <tr>
                            <th>"Description"</th>
                            <th>"Qty"</th>
                            <th>"Rate"</th>
                            <th>"Amount"</th>
                            <th></th>
                        </tr>
                    </thead>
                    <tbody>
                        <For
                            each=move || draft.with(|d| d.items().to_vec())
                            key=|item| item.id
                            children=move |item| {
                                let id = item.id;
                                let amount = move || {
                                    draft.with(|d| {
                                        d.items()
                                            .iter()
                                            .find(|i| i.id == id)
                                            .map_or(Ok(Decimal::ZERO), |i| i.amount())
                                    })
                                };
                                view! {
                                    <tr>
                                        <td>
                                            <input
                                                type="text"
                                                placeholder="Service or product"
                                                prop:value=item.description.clone()
                                                on:input=move |ev| update_item(id, ItemUpdate::Description(event_target_value(&ev)))
                                            />
                                        </td>
                                        <td>
                                            <input
                                                type="number"
                                                min="0"
                                                prop:value=item.quantity.to_string()
                                                on:input=move |ev| update_item(id, ItemUpdate::Quantity(parse_decimal(&event_target_value(&ev))))
                                            />
                                        </td>
                                        <td>
                                            <input
                                                type="number"
                                                min="0"
                                                step="0.01"
                                                prop:value=item.rate.to_string()
                                                on:input=move |ev| update_item(id, ItemUpdate::Rate(parse_decimal(&event_target_value(&ev))))
                                            />
                                        </td>
                                        <td class="amount">{move || amount_text(amount())}</td>
                                        <td>
                                            <button
                                                class="btn btn-icon"
                                                on:click=move |_| remove_item(id)
                                                disabled=single_item
                                            >
                                                "✕"
                                            </button>
                                        </td>
                                    </tr>
                                }
                            }
                        />
                    </tbody>
                </table>
                <button class="btn" on:click=move |_| { draft.update(|d| { d.add_item(); }); }>
                    "+ Add Item"
                </button>
            </section>

            <section class="card totals">
                <label>"Tax rate (%)"
                    <input
                        type="number"
                        min="0"
                        step="0.1"
                        prop:value="0"
                        on:input=move |ev| {
                            let rate = parse_decimal(&event_target_value(&ev));
                            draft.update(|d| d.tax_rate = rate);
                        }
                    />
                </label>
                <dl>
                    <dt>"Subtotal"</dt><dd>{move || amount_text(totals().map(|t| t.subtotal))}</dd>
                    <dt>"Tax"</dt><dd>{move || amount_text(totals().map(|t| t.tax))}</dd>
                    <dt class="total">"Total"</dt>
                    <dd class="total">{move || amount_text(totals().map(|t| t.total))}</dd>
                </dl>
            </section>

            <section class="card">
                <h2>"Notes"</h2>
                <textarea
                    placeholder="Payment terms, thank-you note..."
                    on:input=move |ev| draft.update(|d| d.notes = event_target_value(&ev))
                />
            </section>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal_is_lenient() {
        assert_eq!(parse_decimal("12.50"), dec!(12.50));
        assert_eq!(parse_decimal(" 3 "), dec!(3));
        assert_eq!(parse_decimal(""), Decimal::ZERO);
        assert_eq!(parse_decimal("abc"), Decimal::ZERO);
    }

    #[test]
    fn test_amount_text_flags_overflow() {
        assert_eq!(amount_text(Ok(dec!(40))), money(dec!(40)));
        assert_eq!(amount_text(Err(InvoiceError::AmountOverflow)), "Amount too large");
    }
}
