//! Main App Component

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::{components::*, path};

use crate::api;
use crate::pages::{
    BillingPage, ClientsPage, DashboardPage, InvoicesPage, NewInvoicePage, SettingsPage,
};
use crate::state::{InvoiceBook, UsageContext};

/// Top navigation with the signed-in user
#[component]
fn NavBar() -> impl IntoView {
    let (user, set_user) = signal(None::<api::SessionUser>);

    spawn_local(async move {
        match api::fetch_session().await {
            Ok(session) => set_user.set(session),
            Err(e) => tracing::warn!(error = %e, "Session lookup failed"),
        }
    });

    let sign_out = move |_| {
        spawn_local(async move {
            match api::sign_out().await {
                Ok(url) => api::navigate_to(&url),
                Err(e) => api::alert(&e),
            }
        });
    };

    view! {
        <nav class="navbar">
            <A href="/dashboard" attr:class="brand">"Invoice Assistant"</A>
            <div class="nav-links">
                <A href="/dashboard">"Dashboard"</A>
                <A href="/invoices">"Invoices"</A>
                <A href="/clients">"Clients"</A>
                <A href="/billing">"Billing"</A>
                <A href="/settings">"Settings"</A>
            </div>
            {move || {
                user.get().map(|u| {
                    view! {
                        <div class="nav-user">
                            <span>{u.display_name().to_string()}</span>
                            <button class="btn btn-link" on:click=sign_out>"Sign out"</button>
                        </div>
                    }
                })
            }}
        </nav>
    }
}

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    provide_context(UsageContext::new());
    provide_context(InvoiceBook::new());

    view! {
        <Router>
            <NavBar />
            <main class="app">
                <Routes fallback=|| view! { <p>"Page not found"</p> }>
                    <Route path=path!("/") view=|| view! { <Redirect path="/dashboard" /> } />
                    <Route path=path!("/dashboard") view=DashboardPage />
                    <Route path=path!("/invoices") view=InvoicesPage />
                    <Route path=path!("/invoices/new") view=NewInvoicePage />
                    <Route path=path!("/clients") view=ClientsPage />
                    <Route path=path!("/billing") view=BillingPage />
                    <Route path=path!("/settings") view=SettingsPage />
                </Routes>
            </main>
        </Router>
    }
}
