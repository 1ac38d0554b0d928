//! Page Components

mod billing;
mod clients;
mod dashboard;
mod invoices;
mod new_invoice;
mod settings;

pub use billing::BillingPage;
pub use clients::ClientsPage;
pub use dashboard::DashboardPage;
pub use invoices::InvoicesPage;
pub use new_invoice::NewInvoicePage;
pub use settings::SettingsPage;
