//! Client Directory
//!
//! Clients are not stored separately. Each one is rolled up from the
//! invoices addressed to it, keyed by email (or name when no email was
//! given).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::invoice::{InvoiceStatus, InvoiceSummary};

/// Relationship status derived from a client's invoices
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    /// Has paid at least once and nothing is overdue
    Active,
    /// No payment yet
    New,
    /// At least one overdue invoice
    Overdue,
}

impl ClientStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::New => "new",
            Self::Overdue => "overdue",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::New => "New",
            Self::Overdue => "Overdue",
        }
    }
}

/// One client with its invoice rollup
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub total_invoices: usize,
    /// Sum of paid invoices
    pub total_revenue: Decimal,
    /// Sum of pending and overdue invoices
    pub outstanding_amount: Decimal,
    pub last_invoice_date: NaiveDate,
    pub status: ClientStatus,
}

impl ClientSummary {
    fn open(invoice: &InvoiceSummary) -> Self {
        Self {
            name: invoice.client.clone(),
            email: invoice.client_email.clone(),
            company: invoice.client_company.clone(),
            total_invoices: 0,
            total_revenue: Decimal::ZERO,
            outstanding_amount: Decimal::ZERO,
            last_invoice_date: invoice.issue_date,
            status: ClientStatus::New,
        }
    }

    fn absorb(&mut self, invoice: &InvoiceSummary) {
        self.total_invoices += 1;
        match invoice.status {
            InvoiceStatus::Paid => {
                self.total_revenue = self.total_revenue.saturating_add(invoice.amount);
            }
            InvoiceStatus::Pending | InvoiceStatus::Overdue => {
                self.outstanding_amount = self.outstanding_amount.saturating_add(invoice.amount);
            }
            InvoiceStatus::Draft => {}
        }

        // Latest invoice wins for contact details
        if invoice.issue_date >= self.last_invoice_date {
            self.last_invoice_date = invoice.issue_date;
            self.name.clone_from(&invoice.client);
            if invoice.client_company.is_some() {
                self.company.clone_from(&invoice.client_company);
            }
        }

        self.status = match (self.status, invoice.status) {
            (ClientStatus::Overdue, _) | (_, InvoiceStatus::Overdue) => ClientStatus::Overdue,
            (ClientStatus::Active, _) | (_, InvoiceStatus::Paid) => ClientStatus::Active,
            _ => ClientStatus::New,
        };
    }

    /// Roll invoices up into clients, most recently invoiced first
    ///
    /// Invoices with neither a client name nor an email are skipped.
    pub fn from_invoices(invoices: &[InvoiceSummary]) -> Vec<Self> {
        let mut order: Vec<String> = Vec::new();
        let mut clients: HashMap<String, Self> = HashMap::new();

        for invoice in invoices {
            let Some(key) = client_key(invoice) else {
                continue;
            };
            clients
                .entry(key.clone())
                .or_insert_with(|| {
                    order.push(key);
                    Self::open(invoice)
                })
                .absorb(invoice);
        }

        let mut rolled: Vec<_> = order
            .into_iter()
            .filter_map(|key| clients.remove(&key))
            .collect();
        rolled.sort_by(|a, b| {
            b.last_invoice_date
                .cmp(&a.last_invoice_date)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        rolled
    }
}

fn client_key(invoice: &InvoiceSummary) -> Option<String> {
    let email = invoice.client_email.trim();
    if !email.is_empty() {
        return Some(email.to_lowercase());
    }
    let name = invoice.client.trim();
    (!name.is_empty()).then(|| format!("name:{}", name.to_lowercase()))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClientFilter {
    #[default]
    All,
    Only(ClientStatus),
}

/// Search and status filter for the client directory
#[derive(Clone, Debug, Default)]
pub struct ClientQuery {
    pub search: String,
    pub status: ClientFilter,
}

impl ClientQuery {
    fn matches(&self, client: &ClientSummary) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || client.name.to_lowercase().contains(&needle)
            || client.email.to_lowercase().contains(&needle)
            || client
                .company
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&needle));

        let matches_status = match self.status {
            ClientFilter::All => true,
            ClientFilter::Only(wanted) => wanted == client.status,
        };

        matches_search && matches_status
    }

    /// Matching clients, order preserved
    pub fn apply<'a>(&self, clients: &'a [ClientSummary]) -> Vec<&'a ClientSummary> {
        clients.iter().filter(|c| self.matches(c)).collect()
    }
}

/// Headline numbers for the client directory
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStats {
    pub total_clients: usize,
    pub active_clients: usize,
    pub outstanding_amount: Decimal,
    /// Paid revenue per client, to the cent
    pub average_revenue: Decimal,
}

impl ClientStats {
    pub fn from_clients(clients: &[ClientSummary]) -> Self {
        let outstanding_amount = clients
            .iter()
            .fold(Decimal::ZERO, |acc, c| acc.saturating_add(c.outstanding_amount));
        let revenue = clients
            .iter()
            .fold(Decimal::ZERO, |acc, c| acc.saturating_add(c.total_revenue));
        let average_revenue = revenue
            .checked_div(Decimal::from(clients.len()))
            .map_or(Decimal::ZERO, |avg| avg.round_dp(2));

        Self {
            total_clients: clients.len(),
            active_clients: clients
                .iter()
                .filter(|c| c.status == ClientStatus::Active)
                .count(),
            outstanding_amount,
            average_revenue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn invoice(client: &str, email: &str, amount: Decimal, status: InvoiceStatus, day: u32) -> InvoiceSummary {
        InvoiceSummary {
            id: format!("INV-{day:03}"),
            client: client.into(),
            client_email: email.into(),
            client_company: None,
            amount,
            status,
            issue_date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 2, day).unwrap(),
            item_count: 1,
        }
    }

    fn sample() -> Vec<InvoiceSummary> {
        vec![
            invoice("Acme Corporation", "billing@acme.com", dec!(2500), InvoiceStatus::Paid, 2),
            invoice("TechStart Inc", "ap@techstart.io", dec!(1800), InvoiceStatus::Pending, 5),
            invoice("Acme Corp", "Billing@Acme.com", dec!(700), InvoiceStatus::Pending, 9),
            invoice("Global Solutions", "", dec!(3200), InvoiceStatus::Overdue, 3),
            invoice("Global Solutions", "", dec!(400), InvoiceStatus::Paid, 4),
            invoice("", "", dec!(10), InvoiceStatus::Draft, 6),
        ]
    }

    #[test]
    fn test_rollup_groups_by_email_then_name() {
        let clients = ClientSummary::from_invoices(&sample());
        assert_eq!(clients.len(), 3);

        let acme = &clients[0];
        assert_eq!(acme.name, "Acme Corp");
        assert_eq!(acme.total_invoices, 2);
        assert_eq!(acme.total_revenue, dec!(2500));
        assert_eq!(acme.outstanding_amount, dec!(700));
        assert_eq!(acme.last_invoice_date, NaiveDate::from_ymd_opt(2025, 1, 9).unwrap());
        assert_eq!(acme.status, ClientStatus::Active);

        assert_eq!(clients[1].name, "TechStart Inc");
        assert_eq!(clients[1].status, ClientStatus::New);

        let global = &clients[2];
        assert_eq!(global.total_invoices, 2);
        assert_eq!(global.status, ClientStatus::Overdue);
    }

    #[test]
    fn test_search_covers_name_email_and_company() {
        let mut invoices = sample();
        invoices[1].client_company = Some("Startup Holdings".into());
        let clients = ClientSummary::from_invoices(&invoices);

        let by = |search: &str| {
            let query = ClientQuery {
                search: search.into(),
                ..Default::default()
            };
            query.apply(&clients).iter().map(|c| c.name.clone()).collect::<Vec<_>>()
        };

        assert_eq!(by("ACME"), ["Acme Corp"]);
        assert_eq!(by("techstart.io"), ["TechStart Inc"]);
        assert_eq!(by("holdings"), ["TechStart Inc"]);
        assert!(by("nobody").is_empty());
        assert_eq!(by("  ").len(), 3);
    }

    #[test]
    fn test_status_filter() {
        let clients = ClientSummary::from_invoices(&sample());
        let query = ClientQuery {
            status: ClientFilter::Only(ClientStatus::Overdue),
            ..Default::default()
        };
        let matched = query.apply(&clients);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "Global Solutions");
    }

    #[test]
    fn test_stats() {
        let clients = ClientSummary::from_invoices(&sample());
        let stats = ClientStats::from_clients(&clients);
        assert_eq!(stats.total_clients, 3);
        assert_eq!(stats.active_clients, 1);
        assert_eq!(stats.outstanding_amount, dec!(5700));
        assert_eq!(stats.average_revenue, dec!(966.67));
    }

    #[test]
    fn test_stats_empty() {
        let stats = ClientStats::from_clients(&[]);
        assert_eq!(stats, ClientStats::default());
    }
}
