//! Invoice Models
//!
//! Draft editing with live totals, plus the filter/sort/stats used by the
//! invoice list. Uses `rust_decimal` for all monetary values.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::InvoiceError;

/// Days between issue and due date on a new draft
pub const DEFAULT_PAYMENT_TERMS_DAYS: i64 = 30;

/// A billable line on an invoice
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: u32,
    pub description: String,
    pub quantity: Decimal,
    pub rate: Decimal,
}

impl LineItem {
    fn blank(id: u32) -> Self {
        Self {
            id,
            description: String::new(),
            quantity: Decimal::ONE,
            rate: Decimal::ZERO,
        }
    }

    /// `quantity * rate`, or `AmountOverflow` past `Decimal::MAX`
    pub fn amount(&self) -> Result<Decimal, InvoiceError> {
        self.quantity
            .checked_mul(self.rate)
            .ok_or(InvoiceError::AmountOverflow)
    }
}

/// Single-field edit to a line item
#[derive(Clone, Debug)]
pub enum ItemUpdate {
    Description(String),
    Quantity(Decimal),
    Rate(Decimal),
}

/// Who the invoice is addressed to
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillTo {
    pub name: String,
    pub email: String,
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

/// Computed invoice totals
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// An invoice being edited
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub client: BillTo,
    items: Vec<LineItem>,
    /// Percent, e.g. `8.5` for 8.5%
    pub tax_rate: Decimal,
    pub notes: String,
    next_item_id: u32,
}

impl InvoiceDraft {
    /// New draft issued at `now`, with one blank line item
    pub fn new(now: DateTime<Utc>) -> Self {
        let issue_date = now.date_naive();
        Self {
            number: format!("INV-{}", now.timestamp_millis()),
            issue_date,
            due_date: issue_date + Duration::days(DEFAULT_PAYMENT_TERMS_DAYS),
            client: BillTo::default(),
            items: vec![LineItem::blank(1)],
            tax_rate: Decimal::ZERO,
            notes: String::new(),
            next_item_id: 2,
        }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Append a blank line item, returning its id
    pub fn add_item(&mut self) -> u32 {
        let id = self.next_item_id;
        self.next_item_id += 1;
        self.items.push(LineItem::blank(id));
        id
    }

    pub fn update_item(&mut self, id: u32, update: ItemUpdate) -> Result<(), InvoiceError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(InvoiceError::ItemNotFound(id))?;

        match update {
            ItemUpdate::Description(description) => item.description = description,
            ItemUpdate::Quantity(quantity) => item.quantity = quantity,
            ItemUpdate::Rate(rate) => item.rate = rate,
        }
        Ok(())
    }

    pub fn remove_item(&mut self, id: u32) -> Result<(), InvoiceError> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(InvoiceError::ItemNotFound(id))?;

        if self.items.len() == 1 {
            return Err(InvoiceError::LastItem);
        }
        self.items.remove(index);
        Ok(())
    }

    pub fn totals(&self) -> Result<InvoiceTotals, InvoiceError> {
        let subtotal = self.items.iter().try_fold(Decimal::ZERO, |acc, item| {
            acc.checked_add(item.amount()?)
                .ok_or(InvoiceError::AmountOverflow)
        })?;
        let tax = subtotal
            .checked_mul(self.tax_rate)
            .and_then(|t| t.checked_div(Decimal::ONE_HUNDRED))
            .ok_or(InvoiceError::AmountOverflow)?;
        let total = subtotal
            .checked_add(tax)
            .ok_or(InvoiceError::AmountOverflow)?;

        Ok(InvoiceTotals {
            subtotal,
            tax,
            total,
        })
    }

    /// List entry for this draft
    pub fn summary(&self) -> Result<InvoiceSummary, InvoiceError> {
        Ok(InvoiceSummary {
            id: self.number.clone(),
            client: self.client.name.clone(),
            client_email: self.client.email.clone(),
            client_company: self.client.company.clone(),
            amount: self.totals()?.total,
            status: InvoiceStatus::Draft,
            issue_date: self.issue_date,
            due_date: self.due_date,
            item_count: u32::try_from(self.items.len()).unwrap_or(u32::MAX),
        })
    }
}

/// Invoice payment status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Paid,
    Pending,
    Overdue,
    Draft,
}

impl InvoiceStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Pending => "pending",
            Self::Overdue => "overdue",
            Self::Draft => "draft",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Pending => "Pending",
            Self::Overdue => "Overdue",
            Self::Draft => "Draft",
        }
    }
}

/// Invoice as shown in the list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub id: String,
    pub client: String,
    pub client_email: String,
    #[serde(default)]
    pub client_company: Option<String>,
    pub amount: Decimal,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub item_count: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(InvoiceStatus),
}

impl StatusFilter {
    fn matches(self, status: InvoiceStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Id,
    Client,
    Amount,
    DueDate,
    Status,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Search, filter and ordering for the invoice list
///
/// Defaults to all statuses, newest id first.
#[derive(Clone, Debug, Default)]
pub struct InvoiceQuery {
    pub search: String,
    pub status: StatusFilter,
    pub sort_field: SortField,
    pub direction: SortDirection,
}

impl InvoiceQuery {
    fn matches(&self, invoice: &InvoiceSummary) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || invoice.id.to_lowercase().contains(&needle)
            || invoice.client.to_lowercase().contains(&needle)
            || invoice.client_email.to_lowercase().contains(&needle);

        matches_search && self.status.matches(invoice.status)
    }

    fn compare(&self, a: &InvoiceSummary, b: &InvoiceSummary) -> Ordering {
        let ordering = match self.sort_field {
            SortField::Id => a.id.to_lowercase().cmp(&b.id.to_lowercase()),
            SortField::Client => a.client.to_lowercase().cmp(&b.client.to_lowercase()),
            SortField::Amount => a.amount.cmp(&b.amount),
            SortField::DueDate => a.due_date.cmp(&b.due_date),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        };

        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    /// Matching invoices in display order
    pub fn apply<'a>(&self, invoices: &'a [InvoiceSummary]) -> Vec<&'a InvoiceSummary> {
        let mut matched: Vec<_> = invoices.iter().filter(|inv| self.matches(inv)).collect();
        matched.sort_by(|a, b| self.compare(a, b));
        matched
    }
}

/// Headline numbers for the invoice list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStats {
    pub total_invoices: usize,
    pub total_revenue: Decimal,
    pub pending_amount: Decimal,
    pub overdue_amount: Decimal,
}

impl InvoiceStats {
    pub fn from_invoices(invoices: &[InvoiceSummary]) -> Self {
        let sum_for = |status: InvoiceStatus| -> Decimal {
            invoices
                .iter()
                .filter(|inv| inv.status == status)
                .fold(Decimal::ZERO, |acc, inv| acc.saturating_add(inv.amount))
        };

        Self {
            total_invoices: invoices.len(),
            total_revenue: sum_for(InvoiceStatus::Paid),
            pending_amount: sum_for(InvoiceStatus::Pending),
            overdue_amount: sum_for(InvoiceStatus::Overdue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn draft() -> InvoiceDraft {
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap();
        InvoiceDraft::new(now)
    }

    fn summary(id: &str, client: &str, amount: Decimal, status: InvoiceStatus, due: u32) -> InvoiceSummary {
        InvoiceSummary {
            id: id.into(),
            client: client.into(),
            client_email: format!("billing@{}.com", client.to_lowercase().replace(' ', "")),
            client_company: None,
            amount,
            status,
            issue_date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 1, due).unwrap(),
            item_count: 1,
        }
    }

    fn sample() -> Vec<InvoiceSummary> {
        vec![
            summary("INV-001", "Acme Corporation", dec!(2500), InvoiceStatus::Paid, 15),
            summary("INV-002", "TechStart Inc", dec!(1800), InvoiceStatus::Pending, 20),
            summary("INV-003", "Global Solutions", dec!(3200), InvoiceStatus::Overdue, 10),
            summary("INV-004", "Innovation Labs", dec!(950), InvoiceStatus::Draft, 25),
            summary("INV-005", "Digital Agency Co", dec!(4100), InvoiceStatus::Paid, 12),
        ]
    }

    #[test]
    fn test_new_draft_defaults() {
        let draft = draft();
        assert_eq!(draft.number, "INV-1736933400000");
        assert_eq!(draft.issue_date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2025, 2, 14).unwrap());
        assert_eq!(draft.items().len(), 1);
        assert_eq!(draft.items()[0].quantity, Decimal::ONE);
    }

    #[test]
    fn test_totals_with_tax() {
        let mut draft = draft();
        draft
            .update_item(1, ItemUpdate::Description("Design work".into()))
            .unwrap();
        draft.update_item(1, ItemUpdate::Quantity(dec!(10))).unwrap();
        draft.update_item(1, ItemUpdate::Rate(dec!(85.50))).unwrap();

        let second = draft.add_item();
        draft.update_item(second, ItemUpdate::Quantity(dec!(2))).unwrap();
        draft.update_item(second, ItemUpdate::Rate(dec!(120))).unwrap();
        draft.tax_rate = dec!(8.5);

        let totals = draft.totals().unwrap();
        assert_eq!(totals.subtotal, dec!(1095.00));
        assert_eq!(totals.tax, dec!(93.075));
        assert_eq!(totals.total, dec!(1188.075));
    }

    #[test]
    fn test_huge_amounts_report_overflow() {
        let mut draft = draft();
        let huge = dec!(100000000000000000000);
        draft.update_item(1, ItemUpdate::Quantity(huge)).unwrap();
        draft.update_item(1, ItemUpdate::Rate(huge)).unwrap();

        assert_eq!(draft.items()[0].amount(), Err(InvoiceError::AmountOverflow));
        assert_eq!(draft.totals(), Err(InvoiceError::AmountOverflow));
        assert_eq!(draft.summary().map(|s| s.amount), Err(InvoiceError::AmountOverflow));

        // Each line fits, the sum does not
        draft.update_item(1, ItemUpdate::Quantity(Decimal::ONE)).unwrap();
        draft.update_item(1, ItemUpdate::Rate(Decimal::MAX)).unwrap();
        let second = draft.add_item();
        draft.update_item(second, ItemUpdate::Rate(Decimal::MAX)).unwrap();
        assert_eq!(draft.totals(), Err(InvoiceError::AmountOverflow));

        draft.remove_item(second).unwrap();
        draft.tax_rate = dec!(10);
        assert_eq!(draft.totals(), Err(InvoiceError::AmountOverflow));
    }

    #[test]
    fn test_last_item_cannot_be_removed() {
        let mut draft = draft();
        assert_eq!(draft.remove_item(1), Err(InvoiceError::LastItem));

        let second = draft.add_item();
        draft.remove_item(1).unwrap();
        assert_eq!(draft.items()[0].id, second);
        assert_eq!(draft.remove_item(99), Err(InvoiceError::ItemNotFound(99)));
    }

    #[test]
    fn test_summary_is_draft() {
        let mut draft = draft();
        draft.client.name = "Acme Corporation".into();
        draft.update_item(1, ItemUpdate::Rate(dec!(40))).unwrap();

        let summary = draft.summary().unwrap();
        assert_eq!(summary.status, InvoiceStatus::Draft);
        assert_eq!(summary.amount, dec!(40));
        assert_eq!(summary.client, "Acme Corporation");
    }

    #[test]
    fn test_default_query_sorts_id_descending() {
        let invoices = sample();
        let ids: Vec<_> = InvoiceQuery::default()
            .apply(&invoices)
            .iter()
            .map(|inv| inv.id.as_str())
            .collect();
        assert_eq!(ids, ["INV-005", "INV-004", "INV-003", "INV-002", "INV-001"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_email() {
        let invoices = sample();
        let query = InvoiceQuery {
            search: "BILLING@TECHSTART".into(),
            ..Default::default()
        };
        let found = query.apply(&invoices);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "INV-002");
    }

    #[test]
    fn test_status_filter_and_amount_sort() {
        let invoices = sample();
        let query = InvoiceQuery {
            status: StatusFilter::Only(InvoiceStatus::Paid),
            sort_field: SortField::Amount,
            direction: SortDirection::Asc,
            ..Default::default()
        };
        let amounts: Vec<_> = query.apply(&invoices).iter().map(|inv| inv.amount).collect();
        assert_eq!(amounts, [dec!(2500), dec!(4100)]);
    }

    #[test]
    fn test_due_date_sort() {
        let invoices = sample();
        let query = InvoiceQuery {
            sort_field: SortField::DueDate,
            direction: SortDirection::Asc,
            ..Default::default()
        };
        assert_eq!(query.apply(&invoices)[0].id, "INV-003");
    }

    #[test]
    fn test_stats() {
        let stats = InvoiceStats::from_invoices(&sample());
        assert_eq!(stats.total_invoices, 5);
        assert_eq!(stats.total_revenue, dec!(6600));
        assert_eq!(stats.pending_amount, dec!(1800));
        assert_eq!(stats.overdue_amount, dec!(3200));
    }
}
