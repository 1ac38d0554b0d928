//! Error Types

use thiserror::Error;

use crate::usage::Plan;

/// Client-side key-value storage errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Backing storage could not be reached (e.g. no `window.localStorage`)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Write or delete rejected by the backing storage (e.g. quota exceeded)
    #[error("Storage write failed for '{key}': {reason}")]
    Write { key: String, reason: String },
}

/// Usage tracker errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// Free trial quota used up while unsubscribed
    #[error("Trial limit of {limit} invoices reached")]
    TrialExhausted { limit: u32 },

    /// Subscribed flag set on a plan other than Pro
    #[error("Cannot mark plan '{}' as subscribed", .0.as_str())]
    InvalidSubscription(Plan),
}

impl UsageError {
    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::TrialExhausted { limit } => format!(
                "You've used all {limit} free invoices. Upgrade to Pro for unlimited invoicing."
            ),
            Self::InvalidSubscription(_) => "Your subscription could not be updated.".into(),
        }
    }
}

/// Checkout initiation errors
///
/// Every variant is terminal for the attempt. Nothing is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// A checkout for this price is already pending
    #[error("Checkout already in progress for price {0}")]
    AlreadyInFlight(String),

    /// Network failure talking to the checkout endpoint
    #[error("Transport error: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success status
    #[error("Checkout rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Success status but no usable session id in the body
    #[error("Checkout response did not contain a session id")]
    MissingSession,

    /// Payment provider client handle failed to initialize
    #[error("Payment provider not available")]
    ProviderUnavailable,

    /// Provider redirect call failed
    #[error("Redirect failed: {0}")]
    Redirect(String),
}

impl CheckoutError {
    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::AlreadyInFlight(_) => "Checkout is already in progress.".into(),
            Self::Transport(_) => {
                "Could not reach the billing service. Please try again.".into()
            }
            Self::Rejected { message, .. } => message.clone(),
            Self::MissingSession => "Checkout could not be started. Please try again.".into(),
            Self::ProviderUnavailable => "Payment provider not available.".into(),
            Self::Redirect(msg) => format!("Could not open checkout: {msg}"),
        }
    }
}

/// Invoice drafting errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvoiceError {
    /// A draft always keeps at least one line item
    #[error("Cannot remove the last line item")]
    LastItem,

    /// No line item with this id
    #[error("Line item not found: {0}")]
    ItemNotFound(u32),

    /// A line amount or total does not fit in a `Decimal`
    #[error("Invoice amount is too large")]
    AmountOverflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message_is_server_text() {
        let err = CheckoutError::Rejected {
            status: 400,
            message: "Invalid price".into(),
        };
        assert_eq!(err.user_message(), "Invalid price");
    }

    #[test]
    fn test_trial_exhausted_mentions_limit() {
        let err = UsageError::TrialExhausted { limit: 3 };
        assert!(err.user_message().contains('3'));
        assert_eq!(err.to_string(), "Trial limit of 3 invoices reached");
    }
}
