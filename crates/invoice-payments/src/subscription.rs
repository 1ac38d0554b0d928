//! Subscription Records
//!
//! Server-side view of who has paid. Written by the Stripe webhook, read by
//! the status endpoint the client polls after returning from checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use invoice_core::{Plan, SubscriptionStatus};

use crate::error::Result;

/// A user's subscription
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Application user id (OAuth subject)
    pub user_id: String,

    /// Associated Stripe subscription ID
    pub subscription_id: String,

    /// Customer email
    pub email: Option<String>,

    /// Plan tier
    pub plan: Plan,

    /// Whether the subscription is active
    pub active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last change
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    /// Create an active Pro subscription
    pub fn new(user_id: String, subscription_id: String, email: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            subscription_id,
            email,
            plan: Plan::Pro,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Status as reported to the client
    pub fn status(&self) -> SubscriptionStatus {
        if self.active && self.plan == Plan::Pro {
            SubscriptionStatus {
                plan: Plan::Pro,
                is_subscribed: true,
            }
        } else {
            SubscriptionStatus::default()
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.updated_at = Utc::now();
    }
}

/// Subscription storage trait
pub trait SubscriptionStore: Send + Sync {
    /// Save or update a record
    fn save(&self, record: &SubscriptionRecord) -> Result<()>;

    /// Get record by user id
    fn get(&self, user_id: &str) -> Result<Option<SubscriptionRecord>>;

    /// Get record by Stripe subscription ID
    fn get_by_subscription(&self, subscription_id: &str) -> Result<Option<SubscriptionRecord>>;

    /// Status for a user; unknown users are on the trial
    fn status(&self, user_id: &str) -> Result<SubscriptionStatus> {
        Ok(self
            .get(user_id)?
            .map(|record| record.status())
            .unwrap_or_default())
    }
}

/// In-memory subscription store (for development)
#[derive(Default)]
pub struct MemorySubscriptionStore {
    records: RwLock<HashMap<String, SubscriptionRecord>>,
    by_subscription: RwLock<HashMap<String, String>>,
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SubscriptionStore for MemorySubscriptionStore {
    fn save(&self, record: &SubscriptionRecord) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let mut by_sub = self
            .by_subscription
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        by_sub.insert(record.subscription_id.clone(), record.user_id.clone());
        records.insert(record.user_id.clone(), record.clone());

        Ok(())
    }

    fn get(&self, user_id: &str) -> Result<Option<SubscriptionRecord>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(user_id).cloned())
    }

    fn get_by_subscription(&self, subscription_id: &str) -> Result<Option<SubscriptionRecord>> {
        let by_sub = self
            .by_subscription
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);

        Ok(by_sub
            .get(subscription_id)
            .and_then(|user_id| records.get(user_id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_user_is_trial() {
        let store = MemorySubscriptionStore::new();
        let status = store.status("user_1").unwrap();
        assert_eq!(status.plan, Plan::Trial);
        assert!(!status.is_subscribed);
    }

    #[test]
    fn test_active_record_is_pro() {
        let store = MemorySubscriptionStore::new();
        store
            .save(&SubscriptionRecord::new(
                "user_1".into(),
                "sub_123".into(),
                Some("test@example.com".into()),
            ))
            .unwrap();

        let status = store.status("user_1").unwrap();
        assert_eq!(status.plan, Plan::Pro);
        assert!(status.is_subscribed);

        let by_sub = store.get_by_subscription("sub_123").unwrap().unwrap();
        assert_eq!(by_sub.user_id, "user_1");
    }

    #[test]
    fn test_inactive_record_reports_trial() {
        let mut record = SubscriptionRecord::new("user_1".into(), "sub_123".into(), None);
        record.set_active(false);
        assert_eq!(record.status(), SubscriptionStatus::default());
    }
}
