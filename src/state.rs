use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::AssistantConfig;

/// Status given to every recorded payment.
pub const PAYMENT_COMPLETED: &str = "completed";

/// A recorded premium payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: u64,
    pub customer_id: String,
    pub policy_number: String,
    /// Normalized `+91-XXXXXXXXXX` number
    pub phone_number: String,
    pub amount_due: f64,
    pub payment_date: String,
    pub payment_status: String,
}

/// Fields of a payment before it is recorded.
#[derive(Debug, Clone, Default)]
pub struct NewPayment {
    pub policy_number: String,
    pub phone_number: String,
    pub amount_due: f64,
    pub payment_date: String,
}

/// In-memory payment ledger.
#[derive(Debug, Default)]
pub struct PaymentLedger {
    records: RwLock<Vec<PaymentRecord>>,
    next_id: AtomicU64,
}

impl PaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a payment and return the stored record.
    pub fn record(&self, payment: NewPayment) -> PaymentRecord {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let record = PaymentRecord {
            id,
            customer_id: uuid::Uuid::new_v4().to_string(),
            policy_number: payment.policy_number,
            phone_number: payment.phone_number,
            amount_due: payment.amount_due,
            payment_date: payment.payment_date,
            payment_status: PAYMENT_COMPLETED.to_string(),
        };

        self.records.write().push(record.clone());
        record
    }

    /// All records, newest first.
    pub fn list(&self) -> Vec<PaymentRecord> {
        self.records.read().iter().rev().cloned().collect()
    }

    /// Records for a normalized phone number, newest first.
    pub fn find_by_phone(&self, phone_number: &str) -> Vec<PaymentRecord> {
        self.records
            .read()
            .iter()
            .rev()
            .filter(|record| record.phone_number == phone_number)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

/// Shared state of the payment API.
pub struct AppState {
    pub config: AssistantConfig,
    pub payments: PaymentLedger,
}

impl AppState {
    pub fn new(config: AssistantConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            payments: PaymentLedger::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(policy: &str) -> NewPayment {
        payment_for(policy, "+91-7045289568")
    }

    fn payment_for(policy: &str, phone: &str) -> NewPayment {
        NewPayment {
            policy_number: policy.to_string(),
            phone_number: phone.to_string(),
            amount_due: 1250.5,
            payment_date: "2025-01-15".to_string(),
        }
    }

    #[test]
    fn test_record_assigns_ids() {
        let ledger = PaymentLedger::new();
        assert!(ledger.is_empty());

        let first = ledger.record(payment("POL-1"));
        let second = ledger.record(payment("POL-2"));

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_ne!(first.customer_id, second.customer_id);
        assert_eq!(first.payment_status, PAYMENT_COMPLETED);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_list_newest_first() {
        let ledger = PaymentLedger::new();
        ledger.record(payment("POL-1"));
        ledger.record(payment("POL-2"));
        ledger.record(payment("POL-3"));

        let policies: Vec<_> = ledger
            .list()
            .into_iter()
            .map(|r| r.policy_number)
            .collect();
        assert_eq!(policies, vec!["POL-3", "POL-2", "POL-1"]);
    }

    #[test]
    fn test_find_by_phone() {
        let ledger = PaymentLedger::new();
        ledger.record(payment_for("POL-1", "+91-7045289568"));
        ledger.record(payment_for("POL-2", "+91-9876543210"));
        ledger.record(payment_for("POL-3", "+91-7045289568"));

        let policies: Vec<_> = ledger
            .find_by_phone("+91-7045289568")
            .into_iter()
            .map(|r| r.policy_number)
            .collect();
        assert_eq!(policies, vec!["POL-3", "POL-1"]);
        assert!(ledger.find_by_phone("+91-1111111111").is_empty());
    }
}
