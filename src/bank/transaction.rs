//! Transaction module for the per-account ledger of balance-affecting events.
use std::fmt;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::bank::types::{Money, format_money, serialize_money};

/// Enum representing the kind of a ledger entry.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Open,
    Deposit,
    Withdraw,
    Interest,
    Fee,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Open => "OPEN",
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdraw => "WITHDRAW",
            TransactionKind::Interest => "INTEREST",
            TransactionKind::Fee => "FEE",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable ledger entry. Only [`crate::bank::Account`] creates these.
#[derive(Serialize, Debug, Clone)]
pub struct Transaction {
    /// When the event was recorded.
    timestamp: DateTime<Local>,

    /// The kind of event.
    #[serde(rename = "type")]
    kind: TransactionKind,

    /// Magnitude of the event, always non-negative.
    #[serde(serialize_with = "serialize_money")]
    amount: Money,

    /// Account balance right after the event.
    #[serde(serialize_with = "serialize_money")]
    balance_after: Money,

    description: String,
}

impl Transaction {
    pub(crate) fn new(
        kind: TransactionKind,
        amount: Money,
        balance_after: Money,
        description: impl Into<String>,
    ) -> Self {
        Transaction {
            timestamp: Local::now(),
            kind,
            amount,
            balance_after,
            description: description.into(),
        }
    }

    pub fn get_kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn get_amount(&self) -> Money {
        self.amount
    }

    pub fn get_balance_after(&self) -> Money {
        self.balance_after
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }
}

/// Renders one statement row:
/// `Date&Time | Type | Amount | BalanceAfter | Description`.
impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timestamp = self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
        write!(
            f,
            "{:<22} | {:<8} | {:>10} | {:>12} | {}",
            timestamp,
            self.kind.as_str(),
            format_money(self.amount),
            format_money(self.balance_after),
            self.description
        )
    }
}
