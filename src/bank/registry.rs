//! The registry owns every account of the process, keyed by account number.
use std::collections::HashMap;

use thiserror::Error;
use tracing::{info, warn};

use crate::bank::{
    Account, AccountError, AccountKind, AccountSummary, SCALE,
    types::{AccountNumber, Money},
};

/// A map of account numbers to their accounts. Accounts are never removed.
#[derive(Debug, Default)]
pub struct Registry {
    accounts: HashMap<AccountNumber, Account>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Registry::default()
    }

    /// Creates a registry with the two demo accounts used for quick testing.
    pub fn with_demo_accounts() -> Self {
        let mut registry = Registry::new();
        let demo = [
            (
                "SA1001",
                "Alice",
                5000 * SCALE,
                AccountKind::Savings {
                    annual_interest_rate: 25_000,
                },
            ),
            (
                "CA2001",
                "Bob",
                2000 * SCALE,
                AccountKind::Current {
                    overdraft_limit: 500 * SCALE,
                    overdraft_fee: 50 * SCALE,
                },
            ),
        ];
        for (number, holder, balance, kind) in demo {
            if let Err(err) = registry.create(number, holder, balance, kind) {
                warn!("Error seeding demo account {number}: {err}");
            }
        }
        registry
    }

    /// Opens a new account. Fails if the number is taken or the account is invalid.
    pub fn create(
        &mut self,
        number: &str,
        holder: &str,
        initial_balance: Money,
        kind: AccountKind,
    ) -> Result<AccountSummary, RegistryError> {
        if self.accounts.contains_key(number) {
            warn!(account = number, "duplicate account number");
            return Err(RegistryError::DuplicateAccount(number.to_string()));
        }
        let account = Account::open(number, holder, initial_balance, kind)?;
        let summary = account.summary();
        self.accounts.insert(number.to_string(), account);
        info!(account = number, kind = kind.label(), "account opened");
        Ok(summary)
    }

    /// Retrieves an account by number.
    pub fn lookup(&self, number: &str) -> Result<&Account, RegistryError> {
        self.accounts
            .get(number)
            .ok_or_else(|| RegistryError::NotFound(number.to_string()))
    }

    /// Retrieves an account by number for mutation.
    pub fn lookup_mut(&mut self, number: &str) -> Result<&mut Account, RegistryError> {
        self.accounts
            .get_mut(number)
            .ok_or_else(|| RegistryError::NotFound(number.to_string()))
    }

    /// Returns the summaries of all accounts, ordered by account number.
    pub fn list(&self) -> Vec<AccountSummary> {
        let mut summaries: Vec<_> = self.accounts.values().map(Account::summary).collect();
        summaries.sort_by(|a, b| a.number.cmp(&b.number));
        summaries
    }

    /// Applies monthly interest to every savings account.
    /// Every account's interest is computed first, so if any of them fails
    /// nothing is credited. Returns the number of accounts that were credited.
    pub fn apply_monthly_interest_all(&mut self) -> Result<usize, RegistryError> {
        for (number, account) in &self.accounts {
            if !matches!(account.get_kind(), AccountKind::Savings { .. }) {
                continue;
            }
            if let Err(err) = account.monthly_interest() {
                warn!(account = %number, "monthly interest run aborted: {err}");
                return Err(err.into());
            }
        }

        let mut credited = 0;
        for account in self.accounts.values_mut() {
            if !matches!(account.get_kind(), AccountKind::Savings { .. }) {
                continue;
            }
            if account.apply_monthly_interest()? > 0 {
                credited += 1;
            }
        }
        info!(credited, "monthly interest run finished");
        Ok(credited)
    }

    /// Returns the number of accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns `true` if no account has been opened.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Errors that can occur while resolving or creating accounts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Account number already exists: {0}")]
    DuplicateAccount(AccountNumber),
    #[error("Account not found: {0}")]
    NotFound(AccountNumber),
    #[error(transparent)]
    Account(#[from] AccountError),
}
