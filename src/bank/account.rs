//! Account management and balance policies for savings and current accounts.
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bank::{
    SCALE, Transaction, TransactionKind,
    types::{AccountNumber, Money, Rate, div_round, format_money, serialize_money},
};

/// Savings accounts may never be withdrawn below this balance (1000.00).
pub const MIN_BALANCE: Money = 1000 * SCALE;

/// The closed set of account variants and their policy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Savings {
        /// Annual rate in percent, fixed-point.
        annual_interest_rate: Rate,
    },
    Current {
        overdraft_limit: Money,
        overdraft_fee: Money,
    },
}

impl AccountKind {
    pub fn label(&self) -> &'static str {
        match self {
            AccountKind::Savings { .. } => "Savings",
            AccountKind::Current { .. } => "Current",
        }
    }

    fn validate(&self) -> Result<(), AccountError> {
        if let AccountKind::Current {
            overdraft_limit,
            overdraft_fee,
        } = *self
        {
            if overdraft_limit < 0 {
                return Err(AccountError::Validation(
                    "Overdraft limit cannot be negative.".into(),
                ));
            }
            if overdraft_fee < 0 {
                return Err(AccountError::Validation(
                    "Overdraft fee cannot be negative.".into(),
                ));
            }
        }
        Ok(())
    }
}

/// A pure-read snapshot of an account's identity and balance.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    #[serde(rename = "account")]
    pub number: AccountNumber,

    pub holder: String,

    pub kind: &'static str,

    #[serde(serialize_with = "serialize_money")]
    pub balance: Money,
}

impl fmt::Display for AccountSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | Balance: {}",
            self.number,
            self.holder,
            format_money(self.balance)
        )
    }
}

/// An account statement: the full ordered ledger plus the current balance.
#[derive(Debug, Clone)]
pub struct Statement {
    pub summary: AccountSummary,
    pub transactions: Vec<Transaction>,
}

impl Statement {
    /// Writes the ledger as CSV, one row per transaction.
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        for transaction in &self.transactions {
            writer.serialize(transaction)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "--- Statement for {} ({}) ---",
            self.summary.number, self.summary.holder
        )?;
        writeln!(f, "Current balance: {}", format_money(self.summary.balance))?;
        writeln!(
            f,
            "Date & Time           | Type     | Amount     | BalanceAfter | Description"
        )?;
        writeln!(
            f,
            "-----------------------+----------+------------+--------------+----------------"
        )?;
        for transaction in &self.transactions {
            writeln!(f, "{transaction}")?;
        }
        write!(
            f,
            "---------------------------------------- End of statement ----------------------------------------"
        )
    }
}

/// Represents a bank account of either kind with its own transaction log.
#[derive(Debug, Clone)]
pub struct Account {
    /// The unique identifier of the account.
    number: AccountNumber,

    /// The name of the account holder.
    holder: String,

    /// The current balance. May be negative for current accounts.
    balance: Money,

    /// Variant and its policy parameters.
    kind: AccountKind,

    /// Append-only ledger, in chronological order.
    transactions: Vec<Transaction>,
}

impl Account {
    /// Opens a new account and records the `OPEN` transaction.
    /// Returns an error if an identifier is empty, the initial balance is negative
    /// or the variant's parameters are invalid.
    pub fn open(
        number: impl Into<AccountNumber>,
        holder: impl Into<String>,
        initial_balance: Money,
        kind: AccountKind,
    ) -> Result<Self, AccountError> {
        let number = number.into();
        let holder = holder.into();
        if number.is_empty() {
            return Err(AccountError::Validation("Account number required".into()));
        }
        if holder.is_empty() {
            return Err(AccountError::Validation(
                "Account holder name required".into(),
            ));
        }
        if initial_balance < 0 {
            return Err(AccountError::Validation(
                "Initial balance cannot be negative".into(),
            ));
        }
        kind.validate()?;

        let mut account = Account {
            number,
            holder,
            balance: initial_balance,
            kind,
            transactions: Vec::new(),
        };
        account.record(TransactionKind::Open, initial_balance, "Account opened");
        Ok(account)
    }

    pub fn get_holder(&self) -> &str {
        &self.holder
    }

    pub fn get_balance(&self) -> Money {
        self.balance
    }

    pub fn get_kind(&self) -> AccountKind {
        self.kind
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    fn record(&mut self, kind: TransactionKind, amount: Money, description: &str) {
        self.transactions
            .push(Transaction::new(kind, amount, self.balance, description));
    }

    /// Deposits the specified amount into the account.
    pub fn deposit(&mut self, amount: Money) -> Result<Money, AccountError> {
        if amount <= 0 {
            return Err(AccountError::Validation(
                "Deposit amount must be greater than zero.".into(),
            ));
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| AccountError::Validation("Deposit amount is too large.".into()))?;
        self.record(TransactionKind::Deposit, amount, "Deposit");
        info!(account = %self.number, amount, balance = self.balance, "deposit");
        Ok(self.balance)
    }

    /// Withdraws the specified amount under the account's variant policy.
    /// On any error the balance and the ledger are left untouched.
    pub fn withdraw(&mut self, amount: Money) -> Result<Money, AccountError> {
        if amount <= 0 {
            return Err(AccountError::Validation(
                "Withdrawal amount must be greater than zero.".into(),
            ));
        }
        let projected = self
            .balance
            .checked_sub(amount)
            .ok_or_else(|| AccountError::Validation("Withdrawal amount is too large.".into()))?;

        match self.kind {
            AccountKind::Savings { .. } => {
                if projected < MIN_BALANCE {
                    warn!(account = %self.number, amount, "savings withdrawal rejected");
                    return Err(AccountError::InsufficientFunds(format!(
                        "Cannot withdraw. Savings accounts must maintain a minimum balance of {}",
                        format_money(MIN_BALANCE)
                    )));
                }
                self.balance = projected;
                self.record(TransactionKind::Withdraw, amount, "Savings withdrawal");
            }
            AccountKind::Current {
                overdraft_limit,
                overdraft_fee,
            } => {
                if projected < -overdraft_limit {
                    warn!(account = %self.number, amount, "current withdrawal rejected");
                    return Err(AccountError::InsufficientFunds(format!(
                        "Cannot withdraw: would exceed overdraft limit of {}",
                        format_money(overdraft_limit)
                    )));
                }
                // The fee is not checked against the overdraft limit.
                let after_fee = if projected < 0 {
                    Some(projected.checked_sub(overdraft_fee).ok_or_else(|| {
                        AccountError::Validation("Withdrawal amount is too large.".into())
                    })?)
                } else {
                    None
                };
                self.balance = projected;
                self.record(TransactionKind::Withdraw, amount, "Current withdrawal");
                if let Some(after_fee) = after_fee {
                    self.balance = after_fee;
                    self.record(TransactionKind::Fee, overdraft_fee, "Overdraft fee applied");
                    info!(account = %self.number, fee = overdraft_fee, "overdraft fee applied");
                }
            }
        }
        info!(account = %self.number, amount, balance = self.balance, "withdrawal");
        Ok(self.balance)
    }

    /// Computes one month of simple interest without changing the account.
    /// Fails if the account is not a savings account or crediting would overflow.
    pub fn monthly_interest(&self) -> Result<Money, AccountError> {
        let AccountKind::Savings {
            annual_interest_rate,
        } = self.kind
        else {
            return Err(AccountError::NotSavingsAccount(self.number.clone()));
        };

        // balance * (rate / 100 / 12), rate and balance both carry SCALE.
        let interest = div_round(
            self.balance as i128 * annual_interest_rate as i128,
            100 * 12 * SCALE as i128,
        );
        let too_large = || AccountError::Validation("Interest amount is too large.".into());
        let interest = Money::try_from(interest).map_err(|_| too_large())?;
        if interest > 0 {
            self.balance.checked_add(interest).ok_or_else(too_large)?;
        }
        Ok(interest.max(0))
    }

    /// Credits one month of simple interest to a savings account.
    /// Returns the credited amount, zero when the computed interest is not positive.
    pub fn apply_monthly_interest(&mut self) -> Result<Money, AccountError> {
        let interest = self.monthly_interest()?;
        if interest == 0 {
            debug!(account = %self.number, "no interest to apply");
            return Ok(0);
        }
        self.balance += interest;
        self.record(TransactionKind::Interest, interest, "Monthly interest applied");
        info!(account = %self.number, interest, balance = self.balance, "interest applied");
        Ok(interest)
    }

    /// Returns the account number, holder, variant and current balance.
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            number: self.number.clone(),
            holder: self.holder.clone(),
            kind: self.kind.label(),
            balance: self.balance,
        }
    }

    /// Returns the full ledger together with the current balance.
    pub fn statement(&self) -> Statement {
        Statement {
            summary: self.summary(),
            transactions: self.transactions.clone(),
        }
    }
}

/// Errors raised by account operations. None of them leave partial state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    InsufficientFunds(String),
    #[error("Account {0} is not a savings account")]
    NotSavingsAccount(AccountNumber),
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn savings(balance: Money) -> Account {
        Account::open(
            "SA1001",
            "Alice",
            balance,
            AccountKind::Savings {
                annual_interest_rate: 25_000,
            },
        )
        .unwrap()
    }

    fn current(balance: Money, overdraft_limit: Money, overdraft_fee: Money) -> Account {
        Account::open(
            "CA2001",
            "Bob",
            balance,
            AccountKind::Current {
                overdraft_limit,
                overdraft_fee,
            },
        )
        .unwrap()
    }

    fn kinds(account: &Account) -> Vec<TransactionKind> {
        account
            .get_transactions()
            .iter()
            .map(Transaction::get_kind)
            .collect()
    }

    #[test]
    fn test_open_records_open_transaction() {
        let account = savings(50_000_000);
        assert_eq!(account.get_balance(), 50_000_000);
        assert_eq!(kinds(&account), vec![TransactionKind::Open]);
        let open = &account.get_transactions()[0];
        assert_eq!(open.get_amount(), 50_000_000);
        assert_eq!(open.get_balance_after(), 50_000_000);
        assert_eq!(open.get_description(), "Account opened");
    }

    #[test]
    fn test_open_validation() {
        let kind = AccountKind::Savings {
            annual_interest_rate: 0,
        };
        assert!(matches!(
            Account::open("", "Alice", 0, kind),
            Err(AccountError::Validation(_))
        ));
        assert!(matches!(
            Account::open("SA1", "", 0, kind),
            Err(AccountError::Validation(_))
        ));
        assert!(matches!(
            Account::open("SA1", "Alice", -1, kind),
            Err(AccountError::Validation(_))
        ));
        let negative_limit = AccountKind::Current {
            overdraft_limit: -1,
            overdraft_fee: 0,
        };
        assert_eq!(
            Account::open("CA1", "Bob", 0, negative_limit).unwrap_err(),
            AccountError::Validation("Overdraft limit cannot be negative.".into())
        );
        let negative_fee = AccountKind::Current {
            overdraft_limit: 0,
            overdraft_fee: -1,
        };
        assert_eq!(
            Account::open("CA1", "Bob", 0, negative_fee).unwrap_err(),
            AccountError::Validation("Overdraft fee cannot be negative.".into())
        );
    }

    #[test]
    fn test_deposit() {
        let mut account = current(0, 0, 0);
        assert_eq!(account.deposit(1_500_000), Ok(1_500_000));
        assert_eq!(kinds(&account), vec![TransactionKind::Open, TransactionKind::Deposit]);
        let deposit = &account.get_transactions()[1];
        assert_eq!(deposit.get_amount(), 1_500_000);
        assert_eq!(deposit.get_description(), "Deposit");
    }

    #[test]
    fn test_deposit_rejects_non_positive() {
        let mut account = savings(50_000_000);
        assert!(matches!(account.deposit(0), Err(AccountError::Validation(_))));
        assert!(matches!(account.deposit(-10), Err(AccountError::Validation(_))));
        assert_eq!(account.get_balance(), 50_000_000);
        assert_eq!(account.get_transactions().len(), 1);
    }

    #[test]
    fn test_deposit_overflow_leaves_state() {
        let mut account = savings(i64::MAX - 1);
        assert!(matches!(account.deposit(2), Err(AccountError::Validation(_))));
        assert_eq!(account.get_balance(), i64::MAX - 1);
        assert_eq!(account.get_transactions().len(), 1);
    }

    #[test]
    fn test_savings_withdrawal() {
        let mut account = savings(50_000_000);
        assert_eq!(account.withdraw(40_000_000), Ok(10_000_000));
        let withdrawal = &account.get_transactions()[1];
        assert_eq!(withdrawal.get_kind(), TransactionKind::Withdraw);
        assert_eq!(withdrawal.get_description(), "Savings withdrawal");
    }

    #[test]
    fn test_savings_minimum_balance() {
        let mut account = savings(50_000_000);
        let err = account.withdraw(40_000_001).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot withdraw. Savings accounts must maintain a minimum balance of 1000.00"
        );
        assert_eq!(account.get_balance(), 50_000_000);
        assert_eq!(account.get_transactions().len(), 1);
    }

    #[test]
    fn test_withdraw_rejects_non_positive() {
        let mut account = current(1_000_000, 0, 0);
        assert!(matches!(account.withdraw(0), Err(AccountError::Validation(_))));
        assert!(matches!(account.withdraw(-5), Err(AccountError::Validation(_))));
        assert_eq!(account.get_transactions().len(), 1);
    }

    #[test]
    fn test_current_overdraft_with_fee() {
        let mut account = current(20_000_000, 5_000_000, 500_000);
        assert_eq!(account.withdraw(22_000_000), Ok(-2_500_000));
        assert_eq!(
            kinds(&account),
            vec![
                TransactionKind::Open,
                TransactionKind::Withdraw,
                TransactionKind::Fee
            ]
        );
        let withdrawal = &account.get_transactions()[1];
        assert_eq!(withdrawal.get_balance_after(), -2_000_000);
        assert_eq!(withdrawal.get_description(), "Current withdrawal");
        let fee = &account.get_transactions()[2];
        assert_eq!(fee.get_amount(), 500_000);
        assert_eq!(fee.get_balance_after(), -2_500_000);
        assert_eq!(fee.get_description(), "Overdraft fee applied");
    }

    #[test]
    fn test_current_fee_may_exceed_limit() {
        let mut account = current(20_000_000, 5_000_000, 500_000);
        assert_eq!(account.withdraw(25_000_000), Ok(-5_500_000));
    }

    #[test]
    fn test_current_without_overdraft() {
        let mut account = current(1_000_000, 0, 500_000);
        let err = account.withdraw(1_500_000).unwrap_err();
        assert_eq!(
            err,
            AccountError::InsufficientFunds(
                "Cannot withdraw: would exceed overdraft limit of 0.00".into()
            )
        );
        assert_eq!(account.get_balance(), 1_000_000);
        assert_eq!(account.get_transactions().len(), 1);
        // Landing exactly on zero charges no fee.
        assert_eq!(account.withdraw(1_000_000), Ok(0));
        assert_eq!(account.get_transactions().len(), 2);
    }

    #[test]
    fn test_monthly_interest() {
        let mut account = savings(50_000_000);
        assert_eq!(account.apply_monthly_interest(), Ok(104_167));
        assert_eq!(account.get_balance(), 50_104_167);
        let interest = account.get_transactions().last().unwrap();
        assert_eq!(interest.get_kind(), TransactionKind::Interest);
        assert_eq!(interest.get_description(), "Monthly interest applied");
    }

    #[test]
    fn test_monthly_interest_no_op() {
        let mut account = Account::open(
            "SA1",
            "Alice",
            50_000_000,
            AccountKind::Savings {
                annual_interest_rate: 0,
            },
        )
        .unwrap();
        assert_eq!(account.apply_monthly_interest(), Ok(0));
        assert_eq!(account.get_transactions().len(), 1);
    }

    #[test]
    fn test_monthly_interest_overflow_leaves_state() {
        let mut account = savings(i64::MAX - 1);
        let err = AccountError::Validation("Interest amount is too large.".into());
        assert_eq!(account.monthly_interest(), Err(err.clone()));
        assert_eq!(account.apply_monthly_interest(), Err(err));
        assert_eq!(account.get_balance(), i64::MAX - 1);
        assert_eq!(account.get_transactions().len(), 1);
    }

    #[test]
    fn test_monthly_interest_on_current_account() {
        let mut account = current(20_000_000, 0, 0);
        assert_eq!(
            account.apply_monthly_interest(),
            Err(AccountError::NotSavingsAccount("CA2001".into()))
        );
        assert_eq!(account.get_transactions().len(), 1);
    }

    #[test]
    fn test_summary_and_statement() {
        let mut account = savings(50_000_000);
        account.deposit(10_000).unwrap();
        let summary = account.summary();
        assert_eq!(summary.to_string(), "SA1001 | Alice | Balance: 5001.00");
        assert_eq!(summary.kind, "Savings");
        let statement = account.statement();
        assert_eq!(statement.transactions.len(), 2);
        let text = statement.to_string();
        assert!(text.starts_with("--- Statement for SA1001 (Alice) ---\nCurrent balance: 5001.00\n"));
        assert_eq!(text.lines().count(), 7);

        let mut csv = vec![];
        statement.write_csv(&mut csv).unwrap();
        assert_eq!(String::from_utf8(csv).unwrap().lines().count(), 3);
    }

    proptest! {
        #[test]
        fn prop_deposit_adds_amount(balance in 0..1_000_000_000_000i64, amount in 1..1_000_000_000_000i64) {
            let mut account = savings(balance);
            prop_assert_eq!(account.deposit(amount), Ok(balance + amount));
            prop_assert_eq!(account.get_transactions().len(), 2);
        }

        #[test]
        fn prop_savings_policy(balance in 0..100_000_000i64, amount in 1..100_000_000i64) {
            let mut account = savings(balance);
            let result = account.withdraw(amount);
            if balance - amount < MIN_BALANCE {
                prop_assert!(matches!(result, Err(AccountError::InsufficientFunds(_))));
                prop_assert_eq!(account.get_balance(), balance);
                prop_assert_eq!(account.get_transactions().len(), 1);
            } else {
                prop_assert_eq!(result, Ok(balance - amount));
                prop_assert_eq!(account.get_transactions().len(), 2);
            }
        }

        #[test]
        fn prop_current_policy(
            balance in 0..100_000_000i64,
            amount in 1..100_000_000i64,
            limit in 0..10_000_000i64,
            fee in 0..1_000_000i64,
        ) {
            let mut account = current(balance, limit, fee);
            let result = account.withdraw(amount);
            let projected = balance - amount;
            if projected < -limit {
                prop_assert!(matches!(result, Err(AccountError::InsufficientFunds(_))));
                prop_assert_eq!(account.get_balance(), balance);
                prop_assert_eq!(account.get_transactions().len(), 1);
            } else if projected < 0 {
                prop_assert_eq!(result, Ok(projected - fee));
                prop_assert_eq!(account.get_transactions().len(), 3);
            } else {
                prop_assert_eq!(result, Ok(projected));
                prop_assert_eq!(account.get_transactions().len(), 2);
            }
        }
    }
}
