//! Batch mode: replays a CSV file of account operations against the bank service.
use std::io;

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, de};
use tracing::{info, warn};

use crate::bank::{
    AccountKind, AccountSummary, BankHandle, Money, Rate, ServiceError, to_money,
};

/// Custom deserializer for monetary values to handle fixed-point representation.
fn deserialize_money<'de, D>(deserializer: D) -> Result<Option<Money>, D::Error>
where
    D: de::Deserializer<'de>,
{
    let value: Option<f64> = Option::deserialize(deserializer)?;
    value
        .map(|v| to_money(v).ok_or_else(|| de::Error::custom(format!("invalid amount {v}"))))
        .transpose()
}

/// The operation named in a batch row.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    OpenSavings,
    OpenCurrent,
    Deposit,
    Withdraw,
    Interest,
}

/// One row of a batch file. Columns an operation does not use may be blank.
#[derive(Deserialize, Debug, Clone)]
pub struct Record {
    op: Operation,

    account: String,

    #[serde(default)]
    holder: Option<String>,

    #[serde(default, deserialize_with = "deserialize_money")]
    amount: Option<Money>,

    #[serde(default, deserialize_with = "deserialize_money")]
    rate: Option<Rate>,

    #[serde(default, deserialize_with = "deserialize_money")]
    overdraft_limit: Option<Money>,

    #[serde(default, deserialize_with = "deserialize_money")]
    overdraft_fee: Option<Money>,
}

/// Errors for a single batch row.
#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error("missing column `{0}`")]
    Missing(&'static str),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

fn required<T>(value: Option<T>, column: &'static str) -> Result<T, BatchError> {
    value.ok_or(BatchError::Missing(column))
}

async fn apply(bank: &BankHandle, record: Record) -> Result<(), BatchError> {
    let account = record.account.as_str();
    match record.op {
        Operation::OpenSavings => {
            let kind = AccountKind::Savings {
                annual_interest_rate: record.rate.unwrap_or_default(),
            };
            let holder = required(record.holder, "holder")?;
            bank.open(account, &holder, record.amount.unwrap_or_default(), kind)
                .await?;
        }
        Operation::OpenCurrent => {
            let kind = AccountKind::Current {
                overdraft_limit: record.overdraft_limit.unwrap_or_default(),
                overdraft_fee: record.overdraft_fee.unwrap_or_default(),
            };
            let holder = required(record.holder, "holder")?;
            bank.open(account, &holder, record.amount.unwrap_or_default(), kind)
                .await?;
        }
        Operation::Deposit => {
            bank.deposit(account, required(record.amount, "amount")?)
                .await?;
        }
        Operation::Withdraw => {
            bank.withdraw(account, required(record.amount, "amount")?)
                .await?;
        }
        Operation::Interest => {
            bank.apply_interest(account).await?;
        }
    }
    Ok(())
}

/// Applies every row of `input` in order. Failing rows are logged and skipped.
/// Returns the number of rows that were applied.
pub async fn run<R: io::Read>(bank: &BankHandle, input: R) -> Result<usize, ServiceError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(input);
    let mut applied = 0;
    for (row, record) in reader.deserialize::<Record>().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                warn!(row = row + 1, "Error reading record: {err}");
                continue;
            }
        };
        match apply(bank, record).await {
            Ok(()) => applied += 1,
            Err(BatchError::Service(ServiceError::Closed)) => return Err(ServiceError::Closed),
            Err(err) => warn!(row = row + 1, "Error applying record: {err}"),
        }
    }
    info!(applied, "batch finished");
    Ok(applied)
}

/// Writes account summaries as CSV.
pub fn write_summaries<W: io::Write>(
    accounts: &[AccountSummary],
    writer: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    for account in accounts {
        writer.serialize(account)?;
    }
    writer.flush()?;
    Ok(())
}
