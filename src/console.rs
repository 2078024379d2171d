//! Interactive menu that drives the bank service from a line-based terminal.
use std::io;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::debug;

use crate::bank::{
    AccountKind, BankHandle, Money, RegistryError, ServiceError, format_money, to_money,
};

const MENU: &str = "\nMenu:
1. Create account (Savings / Current)
2. Deposit
3. Withdraw
4. Print account statement
5. List accounts
6. Apply monthly interest to savings accounts
7. Exit
Choose an option: ";

/// The console controller. Reads commands from `input` and renders to `output`.
pub struct Console<R, W> {
    input: Lines<R>,
    output: W,
    bank: BankHandle,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W, bank: BankHandle) -> Self {
        Console {
            input: input.lines(),
            output,
            bank,
        }
    }

    /// Runs the menu loop until the user exits or the input ends.
    pub async fn run(&mut self) -> Result<()> {
        self.say("=== Welcome to the Bank Account Simulation ===").await?;
        loop {
            match self.step().await {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) if is_eof(&err) => break,
                Err(err) => return Err(err),
            }
        }
        self.say("Thank you for using the simulation. Goodbye!").await?;
        Ok(())
    }

    /// Handles one menu choice. Returns `false` when the session should end.
    async fn step(&mut self) -> Result<bool> {
        let choice = self.ask(MENU).await?;
        match choice.as_str() {
            "1" => self.create_account().await?,
            "2" => self.deposit().await?,
            "3" => self.withdraw().await?,
            "4" => self.print_statement().await?,
            "5" => self.list_accounts().await?,
            "6" => self.apply_interest().await?,
            "7" => return Ok(false),
            _ => {
                self.say("Invalid choice. Please enter a number from the menu.")
                    .await?
            }
        }
        Ok(true)
    }

    async fn create_account(&mut self) -> Result<()> {
        let kind = self
            .ask("Enter account type (S for Savings / C for Current): ")
            .await?
            .to_uppercase();
        let number = self.ask("Enter account number (e.g. SA1002): ").await?;
        if self.exists(&number).await? {
            self.say("Account number already exists. Try again with a unique number.")
                .await?;
            return Ok(());
        }
        let holder = self.ask("Enter account holder name: ").await?;
        let initial_balance = self.ask_amount("Enter initial deposit amount: ").await?;

        let kind = match kind.as_str() {
            "S" => AccountKind::Savings {
                annual_interest_rate: self
                    .ask_amount("Enter annual interest rate (percent, e.g. 2.5): ")
                    .await?,
            },
            "C" => AccountKind::Current {
                overdraft_limit: self.ask_amount("Enter overdraft limit (e.g. 500): ").await?,
                overdraft_fee: self.ask_amount("Enter overdraft fee (e.g. 50): ").await?,
            },
            _ => {
                self.say("Unknown account type. Use S or C.").await?;
                return Ok(());
            }
        };

        match self.bank.open(&number, &holder, initial_balance, kind).await {
            Ok(summary) => {
                self.say(&format!("{} account created: {summary}", kind.label()))
                    .await?
            }
            Err(err) => self.report("Error creating account", err).await?,
        }
        Ok(())
    }

    async fn deposit(&mut self) -> Result<()> {
        let Some(number) = self.ask_account().await? else {
            return Ok(());
        };
        let amount = self.ask_amount("Enter deposit amount: ").await?;
        match self.bank.deposit(&number, amount).await {
            Ok(balance) => {
                self.say(&format!(
                    "Deposit successful. New balance: {}",
                    format_money(balance)
                ))
                .await?
            }
            Err(err) => self.report("Deposit failed", err).await?,
        }
        Ok(())
    }

    async fn withdraw(&mut self) -> Result<()> {
        let Some(number) = self.ask_account().await? else {
            return Ok(());
        };
        let amount = self.ask_amount("Enter withdrawal amount: ").await?;
        match self.bank.withdraw(&number, amount).await {
            Ok(balance) => {
                self.say(&format!(
                    "Withdrawal successful. New balance: {}",
                    format_money(balance)
                ))
                .await?
            }
            Err(err) => self.report("Withdrawal failed", err).await?,
        }
        Ok(())
    }

    async fn print_statement(&mut self) -> Result<()> {
        let Some(number) = self.ask_account().await? else {
            return Ok(());
        };
        match self.bank.statement(&number).await {
            Ok(statement) => self.say(&format!("\n{statement}")).await?,
            Err(err) => self.report("Statement failed", err).await?,
        }
        Ok(())
    }

    async fn list_accounts(&mut self) -> Result<()> {
        let accounts = self.bank.list().await?;
        if accounts.is_empty() {
            self.say("No accounts available.").await?;
            return Ok(());
        }
        self.say("\nAccounts:").await?;
        for summary in accounts {
            self.say(&summary.to_string()).await?;
        }
        Ok(())
    }

    async fn apply_interest(&mut self) -> Result<()> {
        match self.bank.apply_interest_all().await {
            Ok(credited) => {
                self.say(&format!(
                    "Monthly interest applied to {credited} account(s)."
                ))
                .await?
            }
            Err(err) => self.report("Interest run failed", err).await?,
        }
        Ok(())
    }

    /// Prompts for an account number and checks that the account exists.
    async fn ask_account(&mut self) -> Result<Option<String>> {
        let number = self.ask("Enter account number: ").await?;
        if !self.exists(&number).await? {
            self.say("Account not found.").await?;
            return Ok(None);
        }
        Ok(Some(number))
    }

    async fn exists(&self, number: &str) -> Result<bool> {
        match self.bank.summary(number).await {
            Ok(_) => Ok(true),
            Err(ServiceError::Registry(RegistryError::NotFound(_))) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Prompts until the user enters a finite number, converted to fixed-point.
    async fn ask_amount(&mut self, prompt: &str) -> Result<Money> {
        loop {
            let line = self.ask(prompt).await?;
            if let Some(amount) = line.parse::<f64>().ok().and_then(to_money) {
                return Ok(amount);
            }
            self.say("Please enter a valid number.").await?;
        }
    }

    async fn ask(&mut self, prompt: &str) -> Result<String> {
        self.output.write_all(prompt.as_bytes()).await?;
        self.output.flush().await?;
        match self.input.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()),
        }
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }

    /// Prints a recoverable error. Only a stopped service ends the session.
    async fn report(&mut self, context: &str, err: ServiceError) -> Result<()> {
        if err == ServiceError::Closed {
            return Err(err.into());
        }
        debug!("{context}: {err}");
        self.say(&format!("{context}: {err}")).await
    }
}

fn is_eof(err: &anyhow::Error) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|err| err.kind() == io::ErrorKind::UnexpectedEof)
}
