//! The `State` module serializes all account operations through one task.
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::bank::{
    AccountKind, AccountSummary, Registry, RegistryError, Statement,
    types::{AccountNumber, Money},
};

/// The size of the channel for queued requests.
pub const CHANNEL_SIZE: usize = 100;

type Reply<T> = oneshot::Sender<Result<T, RegistryError>>;

/// A request for the state task, carrying the channel for its answer.
#[derive(Debug)]
pub enum Request {
    Open {
        number: AccountNumber,
        holder: String,
        initial_balance: Money,
        kind: AccountKind,
        reply: Reply<AccountSummary>,
    },
    Deposit {
        number: AccountNumber,
        amount: Money,
        reply: Reply<Money>,
    },
    Withdraw {
        number: AccountNumber,
        amount: Money,
        reply: Reply<Money>,
    },
    ApplyInterest {
        number: AccountNumber,
        reply: Reply<Money>,
    },
    ApplyInterestAll {
        reply: Reply<usize>,
    },
    Statement {
        number: AccountNumber,
        reply: Reply<Statement>,
    },
    Summary {
        number: AccountNumber,
        reply: Reply<AccountSummary>,
    },
    List {
        reply: oneshot::Sender<Vec<AccountSummary>>,
    },
}

/// Owns the registry. Each request runs to completion before the next one starts,
/// so every account mutation is atomic with respect to all other requests.
pub struct State {
    /// All accounts of the process.
    registry: Registry,
    /// A channel receiver for incoming requests.
    receiver: mpsc::Receiver<Request>,
}

impl State {
    /// Creates the state task's owner together with a handle for talking to it.
    pub fn new(registry: Registry) -> (Self, BankHandle) {
        let (sender, receiver) = mpsc::channel(CHANNEL_SIZE);
        (State { registry, receiver }, BankHandle { sender })
    }

    fn handle(&mut self, request: Request) {
        // A dropped reply receiver only means the caller went away.
        match request {
            Request::Open {
                number,
                holder,
                initial_balance,
                kind,
                reply,
            } => {
                let _ = reply.send(self.registry.create(&number, &holder, initial_balance, kind));
            }
            Request::Deposit {
                number,
                amount,
                reply,
            } => {
                let result = self
                    .registry
                    .lookup_mut(&number)
                    .and_then(|account| account.deposit(amount).map_err(Into::into));
                let _ = reply.send(result);
            }
            Request::Withdraw {
                number,
                amount,
                reply,
            } => {
                let result = self
                    .registry
                    .lookup_mut(&number)
                    .and_then(|account| account.withdraw(amount).map_err(Into::into));
                let _ = reply.send(result);
            }
            Request::ApplyInterest { number, reply } => {
                let result = self
                    .registry
                    .lookup_mut(&number)
                    .and_then(|account| account.apply_monthly_interest().map_err(Into::into));
                let _ = reply.send(result);
            }
            Request::ApplyInterestAll { reply } => {
                let _ = reply.send(self.registry.apply_monthly_interest_all());
            }
            Request::Statement { number, reply } => {
                debug!(account = %number, "statement");
                let _ = reply.send(self.registry.lookup(&number).map(|account| account.statement()));
            }
            Request::Summary { number, reply } => {
                let _ = reply.send(self.registry.lookup(&number).map(|account| account.summary()));
            }
            Request::List { reply } => {
                let _ = reply.send(self.registry.list());
            }
        }
    }

    /// Runs the request loop until every handle is dropped, then returns the registry.
    pub async fn run(mut self) -> Registry {
        while let Some(request) = self.receiver.recv().await {
            self.handle(request);
        }
        debug!("all bank handles dropped, state task stopping");
        self.registry
    }
}

/// A cloneable client of the state task.
#[derive(Clone, Debug)]
pub struct BankHandle {
    sender: mpsc::Sender<Request>,
}

impl BankHandle {
    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> Result<T, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(make(reply))
            .await
            .map_err(|_| ServiceError::Closed)?;
        response.await.map_err(|_| ServiceError::Closed)
    }

    pub async fn open(
        &self,
        number: &str,
        holder: &str,
        initial_balance: Money,
        kind: AccountKind,
    ) -> Result<AccountSummary, ServiceError> {
        Ok(self
            .call(|reply| Request::Open {
                number: number.to_string(),
                holder: holder.to_string(),
                initial_balance,
                kind,
                reply,
            })
            .await??)
    }

    pub async fn deposit(&self, number: &str, amount: Money) -> Result<Money, ServiceError> {
        Ok(self
            .call(|reply| Request::Deposit {
                number: number.to_string(),
                amount,
                reply,
            })
            .await??)
    }

    pub async fn withdraw(&self, number: &str, amount: Money) -> Result<Money, ServiceError> {
        Ok(self
            .call(|reply| Request::Withdraw {
                number: number.to_string(),
                amount,
                reply,
            })
            .await??)
    }

    pub async fn apply_interest(&self, number: &str) -> Result<Money, ServiceError> {
        Ok(self
            .call(|reply| Request::ApplyInterest {
                number: number.to_string(),
                reply,
            })
            .await??)
    }

    pub async fn apply_interest_all(&self) -> Result<usize, ServiceError> {
        Ok(self
            .call(|reply| Request::ApplyInterestAll { reply })
            .await??)
    }

    pub async fn statement(&self, number: &str) -> Result<Statement, ServiceError> {
        Ok(self
            .call(|reply| Request::Statement {
                number: number.to_string(),
                reply,
            })
            .await??)
    }

    pub async fn summary(&self, number: &str) -> Result<AccountSummary, ServiceError> {
        Ok(self
            .call(|reply| Request::Summary {
                number: number.to_string(),
                reply,
            })
            .await??)
    }

    pub async fn list(&self) -> Result<Vec<AccountSummary>, ServiceError> {
        self.call(|reply| Request::List { reply }).await
    }
}

/// Errors returned to clients of the state task.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Bank service is not running")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{AccountError, SCALE, TransactionKind};

    #[tokio::test]
    async fn test_operations_through_handle() {
        let (state, handle) = State::new(Registry::with_demo_accounts());
        let task = tokio::spawn(state.run());

        assert_eq!(handle.deposit("SA1001", 100 * SCALE).await, Ok(5100 * SCALE));
        assert_eq!(handle.withdraw("CA2001", 2200 * SCALE).await, Ok(-250 * SCALE));
        assert_eq!(handle.summary("CA2001").await.unwrap().balance, -250 * SCALE);

        let statement = handle.statement("CA2001").await.unwrap();
        let kinds: Vec<_> = statement.transactions.iter().map(|t| t.get_kind()).collect();
        assert_eq!(
            kinds,
            vec![TransactionKind::Open, TransactionKind::Withdraw, TransactionKind::Fee]
        );
        assert_eq!(handle.list().await.unwrap().len(), 2);

        drop(handle);
        let registry = task.await.unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_errors_are_returned() {
        let (state, handle) = State::new(Registry::new());
        tokio::spawn(state.run());

        assert_eq!(
            handle.deposit("XX", SCALE).await,
            Err(ServiceError::Registry(RegistryError::NotFound("XX".into())))
        );
        let kind = AccountKind::Current {
            overdraft_limit: 0,
            overdraft_fee: 0,
        };
        handle.open("CA1", "Bob", 100 * SCALE, kind).await.unwrap();
        assert_eq!(
            handle.open("CA1", "Bob", 0, kind).await,
            Err(ServiceError::Registry(RegistryError::DuplicateAccount("CA1".into())))
        );
        assert!(matches!(
            handle.withdraw("CA1", 150 * SCALE).await,
            Err(ServiceError::Registry(RegistryError::Account(
                AccountError::InsufficientFunds(_)
            )))
        ));
        assert!(matches!(
            handle.apply_interest("CA1").await,
            Err(ServiceError::Registry(RegistryError::Account(
                AccountError::NotSavingsAccount(_)
            )))
        ));
        assert_eq!(handle.summary("CA1").await.unwrap().balance, 100 * SCALE);
        assert_eq!(handle.apply_interest_all().await, Ok(0));
    }

    #[tokio::test]
    async fn test_closed_service() {
        let (state, handle) = State::new(Registry::new());
        drop(state);
        assert_eq!(handle.list().await, Err(ServiceError::Closed));
    }
}
