//! Banking module for accounts, their ledgers, the account registry and the state task.
mod account;
mod registry;
mod state;
mod transaction;
mod types;

pub use account::*;
pub use registry::*;
pub use state::*;
pub use transaction::*;
pub use types::*;
