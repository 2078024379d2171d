//! Bank account simulation: savings and current accounts with per-account ledgers,
//! an account registry owned by a single tokio task, and console and batch front ends.
pub mod bank;
pub mod batch;
pub mod cli;
pub mod console;
