//! Command-line configuration.
use std::path::PathBuf;

use clap::Parser;

/// Bank account simulation with savings and current accounts.
#[derive(Parser, Debug)]
#[command(name = "banksim", version, about, long_about = None)]
pub struct Cli {
    /// Replay a CSV file of operations instead of starting the interactive menu
    #[arg(long, value_name = "FILE")]
    pub batch: Option<PathBuf>,

    /// In batch mode, print this account's statement as CSV instead of the account list
    #[arg(long, value_name = "ACCOUNT", requires = "batch")]
    pub statement: Option<String>,

    /// Start without the demo accounts SA1001 and CA2001
    #[arg(long)]
    pub no_demo: bool,

    /// Log filter directive, e.g. `info` or `banksim=debug`
    #[arg(long, env = "BANKSIM_LOG", default_value = "warn")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["banksim"]).unwrap();
        assert!(cli.batch.is_none());
        assert!(!cli.no_demo);
    }

    #[test]
    fn test_batch_flags() {
        let cli = Cli::try_parse_from(["banksim", "--batch", "ops.csv", "--no-demo"]).unwrap();
        assert_eq!(cli.batch, Some(PathBuf::from("ops.csv")));
        assert!(cli.no_demo);
    }

    #[test]
    fn test_statement_requires_batch() {
        assert!(Cli::try_parse_from(["banksim", "--statement", "SA1001"]).is_err());
        let cli =
            Cli::try_parse_from(["banksim", "--batch", "ops.csv", "--statement", "SA1001"]).unwrap();
        assert_eq!(cli.statement.as_deref(), Some("SA1001"));
    }
}
