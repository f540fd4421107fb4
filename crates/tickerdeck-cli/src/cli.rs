//! CLI argument definitions for tickerdeck.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Fetch the latest quote for a symbol |
//! | `trending` | Fetch top gainers and losers |
//! | `most-active` | Fetch the most-active listing for an exchange |
//! | `historical` | Fetch a historical price series |
//!
//! # Examples
//!
//! ```bash
//! tickerdeck quote TCS
//! tickerdeck trending --pretty
//! tickerdeck most-active bse
//! tickerdeck historical INFY --period 6m
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use tickerdeck_core::Exchange;

/// Throttled market-data fetcher for the tickerdeck dashboard.
#[derive(Debug, Parser)]
#[command(
    name = "tickerdeck",
    author,
    version,
    about = "Throttled, cached market-data client"
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the latest quote for a symbol.
    Quote(QuoteArgs),
    /// Fetch trending stocks (top gainers and losers).
    Trending,
    /// Fetch the most-active listing for an exchange.
    MostActive(MostActiveArgs),
    /// Fetch a historical price series, oldest point first.
    Historical(HistoricalArgs),
}

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Stock symbol or company name.
    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct MostActiveArgs {
    /// Exchange to list.
    #[arg(value_enum)]
    pub exchange: ExchangeArg,
}

#[derive(Debug, Args)]
pub struct HistoricalArgs {
    /// Stock symbol or company name.
    pub symbol: String,

    /// Series period (for example `1m`, `6m`, `1yr`, `5yr`).
    #[arg(long)]
    pub period: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExchangeArg {
    Nse,
    Bse,
}

impl From<ExchangeArg> for Exchange {
    fn from(arg: ExchangeArg) -> Self {
        match arg {
            ExchangeArg::Nse => Exchange::Nse,
            ExchangeArg::Bse => Exchange::Bse,
        }
    }
}
