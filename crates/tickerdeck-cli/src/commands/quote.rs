use serde::Serialize;
use serde_json::Value;

use tickerdeck_core::{Quote, RequestGovernor};

use crate::cli::QuoteArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct QuoteResponseData {
    symbol: String,
    quote: Option<Quote>,
}

pub async fn run(args: &QuoteArgs, governor: &RequestGovernor) -> Result<Value, CliError> {
    let quote = governor.quote(&args.symbol).await;
    let data = QuoteResponseData {
        symbol: args.symbol.clone(),
        quote,
    };
    Ok(serde_json::to_value(data)?)
}
