use serde::Serialize;
use serde_json::Value;

use tickerdeck_core::{Exchange, MarketCard, RequestGovernor};

use crate::cli::MostActiveArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct MostActiveResponseData {
    exchange: Exchange,
    cards: Vec<MarketCard>,
}

pub async fn run(args: &MostActiveArgs, governor: &RequestGovernor) -> Result<Value, CliError> {
    let exchange = Exchange::from(args.exchange);
    let cards = governor.most_active(exchange).await;
    Ok(serde_json::to_value(MostActiveResponseData {
        exchange,
        cards,
    })?)
}
