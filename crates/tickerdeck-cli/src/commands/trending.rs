use serde::Serialize;
use serde_json::Value;

use tickerdeck_core::{MarketCard, RequestGovernor};

use crate::error::CliError;

#[derive(Debug, Serialize)]
struct TrendingResponseData {
    cards: Vec<MarketCard>,
}

pub async fn run(governor: &RequestGovernor) -> Result<Value, CliError> {
    let cards = governor.trending().await;
    Ok(serde_json::to_value(TrendingResponseData { cards })?)
}
