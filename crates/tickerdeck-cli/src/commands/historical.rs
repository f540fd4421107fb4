use serde::Serialize;
use serde_json::Value;

use tickerdeck_core::{HistoricalPoint, RequestGovernor, DEFAULT_PERIOD};

use crate::cli::HistoricalArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct HistoricalResponseData {
    symbol: String,
    period: String,
    points: Vec<HistoricalPoint>,
}

pub async fn run(args: &HistoricalArgs, governor: &RequestGovernor) -> Result<Value, CliError> {
    let period = args.period.as_deref().unwrap_or(DEFAULT_PERIOD);
    let points = governor.historical(&args.symbol, args.period.as_deref()).await;
    let data = HistoricalResponseData {
        symbol: args.symbol.clone(),
        period: period.to_owned(),
        points,
    };
    Ok(serde_json::to_value(data)?)
}
