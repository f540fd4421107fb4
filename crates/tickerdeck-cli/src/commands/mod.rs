mod historical;
mod most_active;
mod quote;
mod trending;

use serde_json::Value;
use tickerdeck_core::RequestGovernor;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli, governor: &RequestGovernor) -> Result<Value, CliError> {
    match &cli.command {
        Command::Quote(args) => quote::run(args, governor).await,
        Command::Trending => trending::run(governor).await,
        Command::MostActive(args) => most_active::run(args, governor).await,
        Command::Historical(args) => historical::run(args, governor).await,
    }
}
