// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use heagg_client::{fetch_result, HttpAggregatorClient};
use heagg_config::AppConfig;
use tracing::instrument;

#[instrument(skip_all)]
pub async fn execute(config: &AppConfig) -> Result<()> {
    let api = HttpAggregatorClient::new(config.client().aggregator_url()?.clone());
    let aggregate = fetch_result(&api).await?;
    match aggregate.contributions {
        Some(n) => println!("{} ({n} contributions)", aggregate.value),
        None => println!("{}", aggregate.value),
    }
    Ok(())
}
