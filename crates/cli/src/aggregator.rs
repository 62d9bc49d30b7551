// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use heagg_aggregator::AggregatorServer;
use heagg_config::AppConfig;
use tracing::{info, instrument};

#[instrument(skip_all)]
pub async fn execute(config: &AppConfig) -> Result<()> {
    let settings = config.aggregator();
    let server = AggregatorServer::builder()
        .with_host(settings.host.clone())
        .with_port(settings.port)
        .with_max_body_bytes(settings.max_body_bytes)
        .with_public_context_write_path(settings.public_context_write_path.clone())
        .build();

    info!("LAUNCHING AGGREGATOR: ({})", server.bind_address());
    server.run().await?;
    info!("Aggregator stopped");
    Ok(())
}
