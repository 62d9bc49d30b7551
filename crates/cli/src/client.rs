// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use heagg_client::{
    run_role, Collaborators, FileSecretStore, HttpAggregatorClient, HttpSummarySource, Role,
    RoleOptions, SummarySource, SyntheticSummarySource,
};
use heagg_config::{AppConfig, ClientConfig};
use tracing::{info, instrument};

pub fn role_options(config: &ClientConfig) -> RoleOptions {
    RoleOptions {
        client_id: config.client_id.clone(),
        aggregation: config.aggregation,
        insecure_passthrough: config.insecure_passthrough,
        bfv_preset: config.bfv_preset,
    }
}

#[instrument(skip_all, fields(role = %role))]
pub async fn execute(config: &AppConfig, role: Role) -> Result<()> {
    let settings = config.client();
    let api = HttpAggregatorClient::new(settings.aggregator_url()?.clone());
    let secrets = FileSecretStore::new(&settings.secret_path);
    let summary: Box<dyn SummarySource> = if settings.synthetic_data {
        info!("Using the synthetic dataset");
        Box::new(SyntheticSummarySource::new())
    } else {
        Box::new(HttpSummarySource::new(settings.summary_url.clone()))
    };

    let collaborators = Collaborators {
        api: &api,
        summary: summary.as_ref(),
        secrets: &secrets,
    };
    let outcome = run_role(role, collaborators, &role_options(settings)).await?;
    println!("{outcome}");
    Ok(())
}
