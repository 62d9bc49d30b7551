// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix_web::dev::ServerHandle;
use anyhow::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use heagg_aggregator::AggregatorServer;
use heagg_client::{
    fetch_result, run_role, AggregatorApi, ClientError, Collaborators, FileSecretStore,
    HttpAggregatorClient, MemorySecretStore, Role, RoleOptions, RoleOutcome, SecretStore,
    SummaryRecord, SummarySource,
};
use heagg_config::{AggregationMode, ValidUrl};
use heagg_fhe::{BfvPreset, FheError, PublicContext, SchemeKind};
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::tempdir;

/// Five points on `y = value * x`, so the derived update is exactly `value`
struct FixedSummary(f64);

#[async_trait]
impl SummarySource for FixedSummary {
    async fn fetch(&self) -> heagg_client::Result<Vec<SummaryRecord>> {
        Ok(vec![SummaryRecord::new(1.0, self.0); 5])
    }
}

struct Aggregator {
    handle: ServerHandle,
    url: ValidUrl,
    context_file: PathBuf,
    _dir: tempfile::TempDir,
}

impl Aggregator {
    async fn start() -> Result<Self> {
        let dir = tempdir()?;
        let context_file = dir.path().join("published/public_context.ctx");
        let server = AggregatorServer::builder()
            .with_host("127.0.0.1")
            .with_port(0)
            .with_public_context_write_path(Some(&context_file))
            .build();
        let bound = server.bind()?;
        let url: ValidUrl = format!("http://{}", bound.addrs[0]).parse()?;
        let handle = bound.server.handle();
        actix_web::rt::spawn(bound.server);
        Ok(Self {
            handle,
            url,
            context_file,
            _dir: dir,
        })
    }

    fn api(&self) -> HttpAggregatorClient {
        HttpAggregatorClient::new(self.url.clone())
    }

    async fn stop(self) {
        self.handle.stop(true).await;
    }
}

fn options(aggregation: AggregationMode, insecure_passthrough: bool) -> RoleOptions {
    RoleOptions {
        aggregation,
        insecure_passthrough,
        bfv_preset: BfvPreset::Aggregation4096,
        ..RoleOptions::default()
    }
}

/// keyholder, one contributor per value, decryptor. Returns the decryptor's outcome.
async fn run_protocol(
    api: &dyn AggregatorApi,
    secrets: &dyn SecretStore,
    values: &[f64],
    options: &RoleOptions,
) -> Result<RoleOutcome> {
    let unused = FixedSummary(0.0);
    run_role(
        Role::Keyholder,
        Collaborators {
            api,
            summary: &unused,
            secrets,
        },
        options,
    )
    .await?;

    for (i, value) in values.iter().enumerate() {
        let summary = FixedSummary(*value);
        let options = RoleOptions {
            client_id: Some(format!("participant-{i}")),
            ..options.clone()
        };
        let outcome = run_role(
            Role::Contributor,
            Collaborators {
                api,
                summary: &summary,
                secrets: &MemorySecretStore::new(),
            },
            &options,
        )
        .await?;
        assert!(matches!(outcome, RoleOutcome::Contributed { stored, .. } if stored == i + 1));
    }

    Ok(run_role(
        Role::Decryptor,
        Collaborators {
            api,
            summary: &unused,
            secrets,
        },
        options,
    )
    .await?)
}

async fn get_json(url: &ValidUrl, path: &str) -> Result<(u16, Value)> {
    let response = reqwest::get(url.endpoint(path)).await?;
    let status = response.status().as_u16();
    Ok((status, response.json().await?))
}

#[cfg(feature = "bfv")]
#[actix_web::test]
async fn bfv_mean_of_two_contributors() -> Result<()> {
    let aggregator = Aggregator::start().await?;
    let dir = tempdir()?;
    let secrets = FileSecretStore::new(dir.path().join("local_secret_context.ctx"));

    let outcome = run_protocol(
        &aggregator.api(),
        &secrets,
        &[10.0, 20.0],
        &options(AggregationMode::Mean, false),
    )
    .await?;
    assert!(matches!(
        outcome,
        RoleOutcome::Decrypted {
            contributions: 2,
            secure: true,
            ..
        }
    ));

    let result = fetch_result(&aggregator.api()).await?;
    assert!((result.value - 15.0).abs() < 1e-3, "{}", result.value);
    assert_eq!(result.contributions, Some(2));

    // The same value over plain HTTP
    let (status, body) = get_json(&aggregator.url, "get_plain_aggregate").await?;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["contributions"], 2);

    // The published context was mirrored to disk and is a BFV context
    let on_disk = std::fs::read(&aggregator.context_file)?;
    let context = PublicContext::from_bytes(&on_disk)?;
    assert_eq!(context.scheme(), SchemeKind::Bfv);

    aggregator.stop().await;
    Ok(())
}

#[cfg(feature = "bfv")]
#[actix_web::test]
async fn bfv_sum_of_two_contributors() -> Result<()> {
    let aggregator = Aggregator::start().await?;
    let secrets = MemorySecretStore::new();

    run_protocol(
        &aggregator.api(),
        &secrets,
        &[10.0, 20.0],
        &options(AggregationMode::Sum, false),
    )
    .await?;

    let result = fetch_result(&aggregator.api()).await?;
    assert!((result.value - 30.0).abs() < 1e-3, "{}", result.value);

    aggregator.stop().await;
    Ok(())
}

#[actix_web::test]
async fn passthrough_fallback_gives_the_same_result() -> Result<()> {
    let aggregator = Aggregator::start().await?;
    let secrets = MemorySecretStore::new();

    let outcome = run_protocol(
        &aggregator.api(),
        &secrets,
        &[10.0, 20.0],
        &options(AggregationMode::Mean, true),
    )
    .await?;
    assert!(matches!(outcome, RoleOutcome::Decrypted { secure: false, .. }));

    let result = fetch_result(&aggregator.api()).await?;
    assert_eq!(result.value, 15.0);

    aggregator.stop().await;
    Ok(())
}

#[actix_web::test]
async fn roles_out_of_order_report_what_is_missing() -> Result<()> {
    let aggregator = Aggregator::start().await?;
    let api = aggregator.api();
    let opts = options(AggregationMode::Mean, true);

    let err = run_role(
        Role::Contributor,
        Collaborators {
            api: &api,
            summary: &FixedSummary(1.0),
            secrets: &MemorySecretStore::new(),
        },
        &opts,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)), "{err}");

    let dir = tempdir()?;
    let err = run_role(
        Role::Decryptor,
        Collaborators {
            api: &api,
            summary: &FixedSummary(1.0),
            secrets: &FileSecretStore::new(dir.path().join("missing.ctx")),
        },
        &opts,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ClientError::LocalContextMissing(_)), "{err}");

    let err = fetch_result(&api).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)), "{err}");

    aggregator.stop().await;
    Ok(())
}

#[actix_web::test]
async fn decryptor_refuses_a_replaced_context() -> Result<()> {
    let aggregator = Aggregator::start().await?;
    let api = aggregator.api();
    let first_keyholder = MemorySecretStore::new();
    let opts = options(AggregationMode::Sum, true);

    run_protocol(&api, &first_keyholder, &[1.0], &opts).await?;

    // A second keyholder publishes a new context
    let second_keyholder = MemorySecretStore::new();
    run_role(
        Role::Keyholder,
        Collaborators {
            api: &api,
            summary: &FixedSummary(0.0),
            secrets: &second_keyholder,
        },
        &opts,
    )
    .await?;

    let err = run_role(
        Role::Decryptor,
        Collaborators {
            api: &api,
            summary: &FixedSummary(0.0),
            secrets: &first_keyholder,
        },
        &opts,
    )
    .await
    .unwrap_err();
    assert!(
        matches!(err, ClientError::Fhe(FheError::ParameterMismatch)),
        "{err}"
    );

    aggregator.stop().await;
    Ok(())
}

#[actix_web::test]
async fn raw_http_surface() -> Result<()> {
    let aggregator = Aggregator::start().await?;
    let url = &aggregator.url;
    let client = reqwest::Client::new();

    let (status, body) = get_json(url, "ping").await?;
    assert_eq!((status, body["status"].as_str()), (200, Some("ok")));

    let (status, body) = get_json(url, "get_plain_aggregate").await?;
    assert_eq!(status, 404);
    assert_eq!(body["status"], "no_plaintext");

    for blob in [[1u8, 2, 3], [4, 5, 6]] {
        let response = client
            .post(url.endpoint("cipher"))
            .json(&json!({ "ciphertext": STANDARD.encode(blob) }))
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 200);
    }
    let (_, body) = get_json(url, "get_agg_cipher").await?;
    assert_eq!(body["ciphertexts"], json!(["AQID", "BAUG"]));

    let response = client
        .post(url.endpoint("cipher"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], "error");

    // Still serving after the bad request
    let response = client
        .post(url.endpoint("plain_aggregate"))
        .json(&json!({ "plaintext_aggregate": 42.5 }))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 200);
    let (status, body) = get_json(url, "get_plain_aggregate").await?;
    assert_eq!(status, 200);
    assert_eq!(body["plaintext_aggregate"], 42.5);

    aggregator.stop().await;
    Ok(())
}
