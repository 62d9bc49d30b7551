// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::update::compute_update;
use crate::{AggregatorApi, Result, SecretStore, SummarySource};
use heagg_aggregator::PlaintextAggregate;
use heagg_config::AggregationMode;
use heagg_fhe::{
    probe_scheme, scheme_for, BfvPreset, Ciphertext, ContextId, FheError, PassthroughScheme,
    PublicContext, SchemeKind, SecretContext, SharedScheme, DEFAULT_BFV_PRESET,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// The part a participant plays in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Creates the context, keeps the secret and publishes the public half
    Keyholder,
    /// Encrypts its update under the published context
    Contributor,
    /// Sums the collected ciphertexts, decrypts and publishes the aggregate
    Decryptor,
}

impl FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyholder" => Ok(Role::Keyholder),
            "client" | "contributor" => Ok(Role::Contributor),
            "decryptor" => Ok(Role::Decryptor),
            other => Err(format!(
                "Unknown role '{other}'. Expected keyholder, client or decryptor."
            )),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Keyholder => f.write_str("keyholder"),
            Role::Contributor => f.write_str("contributor"),
            Role::Decryptor => f.write_str("decryptor"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleOptions {
    /// Label sent with the contributor's ciphertext
    pub client_id: Option<String>,
    pub aggregation: AggregationMode,
    pub insecure_passthrough: bool,
    /// Parameters of the context the keyholder creates
    pub bfv_preset: BfvPreset,
}

impl Default for RoleOptions {
    fn default() -> Self {
        Self {
            client_id: None,
            aggregation: AggregationMode::default(),
            insecure_passthrough: false,
            bfv_preset: DEFAULT_BFV_PRESET,
        }
    }
}

/// Everything a role talks to
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub api: &'a dyn AggregatorApi,
    pub summary: &'a dyn SummarySource,
    pub secrets: &'a dyn SecretStore,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoleOutcome {
    ContextPublished {
        context_id: ContextId,
        scheme: SchemeKind,
    },
    Contributed {
        value: f64,
        stored: usize,
        secure: bool,
    },
    Decrypted {
        aggregate: f64,
        contributions: u32,
        mode: AggregationMode,
        secure: bool,
    },
}

impl fmt::Display for RoleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleOutcome::ContextPublished { context_id, scheme } => write!(
                f,
                "Published {scheme} context {}",
                context_id.short()
            ),
            RoleOutcome::Contributed {
                value,
                stored,
                secure,
            } => {
                write!(f, "Uploaded update {value}. The aggregator holds {stored} ciphertext(s).")?;
                if !secure {
                    f.write_str(" WARNING: the update was sent unencrypted.")?;
                }
                Ok(())
            }
            RoleOutcome::Decrypted {
                aggregate,
                contributions,
                mode,
                ..
            } => write!(
                f,
                "Published {mode} aggregate {aggregate} over {contributions} contribution(s)"
            ),
        }
    }
}

#[cfg(feature = "bfv")]
fn keyholder_scheme(preset: BfvPreset, insecure_passthrough: bool) -> SharedScheme {
    if insecure_passthrough {
        return probe_scheme(true);
    }
    info!("Using the BFV scheme with preset {}", preset.name());
    Arc::new(heagg_fhe::BfvScheme::new(preset))
}

#[cfg(not(feature = "bfv"))]
fn keyholder_scheme(_preset: BfvPreset, insecure_passthrough: bool) -> SharedScheme {
    probe_scheme(insecure_passthrough)
}

/// The scheme a contributor encrypts with. Falls back to plaintext passthrough when the
/// context's scheme is not compiled in.
fn contributor_scheme(context: &PublicContext, insecure_passthrough: bool) -> Result<SharedScheme> {
    if insecure_passthrough {
        return Ok(probe_scheme(true));
    }
    match scheme_for(context.scheme()) {
        Ok(scheme) => Ok(scheme),
        Err(FheError::Unavailable(kind)) => {
            warn!(
                "{kind} is not available in this build. Sending the update UNENCRYPTED via plaintext passthrough."
            );
            Ok(Arc::new(PassthroughScheme::new()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Create a context, keep its secret half and publish the public half
pub async fn run_keyholder(
    api: &dyn AggregatorApi,
    secrets: &dyn SecretStore,
    options: &RoleOptions,
) -> Result<RoleOutcome> {
    let scheme = keyholder_scheme(options.bfv_preset, options.insecure_passthrough);
    let (public, secret) = scheme.create_context()?;

    secrets.save(&secret.to_bytes()?)?;
    info!(
        "Secret context {} saved to {}",
        secret.id().short(),
        secrets.location().display()
    );

    api.put_context(&public.to_bytes()?).await?;
    info!("Uploaded public context {}", public.id().short());

    Ok(RoleOutcome::ContextPublished {
        context_id: public.id(),
        scheme: public.scheme(),
    })
}

/// Encrypt this participant's update and hand it to the aggregator
pub async fn run_contributor(
    api: &dyn AggregatorApi,
    summary: &dyn SummarySource,
    options: &RoleOptions,
) -> Result<RoleOutcome> {
    let context = PublicContext::from_bytes(&api.get_public_context().await?)?;
    info!(
        "Fetched {} context {}",
        context.scheme(),
        context.id().short()
    );
    let scheme = contributor_scheme(&context, options.insecure_passthrough)?;

    let records = summary.fetch().await?;
    let value = compute_update(&records, &mut rand::thread_rng());
    info!(records = records.len(), "Computed update {value}");

    let ciphertext = scheme.encrypt(&context, value)?;
    let stored = api
        .post_cipher(&ciphertext.to_bytes()?, options.client_id.as_deref())
        .await?;

    Ok(RoleOutcome::Contributed {
        value,
        stored,
        secure: scheme.is_secure(),
    })
}

/// Sum everything the aggregator collected, decrypt it and publish the result
pub async fn run_decryptor(
    api: &dyn AggregatorApi,
    secrets: &dyn SecretStore,
    options: &RoleOptions,
) -> Result<RoleOutcome> {
    let secret = SecretContext::from_bytes(&secrets.load()?)?;

    let collected = api.get_agg_cipher().await?;
    if let Some(bytes) = &collected.context {
        let remote = PublicContext::from_bytes(bytes)?;
        if remote.id() != secret.id() {
            warn!(
                "The aggregator holds context {} but the local secret belongs to {}",
                remote.id().short(),
                secret.id().short()
            );
            return Err(FheError::ParameterMismatch.into());
        }
    }

    let ciphertexts = collected
        .ciphertexts
        .iter()
        .map(|bytes| Ciphertext::from_bytes(bytes))
        .collect::<heagg_fhe::Result<Vec<_>>>()?;
    let first = ciphertexts.first().ok_or(FheError::EmptyInput)?;
    let scheme = scheme_for(first.scheme())?;
    if !scheme.is_secure() {
        warn!("The collected ciphertexts are NOT encrypted");
    }

    let sum = scheme.homomorphic_sum(&ciphertexts)?;
    let total = scheme.decrypt(&secret, &sum)?;
    let contributions = sum.contributions();
    let aggregate = options.aggregation.apply(total, contributions);
    info!(
        "Decrypted sum {total} over {contributions} contribution(s), {} = {aggregate}",
        options.aggregation
    );

    api.post_plain_aggregate(aggregate, Some(contributions))
        .await?;

    Ok(RoleOutcome::Decrypted {
        aggregate,
        contributions,
        mode: options.aggregation,
        secure: scheme.is_secure(),
    })
}

/// The published aggregate
pub async fn fetch_result(api: &dyn AggregatorApi) -> Result<PlaintextAggregate> {
    api.get_plain_aggregate().await
}

pub async fn run_role(
    role: Role,
    collaborators: Collaborators<'_>,
    options: &RoleOptions,
) -> Result<RoleOutcome> {
    info!("Running the {role} role");
    match role {
        Role::Keyholder => run_keyholder(collaborators.api, collaborators.secrets, options).await,
        Role::Contributor => {
            run_contributor(collaborators.api, collaborators.summary, options).await
        }
        Role::Decryptor => run_decryptor(collaborators.api, collaborators.secrets, options).await,
    }
}
