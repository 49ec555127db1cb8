//! High-level pipeline: token exchange → appliance listing → per-appliance
//! asset fetch → artifact emission.
//!
//! # Responsibilities
//! - Fail-fast orchestration: the first failing appliance aborts the batch.
//!   Files written for earlier appliances are left in place.
//! - An account without appliances is a terminal [`ProfileError::NoAppliances`].
//! - Unparsable XML inside an archive only drops `description`/`features` for
//!   that appliance; it never fails the batch.
//!
//! # Concurrency
//! Appliances are processed through an order-preserving buffered stream with
//! at most [`Config::max_concurrent_fetches`] fetches in flight. Each appliance
//! owns its archive and output file, so nothing is shared between them.
//!
//! # Navigation
//! - Main entrypoint: [`run`]
//! - Output: [`PipelineReport`]

use std::path::PathBuf;

use chrono::Local;
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{error, info, warn};

use crate::auth::AuthSession;
use crate::config::Config;
use crate::contract::{ApplianceApi, ApplianceRecord};
use crate::emit::{self, DeviceConfig, OutputMode, OutputTarget};
use crate::error::ProfileError;
use crate::features;

/// Terminal success outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub target: OutputTarget,
    pub appliances: usize,
    /// Written files, in appliance order.
    pub artifacts: Vec<PathBuf>,
}

/// Run the whole pipeline for one authentication attempt.
///
/// The session is consumed: its PKCE verifier is used once for the token
/// exchange and dropped afterwards.
pub async fn run<A>(
    api: &A,
    session: AuthSession,
    code: &str,
    config: &Config,
) -> Result<PipelineReport, ProfileError>
where
    A: ApplianceApi,
{
    config.validate()?;
    info!(region = %session.region(), target = %session.target(), "[PIPELINE] Starting");

    let endpoints = session.endpoints().clone();
    let target = session.target();

    let access_token = api
        .exchange_token(&endpoints.token_url(), code, session.code_verifier())
        .await
        .inspect_err(|e| error!(error = %e, "[PIPELINE][ERROR] Token exchange failed"))?;
    drop(session);
    info!("[PIPELINE] Access token received");

    let appliances = api
        .list_appliances(&endpoints.account_details_url(), &access_token)
        .await
        .inspect_err(|e| error!(error = %e, "[PIPELINE][ERROR] Appliance listing failed"))?;
    if appliances.is_empty() {
        error!("[PIPELINE][ERROR] Account has no appliances");
        return Err(ProfileError::NoAppliances);
    }
    info!(count = appliances.len(), "[PIPELINE] Appliances listed");

    let fetch = ApplianceFetch {
        api,
        url_prefix: endpoints.asset_url_prefix(),
        access_token,
        config,
    };
    let artifacts = match target.mode() {
        OutputMode::ProfileArchive { prefix } => fetch.profile_archives(&appliances, prefix).await?,
        OutputMode::DeviceConfig { tool_name } => {
            vec![fetch.device_config(&appliances, tool_name).await?]
        }
    };

    info!(artifacts = artifacts.len(), "[PIPELINE] Complete");
    Ok(PipelineReport {
        target,
        appliances: appliances.len(),
        artifacts,
    })
}

struct ApplianceFetch<'a, A> {
    api: &'a A,
    url_prefix: String,
    access_token: String,
    config: &'a Config,
}

impl<'a, A: ApplianceApi> ApplianceFetch<'a, A> {
    async fn archive(
        &self,
        appliance: &ApplianceRecord,
    ) -> Result<crate::archive::ApplianceArchive, ProfileError> {
        self.api
            .fetch_appliance_zip(&self.url_prefix, &self.access_token, &appliance.identifier)
            .await
            .inspect_err(|e| {
                error!(appliance_id = %appliance.identifier, error = %e, "[PIPELINE][ERROR] Asset fetch failed")
            })
    }

    async fn profile_archives(
        &self,
        appliances: &[ApplianceRecord],
        prefix: &str,
    ) -> Result<Vec<PathBuf>, ProfileError> {
        stream::iter(appliances)
            .map(|appliance| async move {
                let archive = self.archive(appliance).await?;
                emit::write_profile_archive(
                    &self.config.output_dir,
                    prefix,
                    appliance,
                    archive,
                    Local::now(),
                )
                .await
            })
            .buffered(self.config.max_concurrent_fetches)
            .try_collect()
            .await
    }

    async fn device_config(
        &self,
        appliances: &[ApplianceRecord],
        tool_name: &str,
    ) -> Result<PathBuf, ProfileError> {
        let configs: Vec<DeviceConfig> = stream::iter(appliances)
            .map(|appliance| async move {
                let archive = self.archive(appliance).await?;
                let resolved = match features::resolve_archive(&archive) {
                    Ok(resolved) => resolved,
                    Err(e) => {
                        warn!(appliance_id = %appliance.identifier, error = %e, "Feature data unavailable");
                        None
                    }
                };
                Ok::<_, ProfileError>(DeviceConfig::new(appliance, resolved))
            })
            .buffered(self.config.max_concurrent_fetches)
            .try_collect()
            .await?;

        emit::write_device_configs(&self.config.output_dir, tool_name, &configs, Local::now()).await
    }
}
