//! Command-line shell around `hc-profile-core`.
//!
//! The CLI plays the part of the login browser: it prints the authorization
//! URL, then feeds every redirect URL it is given (one per stdin line, or
//! `--redirect-url`) to the [`NavigationHook`]. All protocol logic lives in the
//! core crate.
use crate::load_config::load_config;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use hc_profile_core::auth::intercept::{self, NavigationDecision, NavigationHook};
use hc_profile_core::auth::{AuthSession, Region, REDIRECT_URI};
use hc_profile_core::client::HomeConnectClient;
use hc_profile_core::emit::OutputTarget;
use hc_profile_core::pipeline;
use std::io::BufRead;
use std::path::PathBuf;

/// Download Home Connect appliance profiles for local control.
#[derive(Parser)]
#[clap(
    name = "hc-profile",
    version,
    about = "Log in to Home Connect and download appliance profiles for local control"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and write profiles for every appliance on the account
    Fetch {
        /// Account region: EU, NA, CN or RU
        #[clap(long, default_value = "EU")]
        region: String,
        /// Output format: homeconnectdirect, homeconnect-local-hass or hcpy
        #[clap(long, default_value = "homeconnectdirect")]
        target: String,
        /// Optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Directory for written files (overrides config and environment)
        #[clap(long)]
        output_dir: Option<PathBuf>,
        /// Redirect URL captured after login; read from stdin when absent
        #[clap(long)]
        redirect_url: Option<String>,
    },
    /// Print the supported regions and targets
    List,
}

/// Async CLI entrypoint for main() and integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::List => {
            println!("Regions:");
            for region in Region::ALL {
                println!("  {region}");
            }
            println!("Targets:");
            for target in OutputTarget::ALL {
                println!("  {target}");
            }
            Ok(())
        }
        Commands::Fetch {
            region,
            target,
            config,
            output_dir,
            redirect_url,
        } => {
            let session = AuthSession::begin(&region, &target)?;
            let config = load_config(config.as_deref(), output_dir)?;
            tracing::info!(command = "fetch", region = %session.region(), target = %session.target(), "Starting login");

            println!("Open this URL in a browser and log in:");
            println!("{}", session.authorization_url()?);
            println!("Then paste the URL the browser was sent to (it starts with {REDIRECT_URI}):");

            let (hook, interceptor) = intercept::channel();
            match redirect_url {
                Some(url) => {
                    if hook.on_before_request(&url) == NavigationDecision::Allow {
                        bail!("--redirect-url is not a login redirect: {url}");
                    }
                }
                None => spawn_stdin_reader(hook),
            }

            let code = interceptor.wait_for_code(config.login_timeout()).await?;
            let client = HomeConnectClient::new(config.http_timeout())?;
            match pipeline::run(&client, session, &code, &config).await {
                Ok(report) => {
                    tracing::info!(command = "fetch", appliances = report.appliances, "Fetch complete");
                    println!(
                        "Wrote {} file(s) for {} appliance(s):",
                        report.artifacts.len(),
                        report.appliances
                    );
                    for path in &report.artifacts {
                        println!("{}", path.display());
                    }
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "fetch", error = %e, "Fetch failed");
                    Err(e.into())
                }
            }
        }
    }
}

/// Report stdin lines as navigations until one is cancelled. Blocking reads
/// stay off the async runtime; dropping the hook at EOF closes the channel.
fn spawn_stdin_reader(hook: NavigationHook) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            if hook.on_before_request(&line) == NavigationDecision::Cancel {
                break;
            }
            eprintln!("Not a login redirect, still waiting: {}", line.trim());
        }
    });
}
