//! Authorization code interception.
//!
//! The login page finishes by navigating to `hcauth://auth/prod?code=...`.
//! Whatever renders the login page (an embedded browser, or a user pasting URLs
//! into the CLI) reports each outbound navigation to a [`NavigationHook`]. The
//! hook cancels every navigation aimed at the redirect target and hands the
//! first code it sees to the [`AuthCodeInterceptor`] the orchestrator is
//! waiting on. Later redirects are cancelled and ignored.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ProfileError;

/// What the shell must do with a reported navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    /// Drop the request without dispatching it.
    Cancel,
}

/// Create a connected hook/interceptor pair for one authentication attempt.
pub fn channel() -> (NavigationHook, AuthCodeInterceptor) {
    let (tx, rx) = oneshot::channel();
    (
        NavigationHook {
            slot: Arc::new(Mutex::new(Some(tx))),
        },
        AuthCodeInterceptor { rx },
    )
}

/// Shell-side half. Cheap to clone; all clones share the same single-shot slot.
#[derive(Clone)]
pub struct NavigationHook {
    slot: Arc<Mutex<Option<oneshot::Sender<String>>>>,
}

impl NavigationHook {
    /// Inspect an outbound navigation before it is dispatched.
    pub fn on_before_request(&self, raw_url: &str) -> NavigationDecision {
        let url = match Url::parse(raw_url.trim()) {
            Ok(url) => url,
            Err(_) => return NavigationDecision::Allow,
        };
        if !is_redirect_target(&url) {
            return NavigationDecision::Allow;
        }

        let code = extract_code(&url);
        let sender = match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match sender {
            Some(tx) => {
                info!(has_code = !code.is_empty(), "Captured authorization redirect");
                if tx.send(code).is_err() {
                    debug!("Authorization redirect captured after the interceptor gave up");
                }
            }
            None => warn!("Ignoring repeated authorization redirect"),
        }
        NavigationDecision::Cancel
    }
}

/// Core-side half, awaited once by the orchestrator.
pub struct AuthCodeInterceptor {
    rx: oneshot::Receiver<String>,
}

impl AuthCodeInterceptor {
    /// Resolve with the `code` query parameter of the first redirect (empty
    /// when the parameter was absent).
    pub async fn wait_for_code(self, timeout: Duration) -> Result<String, ProfileError> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(code)) => Ok(code),
            Ok(Err(_)) => Err(ProfileError::Authentication(
                "Login was closed before an authorization code was received".to_string(),
            )),
            Err(_) => Err(ProfileError::Authentication(format!(
                "Timed out after {}s waiting for the login redirect",
                timeout.as_secs()
            ))),
        }
    }
}

/// Matches `*://*/auth/prod*`. For the custom `hcauth` scheme the `auth`
/// segment is parsed as the host, so both shapes are accepted.
pub fn is_redirect_target(url: &Url) -> bool {
    if url.path().starts_with("/auth/prod") {
        return true;
    }
    url.host_str() == Some("auth") && url.path().starts_with("/prod")
}

fn extract_code(url: &Url) -> String {
    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}
