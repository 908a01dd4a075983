//! Request dispatcher: one logical upstream query, one pass over the mirrors
//!
//! [`try_mirrors`] is the failover loop itself. It only depends on the mirror
//! slice and the injected [`Transport`], so it can be driven by scripted
//! doubles. [`Dispatcher`] binds it to a [`MirrorResolver`].

use crate::error::{Error, FailureCause, MirrorFailure, Result};
use crate::resolver::MirrorResolver;
use crate::transport::{Transport, TransportError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default per-attempt timeout (10 seconds)
pub const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 10;

/// Tries every mirror in order until one answers 200 with a JSON body
///
/// Issues `GET <mirror>/json/<endpoint>` with `params`. The first success is
/// returned as is; mirrors after it are never contacted. When the slice is
/// exhausted the error carries every per-mirror cause, in attempt order.
pub async fn try_mirrors(
    transport: &dyn Transport,
    mirrors: &[String],
    endpoint: &str,
    params: &[(String, String)],
    timeout: Duration,
) -> Result<Value> {
    let endpoint = endpoint.trim_start_matches('/');
    let mut failures = Vec::new();

    for mirror in mirrors {
        let url = format!("{}/json/{}", mirror, endpoint);

        let cause = match tokio::time::timeout(timeout, transport.get(&url, params, timeout)).await
        {
            Err(_) | Ok(Err(TransportError::Timeout)) => FailureCause::Timeout,
            Ok(Err(e)) => FailureCause::Transport(e.to_string()),
            Ok(Ok(response)) if response.status != 200 => FailureCause::Status(response.status),
            Ok(Ok(response)) => match serde_json::from_slice::<Value>(&response.body) {
                Ok(value) => {
                    debug!(mirror = %mirror, endpoint = %endpoint, "Upstream request succeeded");
                    return Ok(value);
                }
                Err(e) => FailureCause::Malformed(e.to_string()),
            },
        };

        warn!(mirror = %mirror, endpoint = %endpoint, cause = %cause, "Mirror attempt failed");
        failures.push(MirrorFailure {
            mirror: mirror.clone(),
            cause,
        });
    }

    Err(Error::Unavailable { failures })
}

/// Failover dispatcher bound to a resolver and a transport
#[derive(Clone)]
pub struct Dispatcher {
    resolver: Arc<dyn MirrorResolver>,
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(resolver: Arc<dyn MirrorResolver>, transport: Arc<dyn Transport>) -> Self {
        Self {
            resolver,
            transport,
            timeout: Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS),
        }
    }

    /// Sets the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn resolver(&self) -> &Arc<dyn MirrorResolver> {
        &self.resolver
    }

    /// Resolves the mirrors once, then runs a single failover pass
    pub async fn dispatch(&self, endpoint: &str, params: &[(String, String)]) -> Result<Value> {
        let mirrors = self.resolver.resolve().await?;
        try_mirrors(
            self.transport.as_ref(),
            &mirrors,
            endpoint,
            params,
            self.timeout,
        )
        .await
    }

    /// Same as [`dispatch`](Self::dispatch), decoded into `T`
    ///
    /// A 200 body that does not match `T` is a shaping error, not a mirror
    /// failure: the mirror answered and is not retried.
    pub async fn dispatch_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<T> {
        let value = self.dispatch(endpoint, params).await?;
        Ok(serde_json::from_value(value)?)
    }
}
