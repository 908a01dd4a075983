//! Upstream mirror discovery
//!
//! The radio-browser directory is served by a rotating set of independently
//! operated mirrors. A [`MirrorResolver`] hands the dispatcher an ordered,
//! non-empty [`MirrorList`] to try.
//!
//! [`DnsMirrorResolver`] resolves the round-robin name
//! `all.api.radio-browser.info`, maps every address back to its hostname
//! (the mirrors' TLS certificates are issued for names, not addresses),
//! shuffles the result and keeps it for the lifetime of the process. When
//! discovery yields nothing, a hardcoded list of known mirrors is used.
//!
//! The DNS queries themselves go through a [`HostLookup`]. Production uses
//! [`HickoryHostLookup`]; tests script the answers.
//!
//! The cached list is only ever replaced as a whole: readers clone the
//! `Arc` snapshot and never observe a partially built list. Concurrent first
//! callers may both run discovery; the last one to finish wins, and both
//! results are valid.

use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::future::join_all;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::net::IpAddr;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Round-robin DNS name listing every healthy mirror
pub const DEFAULT_DISCOVERY_HOST: &str = "all.api.radio-browser.info";

/// Known-good mirrors used when discovery fails
pub const KNOWN_MIRRORS: &[&str] = &[
    "https://de1.api.radio-browser.info",
    "https://nl1.api.radio-browser.info",
    "https://at1.api.radio-browser.info",
];

/// Default bound for the whole DNS discovery step (5 seconds)
pub const DEFAULT_DNS_TIMEOUT_SECS: u64 = 5;

/// Immutable, cheaply clonable snapshot of mirror base URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorList(Arc<[String]>);

impl MirrorList {
    /// Normalizes entries (see [`normalize_mirror`]) and drops the invalid ones
    pub fn new<I, S>(mirrors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let list: Vec<String> = mirrors
            .into_iter()
            .filter_map(|m| normalize_mirror(m.as_ref()))
            .filter(|m| seen.insert(m.clone()))
            .collect();
        Self(list.into())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Deref for MirrorList {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}

/// Trims, strips trailing slashes and defaults the scheme to `https://`
///
/// Returns `None` for blank input.
pub fn normalize_mirror(mirror: &str) -> Option<String> {
    let trimmed = mirror.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{}", trimmed))
    }
}

#[async_trait]
pub trait MirrorResolver: Send + Sync {
    /// Returns a non-empty, ordered list of mirror base URLs
    async fn resolve(&self) -> Result<MirrorList>;
}

/// Resolver returning a fixed list, in the given order
#[derive(Debug, Clone)]
pub struct StaticMirrorResolver {
    mirrors: MirrorList,
}

impl StaticMirrorResolver {
    pub fn new<I, S>(mirrors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            mirrors: MirrorList::new(mirrors),
        }
    }
}

#[async_trait]
impl MirrorResolver for StaticMirrorResolver {
    async fn resolve(&self) -> Result<MirrorList> {
        if self.mirrors.is_empty() {
            return Err(Error::NoMirrors);
        }
        Ok(self.mirrors.clone())
    }
}

/// The two DNS queries mirror discovery needs
#[async_trait]
pub trait HostLookup: Send + Sync {
    /// Forward lookup, every address of `host`
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>>;

    /// Reverse lookup, the first PTR name of `address` if there is one
    async fn reverse_lookup(&self, address: IpAddr) -> Result<Option<String>>;
}

/// [`HostLookup`] backed by the system resolver configuration
#[derive(Clone)]
pub struct HickoryHostLookup {
    resolver: TokioAsyncResolver,
}

impl HickoryHostLookup {
    /// One attempt per query, each bounded by `timeout`
    pub fn new(timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
        }
    }
}

#[async_trait]
impl HostLookup for HickoryHostLookup {
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>> {
        let ips = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| Error::Dns(e.to_string()))?;
        Ok(ips.iter().collect())
    }

    async fn reverse_lookup(&self, address: IpAddr) -> Result<Option<String>> {
        let names = self
            .resolver
            .reverse_lookup(address)
            .await
            .map_err(|e| Error::Dns(e.to_string()))?;
        Ok(names.iter().next().map(|name| name.to_string()))
    }
}

/// DNS based resolver with hardcoded fallback, cached for the process lifetime
pub struct DnsMirrorResolver {
    discovery_host: String,
    fallback: Vec<String>,
    shuffle: bool,
    dns_timeout: Duration,
    lookup: Option<Arc<dyn HostLookup>>,
    cache: RwLock<Option<MirrorList>>,
}

impl std::fmt::Debug for DnsMirrorResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsMirrorResolver")
            .field("discovery_host", &self.discovery_host)
            .field("fallback", &self.fallback)
            .field("shuffle", &self.shuffle)
            .field("dns_timeout", &self.dns_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for DnsMirrorResolver {
    fn default() -> Self {
        Self::new(DEFAULT_DISCOVERY_HOST)
    }
}

impl DnsMirrorResolver {
    /// Resolver for `discovery_host`; an empty host disables DNS discovery
    pub fn new(discovery_host: impl Into<String>) -> Self {
        Self {
            discovery_host: discovery_host.into(),
            fallback: KNOWN_MIRRORS.iter().map(|m| m.to_string()).collect(),
            shuffle: true,
            dns_timeout: Duration::from_secs(DEFAULT_DNS_TIMEOUT_SECS),
            lookup: None,
            cache: RwLock::new(None),
        }
    }

    /// Replaces the fallback mirrors
    pub fn with_fallback<I, S>(mut self, mirrors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback = mirrors.into_iter().map(Into::into).collect();
        self
    }

    /// Enables or disables randomizing the mirror order
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Bounds the whole discovery step
    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    /// Uses `lookup` instead of a [`HickoryHostLookup`] built at discovery time
    pub fn with_lookup(mut self, lookup: Arc<dyn HostLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn discovery_host(&self) -> &str {
        &self.discovery_host
    }

    /// Current cached snapshot, if any
    pub async fn cached(&self) -> Option<MirrorList> {
        self.cache.read().await.clone()
    }

    /// Drops the cached snapshot so the next `resolve()` discovers again
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    async fn discover(&self) -> Result<MirrorList> {
        let mut source = "dns";
        let mut mirrors = if self.discovery_host.is_empty() {
            Vec::new()
        } else {
            let lookup: Arc<dyn HostLookup> = match &self.lookup {
                Some(lookup) => lookup.clone(),
                None => Arc::new(HickoryHostLookup::new(self.dns_timeout)),
            };
            match tokio::time::timeout(
                self.dns_timeout,
                lookup_mirror_hosts(lookup.as_ref(), &self.discovery_host),
            )
            .await
            {
                Ok(Ok(hosts)) => hosts,
                Ok(Err(e)) => {
                    warn!(host = %self.discovery_host, error = %e, "Mirror discovery failed");
                    Vec::new()
                }
                Err(_) => {
                    warn!(host = %self.discovery_host, "Mirror discovery timed out");
                    Vec::new()
                }
            }
        };

        if mirrors.is_empty() {
            source = "fallback";
            mirrors = self.fallback.clone();
        }

        let list = MirrorList::new(mirrors);
        if list.is_empty() {
            return Err(Error::NoMirrors);
        }

        let list = if self.shuffle {
            let mut shuffled = list.to_vec();
            shuffled.shuffle(&mut rand::rng());
            MirrorList::new(shuffled)
        } else {
            list
        };

        info!(count = list.len(), source, "Upstream mirrors resolved");
        debug!(mirrors = ?list.as_slice(), "Mirror order");
        Ok(list)
    }
}

#[async_trait]
impl MirrorResolver for DnsMirrorResolver {
    async fn resolve(&self) -> Result<MirrorList> {
        if let Some(list) = self.cache.read().await.clone() {
            return Ok(list);
        }

        // No lock is held during discovery: concurrent first callers may
        // resolve twice, and the last write replaces the whole list.
        let list = self.discover().await?;
        *self.cache.write().await = Some(list.clone());
        Ok(list)
    }
}

/// Resolves `host` to its addresses, then every address to its hostname
///
/// Duplicate addresses are queried once. Addresses without a PTR record are
/// skipped. The trailing dot of the names is removed.
async fn lookup_mirror_hosts(lookup: &dyn HostLookup, host: &str) -> Result<Vec<String>> {
    debug!(host = %host, "Performing mirror DNS lookup");

    let mut seen = HashSet::new();
    let addresses: Vec<IpAddr> = lookup
        .lookup_ip(host)
        .await?
        .into_iter()
        .filter(|ip| seen.insert(*ip))
        .collect();
    debug!(count = addresses.len(), host = %host, "DNS lookup returned addresses");

    let names = join_all(addresses.iter().map(|ip| lookup.reverse_lookup(*ip))).await;

    let mut hosts = Vec::new();
    for (ip, result) in addresses.iter().zip(names) {
        match result {
            Ok(Some(name)) => hosts.push(name.trim_end_matches('.').to_string()),
            Ok(None) => debug!(address = %ip, "No PTR record, skipping"),
            Err(e) => debug!(address = %ip, error = %e, "Reverse lookup failed, skipping"),
        }
    }

    Ok(hosts)
}
