//! Query shaping client for the radio-browser directory
//!
//! Every public operation builds a fixed parameter set, delegates to the
//! [`Dispatcher`] and reshapes the answer (sorting, de-duplication,
//! truncation). The client holds no per-request state and is cheap to share
//! behind an `Arc`.
//!
//! # Example
//!
//! ```no_run
//! use grbrowser::RadioBrowserClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RadioBrowserClient::new()?;
//!
//!     let stations = client.by_country("fr", 10).await?;
//!     for station in &stations {
//!         println!("{} ({} clicks)", station.name().unwrap_or("?"), station.clickcount());
//!     }
//!
//!     Ok(())
//! }
//! ```

use crate::dispatcher::{Dispatcher, DEFAULT_ATTEMPT_TIMEOUT_SECS};
use crate::error::{Error, Result};
use crate::genres::{curated_genres, genre_tags, CHRISTIAN_TAGS};
use crate::models::{ClickResponse, Country, Genre, Language, Station, Tag};
use crate::resolver::{
    DnsMirrorResolver, MirrorResolver, StaticMirrorResolver, DEFAULT_DISCOVERY_HOST,
    DEFAULT_DNS_TIMEOUT_SECS, KNOWN_MIRRORS,
};
use crate::transport::{QueryParams, ReqwestTransport, Transport};
use futures::future::join_all;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default User-Agent sent to the mirrors
pub const DEFAULT_USER_AGENT: &str = concat!("GlobalRadio/", env!("CARGO_PKG_VERSION"));

/// Default per-attempt timeout for upstream requests (10 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = DEFAULT_ATTEMPT_TIMEOUT_SECS;

/// Stations requested per tag by the curated-category fan-out
pub const FANOUT_PER_TAG_LIMIT: usize = 50;

pub const DEFAULT_POPULAR_LIMIT: usize = 50;
pub const DEFAULT_COUNTRY_LIMIT: usize = 100;
pub const DEFAULT_TAG_LIMIT: usize = 100;
pub const DEFAULT_CHRISTIAN_LIMIT: usize = 100;
pub const DEFAULT_SEARCH_LIMIT: usize = 50;
pub const DEFAULT_GENRE_LIMIT: usize = 50;
pub const DEFAULT_TAGS_LIMIT: usize = 100;

const STATIONS_SEARCH: &str = "stations/search";

/// Everything but unreserved characters is escaped, `/` included
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Parameter set for `stations/search`
///
/// `limit`, `order=clickcount`, `reverse=true` and `hidebroken=true` are
/// always sent; filters only when set and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationQuery {
    pub limit: usize,
    pub countrycode: Option<String>,
    pub tag: Option<String>,
    pub name: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
}

impl StationQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    pub fn countrycode(mut self, code: impl Into<String>) -> Self {
        self.countrycode = Some(code.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Applies the free-text filters of a search
    pub fn filters(mut self, filters: SearchFilters) -> Self {
        self.name = filters.name;
        self.country = filters.country;
        self.language = filters.language;
        self.tag = filters.tag;
        self
    }

    /// Query parameters in a stable order
    pub fn to_params(&self) -> QueryParams {
        let mut params = vec![
            ("limit".to_string(), self.limit.to_string()),
            ("order".to_string(), "clickcount".to_string()),
            ("reverse".to_string(), "true".to_string()),
            ("hidebroken".to_string(), "true".to_string()),
        ];

        let optional = [
            ("countrycode", &self.countrycode),
            ("tag", &self.tag),
            ("name", &self.name),
            ("country", &self.country),
            ("language", &self.language),
        ];
        for (key, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                params.push((key.to_string(), value.to_string()));
            }
        }

        params
    }
}

/// Optional filters of a free-text station search
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchFilters {
    pub name: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub tag: Option<String>,
}

/// Merges fan-out batches into one ranked list
///
/// Batches are concatenated in order, the first occurrence of each
/// `stationuuid` wins, the result is stable-sorted by `clickcount`
/// descending and truncated to `limit`. Records without a string
/// `stationuuid` cannot be matched and are all kept.
pub fn merge_stations<I>(batches: I, limit: usize) -> Vec<Station>
where
    I: IntoIterator<Item = Vec<Station>>,
{
    let mut seen = HashSet::new();
    let mut merged: Vec<Station> = batches
        .into_iter()
        .flatten()
        .filter(|s| match s.uuid() {
            Some(uuid) => seen.insert(uuid.to_string()),
            None => true,
        })
        .collect();

    merged.sort_by_key(|s| Reverse(s.clickcount()));
    merged.truncate(limit);
    merged
}

/// Radio-browser client with mirror failover
#[derive(Debug, Clone)]
pub struct RadioBrowserClient {
    dispatcher: Dispatcher,
}

impl RadioBrowserClient {
    /// Create a new client with default settings (DNS discovery, fallback mirrors)
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Wraps an existing dispatcher
    pub fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Raw failover call: `GET <mirror>/json/<endpoint>`
    pub async fn dispatch(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<serde_json::Value> {
        self.dispatcher.dispatch(endpoint, params).await
    }

    // ========================================================================
    // Station lists
    // ========================================================================

    /// Runs a `stations/search` query, truncated to its limit
    pub async fn search_stations(&self, query: &StationQuery) -> Result<Vec<Station>> {
        let mut stations: Vec<Station> = self
            .dispatcher
            .dispatch_as(STATIONS_SEARCH, &query.to_params())
            .await?;
        stations.truncate(query.limit);
        Ok(stations)
    }

    /// Most clicked stations
    pub async fn popular(&self, limit: usize) -> Result<Vec<Station>> {
        self.search_stations(&StationQuery::new(limit)).await
    }

    /// Stations of one country, the ISO code is upper-cased
    pub async fn by_country(&self, country_code: &str, limit: usize) -> Result<Vec<Station>> {
        self.search_stations(&StationQuery::new(limit).countrycode(country_code.to_uppercase()))
            .await
    }

    /// Stations carrying a tag, the tag is lower-cased
    pub async fn by_tag(&self, tag: &str, limit: usize) -> Result<Vec<Station>> {
        self.search_stations(&StationQuery::new(limit).tag(tag.to_lowercase()))
            .await
    }

    /// Free-text search, every filter is optional
    pub async fn search(&self, filters: SearchFilters, limit: usize) -> Result<Vec<Station>> {
        self.search_stations(&StationQuery::new(limit).filters(filters))
            .await
    }

    /// Stations of a curated genre (unknown slugs are used as the tag)
    pub async fn by_genre(&self, genre: &str, limit: usize) -> Result<Vec<Station>> {
        let tag = genre_tags(genre);
        debug!(genre = %genre, tag = %tag, "Genre resolved");
        self.search_stations(&StationQuery::new(limit).tag(tag))
            .await
    }

    /// Christian curated category
    ///
    /// One request per tag of [`CHRISTIAN_TAGS`], issued concurrently. A tag
    /// that fails contributes nothing; this never returns an error.
    pub async fn christian(&self, limit: usize) -> Vec<Station> {
        self.curated(CHRISTIAN_TAGS, limit).await
    }

    /// Best-effort fan-out over `tags`, merged with [`merge_stations`]
    pub async fn curated(&self, tags: &[&str], limit: usize) -> Vec<Station> {
        let requests = tags.iter().map(|tag| async move {
            let query = StationQuery::new(FANOUT_PER_TAG_LIMIT).tag(*tag);
            match self.search_stations(&query).await {
                Ok(stations) => Some(stations),
                Err(e) => {
                    warn!(tag = %tag, error = %e, "Curated tag request failed, skipping");
                    None
                }
            }
        });

        let batches = join_all(requests).await.into_iter().flatten();
        merge_stations(batches, limit)
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Countries sorted by station count, descending
    pub async fn countries(&self) -> Result<Vec<Country>> {
        let mut countries: Vec<Country> = self.dispatcher.dispatch_as("countries", &[]).await?;
        countries.sort_by_key(|c| Reverse(c.stationcount()));
        Ok(countries)
    }

    /// Languages sorted by station count, descending
    pub async fn languages(&self) -> Result<Vec<Language>> {
        let mut languages: Vec<Language> = self.dispatcher.dispatch_as("languages", &[]).await?;
        languages.sort_by_key(|l| Reverse(l.stationcount()));
        Ok(languages)
    }

    /// Tags sorted by station count, descending, then truncated
    pub async fn tags(&self, limit: usize) -> Result<Vec<Tag>> {
        let mut tags: Vec<Tag> = self.dispatcher.dispatch_as("tags", &[]).await?;
        tags.sort_by_key(|t| Reverse(t.stationcount()));
        tags.truncate(limit);
        Ok(tags)
    }

    /// Static curated genre list, no upstream call
    pub fn genres(&self) -> Vec<Genre> {
        curated_genres()
    }

    // ========================================================================
    // Single station
    // ========================================================================

    /// Station details by UUID
    pub async fn station(&self, id: &str) -> Result<Station> {
        let params = vec![("uuid".to_string(), id.to_string())];
        let stations: Vec<Station> = self
            .dispatcher
            .dispatch_as("stations/byuuid", &params)
            .await?;

        stations
            .into_iter()
            .next()
            .ok_or_else(|| Error::StationNotFound(id.to_string()))
    }

    /// Registers a click; failures are reported in the body, never raised
    ///
    /// The id is sent as a single percent-encoded path segment.
    pub async fn click(&self, id: &str) -> ClickResponse {
        if id.is_empty() || id.chars().all(|c| c == '.') {
            warn!(station = %id, "Click refused, not a station id");
            return ClickResponse::failed(format!("invalid station id: {:?}", id));
        }

        let endpoint = format!("url/{}", utf8_percent_encode(id, PATH_SEGMENT));
        match self.dispatcher.dispatch(&endpoint, &[]).await {
            Ok(_) => ClickResponse::ok(),
            Err(e) => {
                warn!(station = %id, error = %e, "Click registration failed");
                ClickResponse::failed(e.to_string())
            }
        }
    }
}

/// Builder for configuring a RadioBrowserClient
pub struct ClientBuilder {
    resolver: Option<Arc<dyn MirrorResolver>>,
    mirrors: Option<Vec<String>>,
    transport: Option<Arc<dyn Transport>>,
    timeout: Duration,
    user_agent: String,
    discovery_host: String,
    fallback_mirrors: Vec<String>,
    shuffle: bool,
    dns_timeout: Duration,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("mirrors", &self.mirrors)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("discovery_host", &self.discovery_host)
            .field("fallback_mirrors", &self.fallback_mirrors)
            .field("shuffle", &self.shuffle)
            .field("dns_timeout", &self.dns_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            resolver: None,
            mirrors: None,
            transport: None,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            discovery_host: DEFAULT_DISCOVERY_HOST.to_string(),
            fallback_mirrors: KNOWN_MIRRORS.iter().map(|m| m.to_string()).collect(),
            shuffle: true,
            dns_timeout: Duration::from_secs(DEFAULT_DNS_TIMEOUT_SECS),
        }
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed mirror list, tried in the given order (no DNS discovery)
    pub fn mirrors<I, S>(mut self, mirrors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mirrors = Some(mirrors.into_iter().map(Into::into).collect());
        self
    }

    /// Use a custom resolver (takes precedence over every mirror setting)
    pub fn resolver(mut self, resolver: Arc<dyn MirrorResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Use a custom transport (takes precedence over `user_agent`)
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the DNS name used for discovery (empty disables discovery)
    pub fn discovery_host(mut self, host: impl Into<String>) -> Self {
        self.discovery_host = host.into();
        self
    }

    /// Set the mirrors used when discovery yields nothing
    pub fn fallback_mirrors<I, S>(mut self, mirrors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_mirrors = mirrors.into_iter().map(Into::into).collect();
        self
    }

    /// Randomize the discovered mirror order
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Bound the DNS discovery step
    pub fn dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<RadioBrowserClient> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.user_agent)?),
        };

        let resolver: Arc<dyn MirrorResolver> = match (self.resolver, self.mirrors) {
            (Some(resolver), _) => resolver,
            (None, Some(mirrors)) => Arc::new(StaticMirrorResolver::new(mirrors)),
            (None, None) => Arc::new(
                DnsMirrorResolver::new(self.discovery_host)
                    .with_fallback(self.fallback_mirrors)
                    .with_shuffle(self.shuffle)
                    .with_dns_timeout(self.dns_timeout),
            ),
        };

        let dispatcher = Dispatcher::new(resolver, transport).with_timeout(self.timeout);
        Ok(RadioBrowserClient { dispatcher })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{TransportError, UpstreamResponse};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    fn station(uuid: &str, clicks: i64) -> Station {
        Station::from(json!({
            "stationuuid": uuid,
            "name": uuid.to_uppercase(),
            "clickcount": clicks
        }))
    }

    /// Answers every tag with a canned body, fails on "gospel"
    #[derive(Default)]
    struct TagTransport {
        urls: Mutex<Vec<String>>,
        queries: Mutex<Vec<QueryParams>>,
    }

    #[async_trait]
    impl Transport for TagTransport {
        async fn get(
            &self,
            url: &str,
            query: &[(String, String)],
            _timeout: Duration,
        ) -> std::result::Result<UpstreamResponse, TransportError> {
            self.urls.lock().unwrap().push(url.to_string());
            self.queries.lock().unwrap().push(query.to_vec());
            let tag = query
                .iter()
                .find(|(k, _)| k == "tag")
                .map(|(_, v)| v.as_str())
                .unwrap_or_default();

            let body = match (url.ends_with("/json/stations/search"), tag) {
                (true, "gospel") => return Ok(UpstreamResponse::new(500, "")),
                (true, "christian") => json!([
                    {"stationuuid": "a", "clickcount": 10},
                    {"stationuuid": "b", "clickcount": 30}
                ]),
                (true, "religious") => json!([
                    {"stationuuid": "b", "clickcount": 99, "name": "dup"},
                    {"stationuuid": "c", "clickcount": 20}
                ]),
                (true, _) => json!([]),
                (false, _) => json!({"ok": true}),
            };
            Ok(UpstreamResponse::new(200, body.to_string()))
        }
    }

    fn client_with(transport: Arc<dyn Transport>) -> RadioBrowserClient {
        RadioBrowserClient::builder()
            .mirrors(["https://mirror.test"])
            .transport(transport)
            .build()
            .unwrap()
    }

    #[test]
    fn test_station_query_params() {
        let params = StationQuery::new(25).countrycode("DE").to_params();
        assert_eq!(
            params,
            vec![
                ("limit".to_string(), "25".to_string()),
                ("order".to_string(), "clickcount".to_string()),
                ("reverse".to_string(), "true".to_string()),
                ("hidebroken".to_string(), "true".to_string()),
                ("countrycode".to_string(), "DE".to_string()),
            ]
        );
    }

    #[test]
    fn test_station_query_skips_empty_filters() {
        let filters = SearchFilters {
            name: Some("jazz".into()),
            country: Some(String::new()),
            language: None,
            tag: Some("swing".into()),
        };
        let params = StationQuery::new(5).filters(filters).to_params();
        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["limit", "order", "reverse", "hidebroken", "tag", "name"]
        );
    }

    #[test]
    fn test_merge_dedupes_first_occurrence_and_sorts() {
        let merged = merge_stations(
            vec![
                vec![station("a", 5), station("b", 50)],
                vec![station("b", 500), station("c", 50), station("d", 1)],
            ],
            3,
        );
        let ids: Vec<&str> = merged.iter().filter_map(Station::uuid).collect();
        // b keeps its first clickcount (50); ties keep arrival order
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(merged[0].clickcount(), 50);
    }

    #[test]
    fn test_merge_keeps_records_it_cannot_match() {
        let merged = merge_stations(
            vec![
                vec![
                    Station::from(json!({"name": "no id", "clickcount": "12"})),
                    Station::from(json!({"stationuuid": "a", "clickcount": 3.5})),
                ],
                vec![
                    Station::from(json!({"name": "no id either", "clickcount": null})),
                    Station::from(json!({"stationuuid": "a", "clickcount": 99})),
                ],
            ],
            10,
        );

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].name(), Some("no id"));
        assert_eq!(merged[1].uuid(), Some("a"));
        assert_eq!(merged[1].get("clickcount"), Some(&json!(3.5)));
        assert_eq!(merged[2].get("clickcount"), Some(&Value::Null));
    }

    #[test]
    fn test_default_limits() {
        assert_eq!(DEFAULT_POPULAR_LIMIT, 50);
        assert_eq!(DEFAULT_COUNTRY_LIMIT, 100);
        assert_eq!(DEFAULT_CHRISTIAN_LIMIT, 100);
        assert_eq!(DEFAULT_SEARCH_LIMIT, 50);
        assert_eq!(DEFAULT_GENRE_LIMIT, 50);
        assert!(DEFAULT_USER_AGENT.starts_with("GlobalRadio/"));
    }

    #[tokio::test]
    async fn test_christian_fan_out_is_best_effort() {
        let transport = Arc::new(TagTransport::default());
        let client = client_with(transport.clone());

        let stations = client.christian(10).await;
        let ids: Vec<&str> = stations.iter().filter_map(Station::uuid).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(stations[0].clickcount(), 30);

        let queries = transport.queries.lock().unwrap();
        assert_eq!(queries.len(), CHRISTIAN_TAGS.len());
        assert!(queries
            .iter()
            .all(|q| q.contains(&("limit".to_string(), FANOUT_PER_TAG_LIMIT.to_string()))));
    }

    #[tokio::test]
    async fn test_case_normalization() {
        let transport = Arc::new(TagTransport::default());
        let client = client_with(transport.clone());

        client.by_country("us", 5).await.unwrap();
        client.by_tag("JaZz", 5).await.unwrap();
        client.by_genre("Hip-Hop", 5).await.unwrap();

        let queries = transport.queries.lock().unwrap();
        assert!(queries[0].contains(&("countrycode".to_string(), "US".to_string())));
        assert!(queries[1].contains(&("tag".to_string(), "jazz".to_string())));
        assert!(queries[2].contains(&("tag".to_string(), "hip hop,hiphop,rap".to_string())));
    }

    #[tokio::test]
    async fn test_click_never_fails() {
        let client = RadioBrowserClient::builder()
            .mirrors(Vec::<String>::new())
            .transport(Arc::new(TagTransport::default()))
            .build()
            .unwrap();

        let response = client.click("abc").await;
        assert!(!response.success);
        assert!(response.error.is_some());

        let client = client_with(Arc::new(TagTransport::default()));
        assert_eq!(client.click("abc").await, ClickResponse::ok());
    }

    #[tokio::test]
    async fn test_click_id_is_one_path_segment() {
        let transport = Arc::new(TagTransport::default());
        let client = client_with(transport.clone());

        assert!(client.click("a/../../countries").await.success);
        assert!(client.click("96202f73-0601-11e8-ae97-52543be04c81").await.success);
        assert!(!client.click("..").await.success);

        let urls = transport.urls.lock().unwrap();
        assert_eq!(
            *urls,
            vec![
                "https://mirror.test/json/url/a%2F..%2F..%2Fcountries",
                "https://mirror.test/json/url/96202f73-0601-11e8-ae97-52543be04c81",
            ]
        );
    }
}
