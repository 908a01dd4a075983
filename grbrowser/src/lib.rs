//! Failover client and REST facade for the radio-browser directory
//!
//! The radio-browser directory is served by a rotating set of independently
//! operated mirrors. This crate discovers them, tries them in turn for every
//! logical request and reshapes the answers for a simple REST surface.
//!
//! # Features
//!
//! - **Mirror discovery**: DNS round-robin lookup with reverse resolution,
//!   hardcoded fallback mirrors, shuffled and cached for the process lifetime
//! - **Failover**: one pass over the mirrors per request, first 200 wins,
//!   bounded per-attempt timeout
//! - **Query shaping**: popular, by country, by tag, free-text search,
//!   curated genres and the Christian category (concurrent fan-out, merge)
//! - **REST API**: axum router with OpenAPI documentation (feature `server`)
//! - **Configuration Extension**: `upstream.*` settings in grconfig
//!   (feature `config`)
//!
//! # Example
//!
//! ```no_run
//! use grbrowser::RadioBrowserClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RadioBrowserClient::builder()
//!         .mirrors(["https://de1.api.radio-browser.info"])
//!         .build()?;
//!
//!     let stations = client.by_genre("jazz", 5).await?;
//!     println!("Found {} stations", stations.len());
//!
//!     let countries = client.countries().await?;
//!     println!("Top country: {:?}", countries[0].name());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! [`MirrorResolver`], [`HostLookup`] and [`Transport`] are the seams. Tests
//! inject a [`StaticMirrorResolver`] or scripted DNS answers, and either a
//! scripted transport or local HTTP mirrors.

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod genres;
pub mod models;
pub mod resolver;
pub mod transport;

#[cfg(feature = "config")]
pub mod config_ext;

#[cfg(feature = "server")]
pub mod api_rest;

#[cfg(feature = "server")]
pub mod openapi;

#[cfg(feature = "server")]
pub mod server_ext;

#[cfg(feature = "server")]
mod server_impl;

pub use client::{merge_stations, ClientBuilder, RadioBrowserClient, SearchFilters, StationQuery};
pub use dispatcher::{try_mirrors, Dispatcher};
pub use error::{Error, FailureCause, MirrorFailure, Result};
pub use genres::{curated_genres, genre_tags};
pub use models::{
    ClickResponse, CountriesResponse, Country, Genre, GenresResponse, Language,
    LanguagesResponse, MessageResponse, Station, StationResponse, StationsResponse, Tag,
    TagsResponse,
};
pub use resolver::{
    DnsMirrorResolver, HickoryHostLookup, HostLookup, MirrorList, MirrorResolver,
    StaticMirrorResolver,
};
pub use transport::{ReqwestTransport, Transport, TransportError, UpstreamResponse};

#[cfg(feature = "config")]
pub use config_ext::RadioBrowserConfigExt;

#[cfg(feature = "server")]
pub use api_rest::{create_router, RadioBrowserState};

#[cfg(feature = "server")]
pub use server_ext::RadioBrowserExt;
