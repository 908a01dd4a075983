//! Endpoints API REST de la façade radio-browser
//!
//! Ce module définit les handlers HTTP exposés aux clients. Chaque handler
//! délègue au [`RadioBrowserClient`] et enveloppe le résultat
//! (`{"stations": [...]}`, `{"countries": [...]}`...).
//!
//! Les erreurs sont rendues sous la forme `{"detail": "..."}` :
//!
//! - tous les miroirs en échec : 503
//! - station inconnue : 404
//! - le reste : 500
//!
//! `POST /api/station/{id}/click` ne renvoie jamais d'erreur HTTP.

use crate::client::{
    RadioBrowserClient, SearchFilters, DEFAULT_CHRISTIAN_LIMIT, DEFAULT_COUNTRY_LIMIT,
    DEFAULT_GENRE_LIMIT, DEFAULT_POPULAR_LIMIT, DEFAULT_SEARCH_LIMIT, DEFAULT_TAGS_LIMIT,
    DEFAULT_TAG_LIMIT,
};
use crate::error::Error;
use crate::models::{
    ClickResponse, CountriesResponse, GenresResponse, LanguagesResponse, MessageResponse,
    StationResponse, StationsResponse, TagsResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// État partagé des handlers
#[derive(Clone)]
pub struct RadioBrowserState {
    pub client: Arc<RadioBrowserClient>,
}

impl RadioBrowserState {
    pub fn new(client: Arc<RadioBrowserClient>) -> Self {
        Self { client }
    }
}

// ============ Gestion des erreurs ============

/// Erreur rendue au client HTTP
#[derive(Debug)]
pub struct ApiError(Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            Error::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::StationNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self.0 {
            Error::StationNotFound(_) => "Station not found".to_string(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "Request failed");
        }

        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============ Paramètres ============

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub tag: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct GenreQuery {
    pub genre: String,
    pub limit: Option<usize>,
}

/// Nom et version du build en cours
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
}

/// Crée le router de l'API (chemins absolus, à monter sur "/")
pub fn create_router(state: RadioBrowserState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/info", get(info))
        .route("/api/stations/popular", get(popular_stations))
        .route("/api/stations/by-country/{country_code}", get(stations_by_country))
        .route("/api/stations/by-tag/{tag}", get(stations_by_tag))
        .route("/api/stations/christian", get(christian_stations))
        .route("/api/stations/search", get(search_stations))
        .route("/api/stations/by-genre", get(stations_by_genre))
        .route("/api/countries", get(countries))
        .route("/api/languages", get(languages))
        .route("/api/tags", get(tags))
        .route("/api/genres", get(genres))
        .route("/api/station/{station_id}", get(station_details))
        .route("/api/station/{station_id}/click", post(click_station))
        .with_state(state)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET / - marqueur de vie
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is running", body = MessageResponse)),
    tag = "radio"
)]
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Global Radio API is running".to_string(),
    })
}

/// GET /info
#[utoipa::path(
    get,
    path = "/info",
    responses((status = 200, description = "Build information", body = InfoResponse)),
    tag = "radio"
)]
pub async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "GlobalRadio".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/stations/popular
#[utoipa::path(
    get,
    path = "/api/stations/popular",
    params(("limit" = Option<usize>, Query, description = "Maximum number of stations (default 50)")),
    responses(
        (status = 200, description = "Stations by click count, descending", body = serde_json::Value),
        (status = 503, description = "Every upstream mirror failed")
    ),
    tag = "stations"
)]
pub async fn popular_stations(
    State(state): State<RadioBrowserState>,
    Query(q): Query<LimitQuery>,
) -> ApiResult<StationsResponse> {
    let stations = state
        .client
        .popular(q.limit.unwrap_or(DEFAULT_POPULAR_LIMIT))
        .await?;
    Ok(Json(StationsResponse { stations }))
}

/// GET /api/stations/by-country/{country_code}
#[utoipa::path(
    get,
    path = "/api/stations/by-country/{country_code}",
    params(
        ("country_code" = String, Path, description = "ISO 3166-1 code, case-insensitive"),
        ("limit" = Option<usize>, Query, description = "Maximum number of stations (default 100)")
    ),
    responses(
        (status = 200, description = "Stations of the country", body = serde_json::Value),
        (status = 503, description = "Every upstream mirror failed")
    ),
    tag = "stations"
)]
pub async fn stations_by_country(
    State(state): State<RadioBrowserState>,
    Path(country_code): Path<String>,
    Query(q): Query<LimitQuery>,
) -> ApiResult<StationsResponse> {
    let stations = state
        .client
        .by_country(&country_code, q.limit.unwrap_or(DEFAULT_COUNTRY_LIMIT))
        .await?;
    Ok(Json(StationsResponse { stations }))
}

/// GET /api/stations/by-tag/{tag}
#[utoipa::path(
    get,
    path = "/api/stations/by-tag/{tag}",
    params(
        ("tag" = String, Path, description = "Upstream tag, case-insensitive"),
        ("limit" = Option<usize>, Query, description = "Maximum number of stations (default 100)")
    ),
    responses(
        (status = 200, description = "Stations carrying the tag", body = serde_json::Value),
        (status = 503, description = "Every upstream mirror failed")
    ),
    tag = "stations"
)]
pub async fn stations_by_tag(
    State(state): State<RadioBrowserState>,
    Path(tag): Path<String>,
    Query(q): Query<LimitQuery>,
) -> ApiResult<StationsResponse> {
    let stations = state
        .client
        .by_tag(&tag, q.limit.unwrap_or(DEFAULT_TAG_LIMIT))
        .await?;
    Ok(Json(StationsResponse { stations }))
}

/// GET /api/stations/christian
///
/// Catégorie composée : les tags en échec sont ignorés.
#[utoipa::path(
    get,
    path = "/api/stations/christian",
    params(("limit" = Option<usize>, Query, description = "Maximum number of stations (default 100)")),
    responses((status = 200, description = "Merged, de-duplicated stations", body = serde_json::Value)),
    tag = "stations"
)]
pub async fn christian_stations(
    State(state): State<RadioBrowserState>,
    Query(q): Query<LimitQuery>,
) -> Json<StationsResponse> {
    let stations = state
        .client
        .christian(q.limit.unwrap_or(DEFAULT_CHRISTIAN_LIMIT))
        .await;
    Json(StationsResponse { stations })
}

/// GET /api/stations/search
#[utoipa::path(
    get,
    path = "/api/stations/search",
    params(
        ("name" = Option<String>, Query, description = "Station name contains"),
        ("country" = Option<String>, Query, description = "Country name"),
        ("language" = Option<String>, Query, description = "Language name"),
        ("tag" = Option<String>, Query, description = "Tag"),
        ("limit" = Option<usize>, Query, description = "Maximum number of stations (default 50)")
    ),
    responses(
        (status = 200, description = "Matching stations", body = serde_json::Value),
        (status = 503, description = "Every upstream mirror failed")
    ),
    tag = "stations"
)]
pub async fn search_stations(
    State(state): State<RadioBrowserState>,
    Query(q): Query<SearchQuery>,
) -> ApiResult<StationsResponse> {
    let filters = SearchFilters {
        name: q.name,
        country: q.country,
        language: q.language,
        tag: q.tag,
    };
    let stations = state
        .client
        .search(filters, q.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
        .await?;
    Ok(Json(StationsResponse { stations }))
}

/// GET /api/stations/by-genre
#[utoipa::path(
    get,
    path = "/api/stations/by-genre",
    params(
        ("genre" = String, Query, description = "Genre slug, unknown slugs are used as the tag"),
        ("limit" = Option<usize>, Query, description = "Maximum number of stations (default 50)")
    ),
    responses(
        (status = 200, description = "Stations of the genre", body = serde_json::Value),
        (status = 503, description = "Every upstream mirror failed")
    ),
    tag = "stations"
)]
pub async fn stations_by_genre(
    State(state): State<RadioBrowserState>,
    Query(q): Query<GenreQuery>,
) -> ApiResult<StationsResponse> {
    let stations = state
        .client
        .by_genre(&q.genre, q.limit.unwrap_or(DEFAULT_GENRE_LIMIT))
        .await?;
    Ok(Json(StationsResponse { stations }))
}

/// GET /api/countries
#[utoipa::path(
    get,
    path = "/api/countries",
    responses(
        (status = 200, description = "Countries by station count, descending", body = serde_json::Value),
        (status = 503, description = "Every upstream mirror failed")
    ),
    tag = "catalog"
)]
pub async fn countries(State(state): State<RadioBrowserState>) -> ApiResult<CountriesResponse> {
    let countries = state.client.countries().await?;
    Ok(Json(CountriesResponse { countries }))
}

/// GET /api/languages
#[utoipa::path(
    get,
    path = "/api/languages",
    responses(
        (status = 200, description = "Languages by station count, descending", body = serde_json::Value),
        (status = 503, description = "Every upstream mirror failed")
    ),
    tag = "catalog"
)]
pub async fn languages(State(state): State<RadioBrowserState>) -> ApiResult<LanguagesResponse> {
    let languages = state.client.languages().await?;
    Ok(Json(LanguagesResponse { languages }))
}

/// GET /api/tags
#[utoipa::path(
    get,
    path = "/api/tags",
    params(("limit" = Option<usize>, Query, description = "Maximum number of tags (default 100)")),
    responses(
        (status = 200, description = "Tags by station count, descending", body = serde_json::Value),
        (status = 503, description = "Every upstream mirror failed")
    ),
    tag = "catalog"
)]
pub async fn tags(
    State(state): State<RadioBrowserState>,
    Query(q): Query<LimitQuery>,
) -> ApiResult<TagsResponse> {
    let tags = state
        .client
        .tags(q.limit.unwrap_or(DEFAULT_TAGS_LIMIT))
        .await?;
    Ok(Json(TagsResponse { tags }))
}

/// GET /api/genres - liste statique, aucun appel amont
#[utoipa::path(
    get,
    path = "/api/genres",
    responses((status = 200, description = "Curated genres", body = GenresResponse)),
    tag = "catalog"
)]
pub async fn genres(State(state): State<RadioBrowserState>) -> Json<GenresResponse> {
    Json(GenresResponse {
        genres: state.client.genres(),
    })
}

/// GET /api/station/{station_id}
#[utoipa::path(
    get,
    path = "/api/station/{station_id}",
    params(("station_id" = String, Path, description = "Station UUID")),
    responses(
        (status = 200, description = "Station details", body = serde_json::Value),
        (status = 404, description = "Unknown station"),
        (status = 503, description = "Every upstream mirror failed")
    ),
    tag = "stations"
)]
pub async fn station_details(
    State(state): State<RadioBrowserState>,
    Path(station_id): Path<String>,
) -> ApiResult<StationResponse> {
    let station = state.client.station(&station_id).await?;
    Ok(Json(StationResponse { station }))
}

/// POST /api/station/{station_id}/click
#[utoipa::path(
    post,
    path = "/api/station/{station_id}/click",
    params(("station_id" = String, Path, description = "Station UUID")),
    responses((status = 200, description = "Click outcome, failures reported in the body", body = ClickResponse)),
    tag = "stations"
)]
pub async fn click_station(
    State(state): State<RadioBrowserState>,
    Path(station_id): Path<String>,
) -> Json<ClickResponse> {
    Json(state.client.click(&station_id).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FailureCause, MirrorFailure};

    #[test]
    fn test_error_status_mapping() {
        let unavailable = ApiError::from(Error::Unavailable {
            failures: vec![MirrorFailure {
                mirror: "https://a".into(),
                cause: FailureCause::Timeout,
            }],
        });
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ApiError::from(Error::StationNotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(Error::NoMirrors).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(Error::Dns("timed out".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_is_detail() {
        let response = ApiError::from(Error::StationNotFound("abc".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"detail": "Station not found"}));
    }
}
