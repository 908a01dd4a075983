use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Global Radio API",
        version = "0.1.0",
        description = "Façade REST de l'annuaire radio-browser avec bascule entre miroirs",
        contact(
            name = "Global Radio Contributors",
        )
    ),
    paths(
        crate::api_rest::root,
        crate::api_rest::info,
        crate::api_rest::popular_stations,
        crate::api_rest::stations_by_country,
        crate::api_rest::stations_by_tag,
        crate::api_rest::christian_stations,
        crate::api_rest::search_stations,
        crate::api_rest::stations_by_genre,
        crate::api_rest::countries,
        crate::api_rest::languages,
        crate::api_rest::tags,
        crate::api_rest::genres,
        crate::api_rest::station_details,
        crate::api_rest::click_station,
    ),
    components(
        schemas(
            crate::models::Genre,
            crate::models::GenresResponse,
            crate::models::ClickResponse,
            crate::models::MessageResponse,
            crate::api_rest::InfoResponse,
        )
    ),
    tags(
        (name = "radio", description = "Liveness and build information"),
        (name = "stations", description = "Station lists and single station endpoints"),
        (name = "catalog", description = "Countries, languages, tags and curated genres")
    )
)]
pub struct ApiDoc;
