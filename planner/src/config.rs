/// Base URL of the OSRM-compatible routing service.
pub fn osrm_api_url() -> String {
    let url =
        std::env::var("OSRM_API_URL").unwrap_or_else(|_| "http://localhost:8090".to_string());
    url.trim_end_matches('/').to_string()
}

/// Style document for the map layer; the core never fetches it, UI
/// shells pass it to their rendering library.
pub fn map_style_url() -> String {
    std::env::var("MAP_STYLE_URL")
        .unwrap_or_else(|_| "http://localhost:8080/styles/osm-bright/style.json".to_string())
}
