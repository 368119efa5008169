use axum::Json;

pub const API_VERSION: &str = "1.0.0";

pub const ENDPOINTS: [&str; 4] = ["/", "/estatisticas", "/estatistica/{id}", "/logs"];

#[derive(serde::Serialize)]
pub struct JsonServiceDescriptor {
    message: &'static str,
    status: &'static str,
    endpoints: Vec<&'static str>,
    version: &'static str,
}

pub async fn get_index() -> Json<JsonServiceDescriptor> {
    Json(JsonServiceDescriptor {
        message: "Match statistics API is running",
        status: "ok",
        endpoints: ENDPOINTS.to_vec(),
        version: API_VERSION,
    })
}
