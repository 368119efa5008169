use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use log::{error, info};
use matchstats_domain::{ServiceError, service::ArcStatService};

mod audit;
mod index;
pub mod payload;
mod stats;

#[derive(Clone)]
pub struct AppState {
    pub stat_service: ArcStatService,
}

/// Builds the API router. With `initialize_per_request` the store is re-initialized before
/// every request, for deployments where the database may vanish between requests.
pub fn router(state: AppState, initialize_per_request: bool) -> Router {
    let mut router: Router<AppState> = Router::new()
        .route("/", get(index::get_index))
        .route("/estatisticas", get(stats::list).post(stats::create))
        .route(
            "/estatistica/{id}",
            get(stats::get_by_id)
                .put(stats::update)
                .delete(stats::delete),
        )
        .route("/logs", get(audit::list_logs));

    if initialize_per_request {
        router = router.route_layer(middleware::from_fn_with_state(
            state.clone(),
            ensure_ready,
        ));
    }

    router.with_state(state)
}

async fn ensure_ready(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    app_state.stat_service.ensure_ready().await?;
    Ok(next.run(request).await)
}

pub async fn run(
    state: AppState,
    addr: SocketAddr,
    initialize_per_request: bool,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("API server listening on {}", addr);
    axum::serve(listener, router(state, initialize_per_request))
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("HTTP API shut down gracefully");
    Ok(())
}

pub struct ApiError(ServiceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            ServiceError::Validation(err) => {
                let body = serde_json::json!({ "error": err.to_string(), "fields": err.fields() });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ServiceError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": msg }))).into_response()
            }
            ServiceError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": msg }))).into_response()
            }
            ServiceError::Internal(msg) => {
                error!("Request failed: {}", msg);
                let body = serde_json::json!({ "error": "internal server error" });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        ApiError(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request, header},
    };
    use http_body_util::BodyExt;
    use matchstats_domain::{
        audit::{MockAuditLog, events},
        service::StatServiceImpl,
        stats::{MatchStats, MockStatRepository, StatCount, StatName},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    fn seed_row(name: &str, kills: StatCount, deaths: StatCount) -> MatchStats {
        MatchStats {
            name: StatName::parse(name).unwrap(),
            kills,
            deaths,
            assists: 10,
            damage: 2300,
            earnings: 8000,
            date: "2025-10-01".to_string(),
        }
    }

    fn app_with(repo: MockStatRepository, audit: MockAuditLog, per_request: bool) -> Router {
        let service = StatServiceImpl::new(Arc::new(Box::new(repo)), Arc::new(Box::new(audit)));
        router(
            AppState {
                stat_service: Arc::new(Box::new(service)),
            },
            per_request,
        )
    }

    fn app() -> Router {
        app_with(MockStatRepository::default(), MockAuditLog::default(), false)
    }

    fn body_payload() -> Value {
        json!({
            "name": "Chico",
            "kills": 21,
            "deaths": 12,
            "assists": 10,
            "damage": 2300,
            "earnings": 8000,
            "date": "2025-10-01",
        })
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: impl Into<Body>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let response = app
            .clone()
            .oneshot(builder.body(body.into()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(app, Method::GET, uri, None, Body::empty()).await
    }

    async fn post_json(app: &Router, body: Value) -> (StatusCode, Value) {
        send(
            app,
            Method::POST,
            "/estatisticas",
            Some("application/json"),
            body.to_string(),
        )
        .await
    }

    #[tokio::test]
    async fn test_index() {
        let (status, body) = get_json(&app(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], "1.0.0");
        assert!(
            body["endpoints"]
                .as_array()
                .unwrap()
                .contains(&json!("/estatisticas"))
        );
    }

    #[tokio::test]
    async fn test_list_empty() {
        let (status, body) = get_json(&app(), "/estatisticas").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let app = app();
        let (status, created) = post_json(&app, body_payload()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 1);
        assert_eq!(created["name"], "Chico");
        assert_eq!(created["kd_ratio"], 1.75);

        let (_, second) = post_json(&app, body_payload()).await;
        assert!(second["id"].as_i64().unwrap() > created["id"].as_i64().unwrap());

        let (status, list) = get_json(&app, "/estatisticas").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 2);
        assert_eq!(list[0], created);
    }

    #[tokio::test]
    async fn test_create_from_form() {
        let app = app();
        let (status, created) = send(
            &app,
            Method::POST,
            "/estatisticas",
            Some("application/x-www-form-urlencoded"),
            "name=Lia&kills=30&deaths=0&assists=4&damage=3400&earnings=9500&date=2025-10-02",
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["kills"], 30);
        assert_eq!(created["kd_ratio"], Value::Null);
    }

    #[tokio::test]
    async fn test_create_without_content_type() {
        let app = app();
        let (status, _) = send(
            &app,
            Method::POST,
            "/estatisticas",
            None,
            body_payload().to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, created) = send(
            &app,
            Method::POST,
            "/estatisticas",
            None,
            "name=Rafa&kills=1&deaths=2&assists=3&damage=4&earnings=5&date=2025-10-03",
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["name"], "Rafa");
    }

    #[tokio::test]
    async fn test_create_missing_fields() {
        let app = app();
        let mut payload = body_payload();
        payload.as_object_mut().unwrap().remove("kills");
        payload.as_object_mut().unwrap().remove("date");

        let (status, body) = post_json(&app, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"], json!(["kills", "date"]));

        let (_, list) = get_json(&app, "/estatisticas").await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_create_invalid_values() {
        let app = app();

        let mut payload = body_payload();
        payload["name"] = json!("   ");
        let (status, body) = post_json(&app, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"], json!(["name"]));

        let mut payload = body_payload();
        payload["damage"] = json!("lots");
        let (status, body) = post_json(&app, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"], json!(["damage"]));

        let (status, _) = send(
            &app,
            Method::POST,
            "/estatisticas",
            Some("application/json"),
            "{not json",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_store_failure_is_hidden() {
        let app = app_with(MockStatRepository::broken(), MockAuditLog::default(), false);
        let (status, body) = post_json(&app, body_payload()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "internal server error" }));
    }

    #[tokio::test]
    async fn test_update() {
        let app = app();
        let (_, created) = post_json(&app, body_payload()).await;

        let replacement = json!({
            "name": "Rafa",
            "kills": "15",
            "deaths": 9,
            "assists": 7,
            "damage": 1850,
            "earnings": 6200,
            "date": "2025-10-04",
        });
        let (status, updated) = send(
            &app,
            Method::PUT,
            "/estatistica/1",
            Some("application/json"),
            replacement.to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], created["id"]);

        let (status, read) = get_json(&app, "/estatistica/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(read, updated);
        assert_eq!(read["name"], "Rafa");
        assert_eq!(read["kills"], 15);
        assert_eq!(read["date"], "2025-10-04");
    }

    #[tokio::test]
    async fn test_update_errors() {
        let app = app();
        post_json(&app, body_payload()).await;

        let (status, _) = send(
            &app,
            Method::PUT,
            "/estatistica/99",
            Some("application/json"),
            body_payload().to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            Method::PUT,
            "/estatistica/1",
            Some("application/json"),
            json!({ "name": "Only a name" }).to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"].as_array().unwrap().len(), 6);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/estatistica/abc",
            Some("application/json"),
            body_payload().to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let app = app();
        post_json(&app, body_payload()).await;

        let (status, body) = send(&app, Method::DELETE, "/estatistica/1", None, Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].is_string());

        let (status, _) = send(&app, Method::DELETE, "/estatistica/1", None, Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get_json(&app, "/estatistica/1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_logs_empty() {
        let (status, body) = get_json(&app(), "/logs").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_logs_after_mutations() {
        let audit = MockAuditLog::default();
        let app = app_with(MockStatRepository::default(), audit.clone(), false);

        post_json(&app, body_payload()).await;
        send(&app, Method::DELETE, "/estatistica/1", None, Body::empty()).await;

        let (status, body) = get_json(&app, "/logs").await;
        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["event"], events::STAT_CREATED);
        assert_eq!(entries[1]["event"], events::STAT_DELETED);

        let timestamp = entries[0]["timestamp"].as_str().unwrap();
        assert_eq!(timestamp.len(), "2025-10-01 12:00:00".len());
        assert_eq!(&timestamp[4..5], "-");
        assert_eq!(&timestamp[10..11], " ");
    }

    #[tokio::test]
    async fn test_initialize_per_request() {
        let repo = MockStatRepository::with_seed(vec![
            seed_row("Chico", 21, 12),
            seed_row("Rafa", 15, 9),
            seed_row("Lia", 30, 5),
        ]);
        let audit = MockAuditLog::default();
        let app = app_with(repo, audit.clone(), true);

        let (status, body) = get_json(&app, "/estatisticas").await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Chico", "Rafa", "Lia"]);

        let (_, body) = get_json(&app, "/estatisticas").await;
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert!(!audit.events().contains(&events::INIT_DB.to_string()));
    }
}
