use super::app_error::AppError;
use super::health::{__path_health, __path_liveness, health, liveness};
use super::lint::{__path_lint_metrics, lint_metrics};
use super::push::{
    __path_push_gateway_passthrough, __path_push_metrics, push_gateway_passthrough, push_metrics,
};
use super::state::HttpServerState;
use crate::config;
use anyhow::Result;
use axum::Json;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::header;
use axum::routing::{get, post, put};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace;
use tower_http::{ServiceBuilderExt, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "PushProxy", description = "Validating proxy for the Prometheus Push Gateway"),
        (name = "Push", description = "Metrics submission"),
        (name = "Lint", description = "Prometheus text format linter"),
        (name = "Health", description = "Health checks"),
    ),
    paths(frontpage, health, liveness, lint_metrics, push_metrics, push_gateway_passthrough),
)]
struct ApiDoc;

/// All routes of the service, shared by the server and the tests.
pub fn build_app_routes(state: HttpServerState, max_body_layer: DefaultBodyLimit) -> Router {
    Router::new()
        .route("/", get(frontpage))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .route("/health", get(health))
        .route("/health/live", get(liveness))
        .route("/lint", put(lint_metrics).layer(max_body_layer.clone()))
        .route(
            "/push_metrics",
            post(push_metrics).layer(max_body_layer.clone()),
        )
        // Push Gateway API
        .route(
            "/metrics/{*grouping_key}",
            put(push_gateway_passthrough)
                .post(push_gateway_passthrough)
                .layer(max_body_layer),
        )
        .with_state(state)
}

pub async fn run_http_server(state: HttpServerState, address: SocketAddr) -> Result<()> {
    let config = config::get()?;
    let max_body_layer = DefaultBodyLimit::max(config.parse_http_body_limit()?);
    let timeout_seconds = config.http_server_timeout_seconds;

    // List of headers that shouldn't be logged
    let sensitive_headers: Arc<[_]> = vec![header::AUTHORIZATION, header::COOKIE].into();

    let middleware = ServiceBuilder::new()
        .sensitive_request_headers(sensitive_headers.clone())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .sensitive_response_headers(sensitive_headers)
        .layer(TimeoutLayer::new(Duration::from_secs(timeout_seconds)))
        .compression()
        .into_inner();

    let app = build_app_routes(state, max_body_layer).layer(middleware);

    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => tracing::error!("Failed to listen for the shutdown signal: {}", err),
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "PushProxy",
    responses(
        (status = 200, description = "PushProxy Frontpage", body = String)
    )
)]
async fn frontpage(State(state): State<HttpServerState>) -> Result<Json<String>, AppError> {
    let name: String = (*state.name).clone();
    Ok(Json(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::LintPolicy;
    use crate::proxy::PushPipeline;
    use crate::test_utils::{RecordingGateway, StaticLinter};
    use crate::parsing::TextFormatParser;
    use crate::validation::SemanticValidator;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn state() -> HttpServerState {
        HttpServerState {
            name: Arc::new("hello world".to_string()),
            pipeline: Arc::new(PushPipeline::new(
                Arc::new(StaticLinter::clean()),
                Arc::new(TextFormatParser),
                Arc::new(SemanticValidator::new()),
                Arc::new(RecordingGateway::new()),
                LintPolicy::Strict,
            )),
            gateway_url: None,
        }
    }

    #[tokio::test]
    async fn test_frontpage() {
        let app = build_app_routes(state(), DefaultBodyLimit::max(1024));
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body_str =
            String::from_utf8(to_bytes(response.into_body(), 128).await.unwrap().to_vec()).unwrap();
        assert_eq!(body_str, "\"hello world\"");
    }

    #[tokio::test]
    async fn test_passthrough_without_gateway() {
        let app = build_app_routes(state(), DefaultBodyLimit::max(1024));
        let request = Request::builder()
            .method("PUT")
            .uri("/metrics/job/sample")
            .body(Body::from("up 1\n"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_lint_route_only_accepts_put() {
        let app = build_app_routes(state(), DefaultBodyLimit::max(1024));
        let request = Request::builder()
            .method("GET")
            .uri("/lint")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_openapi_describes_lint_problems() {
        let components = ApiDoc::openapi().components.unwrap();
        assert!(components.schemas.contains_key("LintResponse"));
        assert!(components.schemas.contains_key("LintProblem"));
        assert!(components.schemas.contains_key("PushAccepted"));
    }
}
