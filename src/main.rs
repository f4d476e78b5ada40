use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use leadgen_dashboard::config::Config;
use leadgen_dashboard::handlers::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Serves the OpenAPI specification YAML file.
///
/// This endpoint reads the `openapi.yml` file from the filesystem and serves it
/// with the appropriate content type. If the file is not found, it returns a 404 error.
///
/// # Returns
///
/// * `impl IntoResponse` - The HTTP response containing the OpenAPI YAML content or an error message.
async fn serve_openapi_spec() -> impl IntoResponse {
    match tokio::fs::read_to_string("openapi.yml").await {
        Ok(content) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/yaml")],
            content,
        )
            .into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            "OpenAPI spec not found. Run the server from the repository root.",
        )
            .into_response(),
    }
}

/// Serves the Swagger UI HTML page.
///
/// # Returns
///
/// * `impl IntoResponse` - The HTTP response containing the Swagger UI HTML.
async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Lead Generation Dashboard API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.yml",
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - Application state (history store, search backend, caches).
/// - HTTP routes and middleware (CORS, Rate Limiting).
///
/// It then starts the Axum server.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leadgen_dashboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let port = config.port;

    // Build application state
    let app_state = Arc::new(AppState::new(config)?);

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid rate limiter configuration"))?,
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        // API Documentation
        .route("/docs", get(serve_swagger_ui))
        .route("/api-docs/openapi.yml", get(serve_openapi_spec))
        // Searches and history
        .route(
            "/api/v1/searches",
            get(handlers::list_searches)
                .post(handlers::execute_search)
                .delete(handlers::clear_searches),
        )
        .route("/api/v1/searches/export", get(handlers::export_searches))
        .route(
            "/api/v1/searches/:id",
            get(handlers::get_search).delete(handlers::delete_search),
        )
        .route("/api/v1/searches/:id/export", get(handlers::export_search))
        .route("/api/v1/searches/:id/rerun", post(handlers::rerun_search))
        .route("/api/v1/searches/:id/filters", get(handlers::search_filter_options))
        .route("/api/v1/searches/:id/leads", get(handlers::search_leads))
        .route(
            "/api/v1/searches/:id/leads/export",
            get(handlers::export_search_leads),
        )
        // Leads
        .route("/api/v1/leads", get(handlers::list_leads))
        .route("/api/v1/leads/export", get(handlers::export_leads))
        .route("/api/v1/leads/filters", get(handlers::lead_filter_options))
        .route("/api/v1/leads/:id", get(handlers::get_lead))
        .route(
            "/api/v1/leads/:id/crm",
            post(handlers::add_lead_to_crm).delete(handlers::remove_lead_from_crm),
        )
        // Lookups
        .route("/api/v1/categories", get(handlers::list_categories))
        .route("/api/v1/locations", get(handlers::list_locations))
        // Search API pass-through reads
        .route("/api/v1/remote/leads", get(handlers::remote_leads))
        .route("/api/v1/remote/history", get(handlers::remote_history))
        .layer(
            ServiceBuilder::new()
                // Request size limit: 5MB max payload (prevents memory exhaustion)
                .layer(RequestBodyLimitLayer::new(5 * 1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
