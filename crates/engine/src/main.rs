//! Waypoint Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use waypoint_domain::ExperienceId;

use waypoint_engine::infrastructure::{
    auth::{HttpAuthClient, DEFAULT_AUTH_BASE_URL},
    clock::SystemClock,
    interpreter::{HttpInterpreterClient, DEFAULT_INTERPRETER_BASE_URL},
    ports::{ClockPort, TemplateStorePort},
    resilient_interpreter::{ResilientInterpreterClient, RetryConfig},
    templates::SqliteTemplateStore,
};
use waypoint_engine::{api, App};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine runs from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waypoint_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Waypoint Engine");

    // Load configuration
    let auth_url =
        std::env::var("AUTH_SERVICE_URL").unwrap_or_else(|_| DEFAULT_AUTH_BASE_URL.into());
    let interpreter_url =
        std::env::var("INTERPRETER_URL").unwrap_or_else(|_| DEFAULT_INTERPRETER_BASE_URL.into());
    let template_db = std::env::var("TEMPLATE_DB").unwrap_or_else(|_| "templates.db".into());
    let server_host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let server_port: u16 = std::env::var("SERVER_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .unwrap_or(3000);

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());

    // Infrastructure clients
    let auth = Arc::new(HttpAuthClient::new(&auth_url));
    let interpreter_client = Arc::new(HttpInterpreterClient::new(&interpreter_url));
    let retry_config = RetryConfig::default();
    tracing::info!(
        max_retries = retry_config.max_retries,
        base_delay_ms = retry_config.base_delay_ms,
        "Interpreter client configured with retry"
    );
    let interpreter = Arc::new(ResilientInterpreterClient::new(
        interpreter_client,
        retry_config,
    ));
    let broker = Arc::new(waypoint_engine::infrastructure::broker::InProcessBroker::new());
    let templates = Arc::new(SqliteTemplateStore::new(&template_db, clock.clone()).await?);

    // Create application
    let app = Arc::new(App::new(auth, interpreter, broker, templates, clock));

    provision_experiences(&app).await?;

    // Build router
    let mut router = api::build_router(app);
    if let Some(cors) = build_cors_layer_from_env() {
        router = router.layer(cors);
    }

    // Start server
    let addr: SocketAddr = format!("{server_host}:{server_port}").parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

/// Instantiate worlds from stored templates at startup.
///
/// `EXPERIENCE_IDS` is a comma-separated list of experience ids whose
/// templates the store must already hold.
async fn provision_experiences(app: &App) -> anyhow::Result<()> {
    let Ok(raw) = std::env::var("EXPERIENCE_IDS") else {
        tracing::warn!("EXPERIENCE_IDS not set; no worlds provisioned at startup");
        return Ok(());
    };

    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let experience_id: ExperienceId = entry
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid experience id '{entry}': {e}"))?;
        match app.templates.load_template(experience_id).await? {
            Some(template) => app.worlds.provision(template.instantiate()),
            None => tracing::warn!(experience_id = %experience_id, "No template stored; skipping"),
        }
    }
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer_from_env() -> Option<CorsLayer> {
    let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())?;

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}
