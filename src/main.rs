//! Viewkit server

use anyhow::Result;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use viewkit::{
    api::{self, AppState},
    config::Config,
    db,
    services::MailService,
    theme::TemplateEngine,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "viewkit=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting viewkit...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Templates: embedded defaults, overridden from the configured directory
    let engine = TemplateEngine::new(&config.templates.path, &config.site)?;
    let templates = Arc::new(RwLock::new(engine));
    tracing::info!("Templates loaded from {}", config.templates.path.display());

    let mail = MailService::from_config(&config.mail, templates.clone())?;
    if mail.is_none() {
        tracing::info!("No SMTP host configured, mail is disabled");
    }

    let state = AppState::new(pool, templates, config.views.clone(), mail);
    let app = api::build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
