use actix_cors::Cors;
use actix_web::{middleware::Compress, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use dense::config::{AppConfig, StoreBackend};
use dense::notify::WebhookNotifier;
use dense::openapi::ApiDoc;
use dense::repo::DocumentRepo;
use dense::store::{DocumentStore, GitHubStore, InMemoryStore};
use dense::{config, AppState, SecurityHeaders};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Bootstrapping dense backend");
    let cfg = AppConfig::from_env();
    for w in cfg.warnings() {
        warn!("{w}");
    }

    let store: Arc<dyn DocumentStore> = match &cfg.store {
        StoreBackend::GitHub(gh) => Arc::new(GitHubStore::new(gh.clone()).context("building GitHub client")?),
        StoreBackend::Memory => {
            info!("Using in-memory document store");
            Arc::new(InMemoryStore::new())
        }
    };
    let mut state = AppState::new(DocumentRepo::new(store, cfg.paths.clone(), cfg.retry));
    if let Some(url) = &cfg.notify_webhook {
        info!("Account request notifications enabled");
        state = state.with_notifier(Arc::new(WebhookNotifier::new(url.clone()).context("building webhook client")?));
    }

    let openapi = ApiDoc::openapi();
    let origins = cfg.allowed_origins.clone();
    let enable_hsts = cfg.enable_hsts;

    let server = HttpServer::new(move || {
        let cors = origins
            .iter()
            .fold(Cors::default(), |c, origin| c.allowed_origin(origin))
            .allowed_methods(["GET", "POST", "OPTIONS"])
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(SecurityHeaders::new(enable_hsts))
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .configure(config)
            .service(SwaggerUi::new("/docs/{_:.*}").url("/docs/openapi.json", openapi.clone()))
    })
    .bind(("0.0.0.0", cfg.port))
    .with_context(|| format!("binding port {}", cfg.port))?;

    info!("Listening on http://0.0.0.0:{}", cfg.port);
    server.run().await?;
    Ok(())
}
