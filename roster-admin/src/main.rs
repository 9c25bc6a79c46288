//! roster-admin - Team and content administration service
//!
//! Loads the team from the configured backend into an edit session and
//! serves the admin API, the public team view and the image library.

use anyhow::{Context, Result};
use clap::Parser;
use roster_common::config::{resolve_root_folder, AdminConfig, BackendConfig, ROOT_FOLDER_ENV};
use roster_common::content::ContentStore;
use roster_common::library::LocalObjectStore;
use roster_common::seed::SeedPolicy;
use roster_common::store::{RestStore, SqliteStore, TableStore};
use roster_common::{EditSession, Reconciler};
use roster_admin::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "roster-admin", version, about = "Team and content administration service")]
struct Args {
    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root folder for database, images and content
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Override the configured port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AdminConfig::load_or_default(args.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "Starting roster-admin v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root = resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV, &config);
    let paths = config.resolve_paths(&root);
    std::fs::create_dir_all(&paths.root)
        .with_context(|| format!("Cannot create root folder {}", paths.root.display()))?;
    info!("Root folder: {}", paths.root.display());

    let store: Arc<dyn TableStore> = match &config.backend {
        BackendConfig::Sqlite => {
            info!("Database path: {}", paths.database.display());
            Arc::new(SqliteStore::open(&paths.database).await?)
        }
        BackendConfig::Rest { url, api_key } => {
            info!("Using REST backend at {}", url);
            Arc::new(RestStore::new(url.as_str(), api_key.as_str()))
        }
    };
    let seed = if config.seed_defaults {
        SeedPolicy::Defaults
    } else {
        SeedPolicy::Disabled
    };
    let engine = Arc::new(Reconciler::new(store, seed));

    // A failed initial load leaves the admin usable; the operator can retry via /api/team/load
    let session = match engine.open_session().await {
        Ok(session) => {
            info!(
                "✓ Loaded {} sections, {} members",
                session.sections().len(),
                session.all_members().len()
            );
            session
        }
        Err(e) => {
            warn!("Initial team load failed: {}", e);
            EditSession::new(Vec::new(), Vec::new())
        }
    };

    let library = Arc::new(LocalObjectStore::new(
        &paths.images,
        config.public_image_base_url.as_str(),
        config.max_upload_bytes,
    ));
    let content = ContentStore::new(&paths.content);

    if config.admin_token.is_none() {
        warn!("No admin_token configured - admin API is unauthenticated");
    }

    let state = AppState::new(
        engine,
        session,
        library,
        content,
        config.admin_token.clone(),
        config.max_upload_bytes,
    );
    let mut app = build_router(state);
    // Absolute base URLs point at an external host that serves the files itself
    let image_route = config.public_image_base_url.trim_end_matches('/');
    if image_route.starts_with('/') && image_route.len() > 1 {
        app = app.nest_service(image_route, ServeDir::new(&paths.images));
    }
    let app = app.layer(TraceLayer::new_for_http());

    let port = args.port.unwrap_or(config.port);
    let addr = format!("{}:{}", config.bind_addr, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Cannot bind {}", addr))?;
    info!("roster-admin listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
