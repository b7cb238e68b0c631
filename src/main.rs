use anyhow::{Context, Result};
use location_admin::{config::AppConfig, db, routes, state::AppState};
use std::{io::ErrorKind, path::Path, sync::Arc};
use tokio::{fs, net::TcpListener};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = AppConfig::from_env_and_args()?;

    tracing::info!(
        addr = %cfg.addr(),
        upload_dir = %cfg.upload_dir,
        database_url = %cfg.database_url,
        "starting location-admin"
    );

    // --- Ensure upload directory exists ---
    let images_dir = Path::new(&cfg.upload_dir).join("images");
    if !images_dir.exists() {
        fs::create_dir_all(&images_dir)
            .await
            .with_context(|| format!("creating {}", images_dir.display()))?;
        tracing::info!("Created upload directory at {}", images_dir.display());
    }

    // --- Initialize SQLite connection ---
    let db_path = cfg
        .database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .trim_start_matches("file:");
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    let pool = db::connect(&cfg.database_url, 5)
        .await
        .with_context(|| format!("connecting to {}", cfg.database_url))?;
    let db = Arc::new(pool);

    db::run_migrations(&db).await.context("running migrations")?;

    // --- Handle migration mode ---
    if migrate {
        tracing::info!("Database migration complete.");
        return Ok(());
    }

    let state = AppState::new(db, cfg.clone());

    // --- Seed admin ---
    if let (Some(email), Some(password)) = (&cfg.admin_email, &cfg.admin_password) {
        state
            .users
            .ensure_admin(email, password)
            .await
            .context("seeding admin account")?;
    }

    // --- Build router ---
    let app = routes::app(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
