use std::sync::Arc;

use anyhow::Context;
use common::storage::MediaStore;
use common::storage::filesystem::FilesystemMediaStore;
use common::storage::s3::S3MediaStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::{AppConfig, StorageBackend, StorageConfig};
use server::state::AppState;

async fn create_media_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn MediaStore>> {
    Ok(match config.backend {
        StorageBackend::Filesystem => Arc::new(
            FilesystemMediaStore::new(config.path.clone(), config.max_upload_size).await?,
        ),
        StorageBackend::S3 => {
            let settings = config
                .s3
                .as_ref()
                .context("storage.s3 settings required for the s3 backend")?;
            Arc::new(S3MediaStore::new(settings, config.max_upload_size)?)
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = server::database::init_db(&config.database)
        .await
        .context("Failed to connect to database")?;
    server::seed::seed_role_permissions(&db).await?;
    server::seed::ensure_indexes(&db).await?;

    let media = create_media_store(&config.storage).await?;
    let mailer = server::mail::create_mail_client(&config.mail)?;
    let payments = server::payments::create_payment_gateway(&config.payments)?;
    if payments.is_none() {
        info!("Payments disabled");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config,
        media,
        mailer,
        payments,
    };
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
