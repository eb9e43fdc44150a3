use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use receiptly_agent::{AgentRouter, ReceiptPipeline};
use receiptly_core::config::{AppConfig, ConfigError, LoadOptions};
use receiptly_db::repositories::{SqlChatHistoryRepository, SqlReceiptRepository};
use receiptly_db::{connect_with_settings, migrations, DbPool};
use receiptly_gauth::{AuthError, ServiceAccountKey};
use receiptly_gemini::{GeminiClient, GeminiError};
use receiptly_search::{CustomSearchClient, IpLocator};
use receiptly_wallet::{WalletClient, WalletError};

use crate::routes::AppState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("credential loading failed: {0}")]
    Credentials(#[from] AuthError),
    #[error("model client setup failed: {0}")]
    Gemini(#[from] GeminiError),
    #[error("wallet client setup failed: {0}")]
    Wallet(#[from] WalletError),
    #[error("outbound HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let gemini_key = ServiceAccountKey::load(&config.gemini.credentials_path).await?;
    let wallet_key = ServiceAccountKey::load(&config.wallet.credentials_path).await?;

    let llm = Arc::new(GeminiClient::new(&config.gemini, gemini_key)?);
    let wallet = Arc::new(WalletClient::new(&config.wallet, wallet_key)?);
    let search = Arc::new(CustomSearchClient::new(&config.search)?);
    let locator = Arc::new(IpLocator::new(&config.location)?);
    info!(
        event_name = "system.bootstrap.clients_ready",
        model = %config.gemini.model,
        price_search_configured = config.search.api_key.is_some(),
        "outbound clients initialized"
    );

    let receipts = Arc::new(SqlReceiptRepository::new(db_pool.clone()));
    let chat_history = Arc::new(SqlChatHistoryRepository::new(db_pool.clone()));

    let router = Arc::new(AgentRouter::new(
        llm.clone(),
        receipts.clone(),
        chat_history,
        search,
        locator,
    ));
    let pipeline = Arc::new(ReceiptPipeline::new(llm, receipts));

    let state = AppState::new(router, pipeline, wallet);

    Ok(Application { config, db_pool, state })
}
