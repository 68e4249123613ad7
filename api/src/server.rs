use crate::{create_router, AppState};
use authz::{
    AccountKindOracle, DecisionFactory, StaticAccountKinds, WhitelistConfiguration,
};
use std::sync::Arc;
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Port to listen on
    pub port: u16,
    /// Application whitelist, loaded once at startup
    pub whitelist: Arc<WhitelistConfiguration>,
    /// Maps account-kind ids from claims to kind names
    pub account_kinds: Arc<dyn AccountKindOracle>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 3030,
            whitelist: Arc::new(WhitelistConfiguration::empty()),
            account_kinds: Arc::new(StaticAccountKinds::default()),
        }
    }
}

impl ApiConfig {
    /// Create a new API configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the application whitelist
    pub fn with_whitelist(mut self, whitelist: Arc<WhitelistConfiguration>) -> Self {
        self.whitelist = whitelist;
        self
    }

    /// Set the account-kind oracle
    pub fn with_account_kinds(mut self, account_kinds: Arc<dyn AccountKindOracle>) -> Self {
        self.account_kinds = account_kinds;
        self
    }

    /// Decision factory sharing this configuration's whitelist and oracle.
    pub fn decision_factory(&self) -> DecisionFactory {
        DecisionFactory::new(self.whitelist.clone(), self.account_kinds.clone())
    }
}

/// Start the API server with the given configuration
pub async fn start_server(
    db: Arc<database::Database>,
    config: ApiConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!(
        applications = config.whitelist.len(),
        "Starting API server with application whitelist"
    );

    let state = AppState::new(db, config.decision_factory());
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on {}", addr);
    info!(
        "Swagger UI available at http://localhost:{}/api/v1/swagger",
        config.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
