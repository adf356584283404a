//! Per-invocation application context.

use tracing::debug;

use crate::api::ApiClient;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::network::{self, Connectivity};
use crate::services::session;
use crate::storage::LocalStore;

pub struct AppContext {
    pub config: Config,
    pub store: LocalStore,
    pub robot_mode: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        Self::new(config, cli.robot)
    }

    /// Open the configured store; retention runs once here.
    pub fn new(config: Config, robot_mode: bool) -> Result<Self> {
        let db_path = config.store.resolve_db_path()?;
        debug!(db_path = %db_path.display(), "opening local store");
        let store = LocalStore::open_with(&db_path, &config.store.open_options())?;
        Ok(Self {
            config,
            store,
            robot_mode,
        })
    }

    /// API client carrying the stored access token, if any.
    pub fn api(&self) -> Result<ApiClient> {
        let client = ApiClient::new(&self.config.api.base_url, self.config.api.timeout())?;
        Ok(client.with_token(session::stored_token(&self.store)?))
    }

    pub fn connectivity(&self, api: &ApiClient) -> Box<dyn Connectivity> {
        network::gate(
            self.config.network.mode,
            api.base_url(),
            self.config.network.probe_timeout(),
        )
    }
}
