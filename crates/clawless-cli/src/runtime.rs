//! Process wiring: config, roots, store, tools and the bot service.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use clawless_agent::{build_tools, Agent, ToolRegistry};
use clawless_core::config::{get_config_path, Config};
use clawless_core::paths::{PathRoots, PathSandbox};
use clawless_core::router::Router;
use clawless_core::session::{SessionState, TrackManager};
use clawless_core::store::Store;
use clawless_cron::JobStore;
use clawless_providers::create_provider;

use crate::service::BotService;

/// Everything opened from the config before a command runs.
pub struct Runtime {
    pub config: Config,
    pub store: Arc<Store>,
    pub sandbox: Arc<PathSandbox>,
}

impl Runtime {
    /// Create the roots and open the database.
    pub fn from_config(config: Config) -> Result<Self> {
        config
            .paths
            .ensure()
            .context("failed to create path roots")?;
        let roots = PathRoots::from_config(&config.paths)?;
        let db_path = config.paths.database_path();
        let store = Store::open(&db_path)
            .with_context(|| format!("failed to open database {}", db_path.display()))?;
        info!(db = %db_path.display(), "runtime ready");

        Ok(Self {
            config,
            store: Arc::new(store),
            sandbox: Arc::new(PathSandbox::new(roots)),
        })
    }

    pub fn tracks(&self) -> TrackManager {
        TrackManager::new(self.store.clone())
    }

    pub fn jobs(&self) -> JobStore {
        JobStore::new(self.store.clone())
    }

    pub async fn tools(&self) -> ToolRegistry {
        build_tools(self.sandbox.clone(), &self.config).await
    }

    /// Build the agent and the service around it. Needs a configured LLM.
    pub async fn bot_service(&self) -> Result<BotService> {
        let llm = create_provider(&self.config.llm).with_context(|| {
            format!(
                "Config path: {}",
                get_config_path(Some(self.config.paths.config_root().as_path())).display()
            )
        })?;
        let tools = Arc::new(self.tools().await);
        let agent = Agent::new(Arc::new(llm), tools).with_auditor(self.store.clone());
        let state = SessionState::restore(&self.store)?;

        Ok(BotService::new(
            agent,
            self.tracks(),
            Router::new()?,
            state,
            &self.config.agent,
        ))
    }
}
