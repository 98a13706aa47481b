use std::sync::Arc;

use crate::adapters::engine::{EngineSettings, GpgContextProvider};
use crate::config::app_config::AppConfig;
use crate::core::errors::Result;
use crate::core::models::keylist_mode::Protocol;
use crate::core::services::crypto_context::CryptoContext;
use crate::core::traits::engine::ContextProvider;

/// Everything a command needs to talk to the engine.
pub struct AppContext {
    pub provider: Arc<dyn ContextProvider>,
    /// Protocol selected with `--protocol`.
    pub protocol: Protocol,
}

impl AppContext {
    /// Build the GnuPG-backed context from the loaded configuration.
    pub fn from_config(config: &AppConfig, protocol: Protocol) -> Self {
        let engine = &config.engine;
        let settings = EngineSettings {
            gpg_path: engine.gpg_path.clone(),
            gpgsm_path: engine.gpgsm_path.clone(),
            homedir: engine.homedir.clone(),
            keyserver: engine.keyserver.clone(),
        };
        Self {
            provider: Arc::new(GpgContextProvider::new(settings)),
            protocol,
        }
    }

    /// Open an engine session for the selected protocol.
    pub fn open(&self) -> Result<CryptoContext> {
        CryptoContext::new(self.provider.as_ref(), self.protocol)
    }
}
