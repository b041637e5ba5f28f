//! # Application State
//!
//! Shared state passed to all HTTP handlers. Everything here is immutable
//! configuration or a cloneable client handle; requests share nothing
//! mutable.

use crate::{
    config::Config,
    credentials::KeySelector,
    error::RelayError,
    prompt::PromptBuilder,
    upstream::UpstreamClient,
};

#[derive(Clone)]
pub struct AppState {
    config: Config,
    keys: KeySelector,
    prompt: PromptBuilder,
    upstream: UpstreamClient,
}

impl AppState {
    /// Create new application state from configuration.
    pub fn new(config: Config) -> Result<Self, RelayError> {
        let keys = KeySelector::from_config(&config);
        let prompt = PromptBuilder::from_config(&config);
        let upstream = UpstreamClient::from_config(&config)?;

        Ok(Self {
            config,
            keys,
            prompt,
            upstream,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn keys(&self) -> &KeySelector {
        &self.keys
    }

    pub fn prompt(&self) -> &PromptBuilder {
        &self.prompt
    }

    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }
}
