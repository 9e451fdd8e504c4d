use std::time::Duration;

use oncall_core::{Config, ConfigError};

use crate::sources::{self, RotationSource};

pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.site.fetch_timeout_secs))
            .build()?;
        Ok(Self { config, http })
    }

    pub fn sources(&self) -> Result<Vec<RotationSource>, ConfigError> {
        sources::discover(&self.config)
    }
}
