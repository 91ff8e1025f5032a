use std::time::Duration;

use anyhow::{bail, Context};
use derive_builder::Builder;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const BASE_URL_ENV: &str = "DISH_DASHBOARD_URL";
const TIMEOUT_ENV: &str = "DISH_DASHBOARD_TIMEOUT_SECS";

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base url is valid")
}

/// Where the backend lives and how long to wait for it. Both the REST api and
/// the Socket.IO channel hang off the same base url.
#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct DashboardConfig {
    #[builder(default = "default_base_url()")]
    pub base_url: Url,
    #[builder(default = "Duration::from_secs(DEFAULT_TIMEOUT_SECS)")]
    pub request_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl DashboardConfig {
    /// Read the config from the process environment. Call `dotenvy::dotenv()`
    /// first if a `.env` file should be honoured.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut builder = DashboardConfigBuilder::default();

        if let Some(raw) = lookup(BASE_URL_ENV) {
            let url = Url::parse(raw.trim())
                .with_context(|| format!("fail to parse {BASE_URL_ENV}={raw}"))?;
            builder.base_url(url);
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("fail to parse {TIMEOUT_ENV}={raw}"))?;
            if secs == 0 {
                bail!("fail to parse {TIMEOUT_ENV}={raw}: timeout must be at least 1 second");
            }
            builder.request_timeout(Duration::from_secs(secs));
        }

        Ok(builder.build()?)
    }

    /// Build an endpoint url below the base url, e.g. `["api", "dishes"]`.
    /// Segments are percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("base url {} can not carry a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
