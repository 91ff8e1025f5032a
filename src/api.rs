//! Client for the dish REST api.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;

use crate::config::DashboardConfig;
use crate::data::Dish;

/// Something that can list dishes and flip their publish flag.
#[async_trait]
pub trait DishSource: Send + Sync + 'static {
    async fn list_dishes(&self) -> anyhow::Result<Vec<Dish>>;

    async fn toggle_dish(&self, id: &str) -> anyhow::Result<()>;
}

pub struct HttpDishApi {
    client: Client,
    config: DashboardConfig,
}

impl HttpDishApi {
    pub fn new(config: DashboardConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("fail to create http client")?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }
}

#[async_trait]
impl DishSource for HttpDishApi {
    async fn list_dishes(&self) -> anyhow::Result<Vec<Dish>> {
        let url = self.config.endpoint(&["api", "dishes"])?;
        tracing::debug!("GET {url}");

        let dishes = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .with_context(|| format!("fail to request {url}"))?
            .json::<Vec<Dish>>()
            .await
            .with_context(|| format!("fail to parse dishes from {url}"))?;

        Ok(dishes)
    }

    async fn toggle_dish(&self, id: &str) -> anyhow::Result<()> {
        let url = self.config.endpoint(&["api", "dishes", id, "toggle"])?;
        tracing::debug!("PATCH {url}");

        self.client
            .patch(url.clone())
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .with_context(|| format!("fail to toggle dish {id} via {url}"))?;

        Ok(())
    }
}
