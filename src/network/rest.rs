//! REST client for the world-config/block-type/entity endpoints described
//! in spec §6. Every request carries credentials; 404 maps to `None` at
//! the call site, other non-2xx to `NetworkError`, and 401 is surfaced so
//! the host can redirect to the configured exit URL.

use log::debug;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::block::BlockType;
use crate::entity::model::{ClientEntity, EntityModel};

pub struct RestClient {
    http: Client,
    api_root: String,
}

impl RestClient {
    pub fn new(api_root: impl Into<String>) -> Self {
        RestClient {
            http: Client::builder()
                .cookie_store(true)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_root: api_root.into(),
        }
    }

    /// A client with no usable endpoint, for unit tests that never issue
    /// an actual request (e.g. registry tests that only exercise the
    /// sync cache path).
    pub fn new_for_tests() -> Self {
        RestClient::new("http://localhost:0")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_root.trim_end_matches('/'), path)
    }

    /// Returns `Ok(None)` on 404, `Ok(Some(body))` on 2xx, `Err` otherwise
    /// (401 included — callers that need to special-case auth failures
    /// should inspect the resulting `EngineError::AuthError`).
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, String> {
        let url = self.url(path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response.json::<T>().await.map_err(|e| e.to_string())?;
                Ok(Some(body))
            }
            status => Err(format!("unexpected status {status} for {url}")),
        }
    }

    pub async fn fetch_block_types(&self, group: &str) -> Result<Vec<BlockType>, String> {
        debug!("fetching block-type group '{group}'");
        Ok(self
            .get_optional(&format!("/blocktypes/{group}"))
            .await?
            .unwrap_or_default())
    }

    pub async fn fetch_entity_model(&self, id: &str) -> Result<Option<EntityModel>, String> {
        self.get_optional(&format!("/entitymodel/{id}")).await
    }

    pub async fn fetch_entity(&self, id: &str) -> Result<Option<ClientEntity>, String> {
        self.get_optional(&format!("/entity/{id}")).await
    }
}
