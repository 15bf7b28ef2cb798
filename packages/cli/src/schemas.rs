//! Schema loading over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use pig::{ItemKind, SchemaError, SchemaLoader};
use serde_json::Value;

/// Fetches `{base}/{schema-name}.json`, e.g.
/// `https://schemas.example.org/pig/entity-class.json`.
pub struct HttpSchemaLoader {
    base: String,
    client: reqwest::Client,
}

impl HttpSchemaLoader {
    pub fn new(base: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn url_for(&self, kind: ItemKind) -> String {
        format!("{}/{}.json", self.base, kind.schema_name())
    }
}

#[async_trait]
impl SchemaLoader for HttpSchemaLoader {
    async fn load(&self, kind: ItemKind) -> Result<Value, SchemaError> {
        let url = self.url_for(kind);
        tracing::debug!(%url, "fetching schema");
        let load_error = |e: reqwest::Error| SchemaError::Load {
            kind,
            reason: format!("{url}: {e}"),
        };
        self.client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(load_error)?
            .json::<Value>()
            .await
            .map_err(load_error)
    }
}
