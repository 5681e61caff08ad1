//! [`Transport`] over the `opensearch` client.

use crate::{
    config::SearchConfig,
    error::{Result, SearchError},
    transport::{RawHit, RawSearchResponse, SearchRequest, Transport},
};
use async_trait::async_trait;
use opensearch::{
    OpenSearch,
    http::{
        StatusCode,
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
};
use quarry_log::{debug, info};
use serde_json::{Value, json};
use std::sync::Arc;

/// Engine connection backed by the `opensearch` crate.
#[derive(Clone)]
pub struct OpenSearchTransport {
    client: Arc<OpenSearch>,
}

impl OpenSearchTransport {
    /// Connect to the first configured host.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        info!("Initializing search transport for: {:?}", config.urls);

        let url = opensearch::http::Url::parse(config.primary_url()?)
            .map_err(|e| SearchError::Config(format!("Invalid URL: {}", e)))?;

        let conn_pool = SingleNodeConnectionPool::new(url);
        let mut builder = TransportBuilder::new(conn_pool)
            .timeout(config.request_timeout)
            .disable_proxy();

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.auth(opensearch::auth::Credentials::Basic(
                user.clone(),
                pass.clone(),
            ));
        }

        let transport = builder
            .build()
            .map_err(|e| SearchError::Config(e.to_string()))?;

        debug!("Search transport initialized");

        Ok(Self {
            client: Arc::new(OpenSearch::new(transport)),
        })
    }

    /// Wrap an existing client.
    pub fn from_client(client: OpenSearch) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// The underlying client.
    pub fn inner(&self) -> &OpenSearch {
        &self.client
    }
}

// The engine reports `error` either as a plain string or as an object with a
// `reason`.
fn error_reason(body: &Value) -> String {
    match body.get("error") {
        Some(Value::String(reason)) => reason.clone(),
        Some(error) => error
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string(),
        None => "Unknown error".to_string(),
    }
}

async fn failure(response: Response) -> SearchError {
    let status = response.status_code().as_u16();
    let reason = match response.json::<Value>().await {
        Ok(body) => error_reason(&body),
        Err(e) => e.to_string(),
    };
    SearchError::transport(status, reason)
}

async fn hits(response: Response) -> Result<RawSearchResponse> {
    if !response.status_code().is_success() {
        return Err(failure(response).await);
    }
    Ok(response.json::<RawSearchResponse>().await?)
}

#[async_trait]
impl Transport for OpenSearchTransport {
    async fn search(&self, request: &SearchRequest) -> Result<RawSearchResponse> {
        let indices: Vec<&str> = request.indices.iter().map(String::as_str).collect();

        let response = self
            .client
            .search(opensearch::SearchParts::Index(&indices))
            .body(request.to_body())
            .send()
            .await?;

        hits(response).await
    }

    async fn open_scroll(
        &self,
        request: &SearchRequest,
        keep_alive: &str,
    ) -> Result<RawSearchResponse> {
        let indices: Vec<&str> = request.indices.iter().map(String::as_str).collect();

        let response = self
            .client
            .search(opensearch::SearchParts::Index(&indices))
            .scroll(keep_alive)
            .body(request.to_body())
            .send()
            .await?;

        hits(response).await
    }

    async fn scroll(&self, scroll_id: &str, keep_alive: &str) -> Result<RawSearchResponse> {
        let response = self
            .client
            .scroll(opensearch::ScrollParts::None)
            .body(json!({ "scroll": keep_alive, "scroll_id": scroll_id }))
            .send()
            .await?;

        let batch = hits(response).await?;
        if batch.hit_count() == 0 {
            return Err(SearchError::ScrollExhausted);
        }
        Ok(batch)
    }

    async fn clear_scroll(&self, scroll_id: &str) -> Result<()> {
        debug!("Clearing scroll {}", scroll_id);

        let response = self
            .client
            .clear_scroll(opensearch::ClearScrollParts::None)
            .body(json!({ "scroll_id": [scroll_id] }))
            .send()
            .await?;

        // Clearing an already expired cursor answers 404.
        let status = response.status_code();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(failure(response).await);
        }
        Ok(())
    }

    async fn get(&self, index: &str, _doc_type: &str, id: &str) -> Result<Option<RawHit>> {
        let response = self
            .client
            .get(opensearch::GetParts::IndexId(index, id))
            .send()
            .await?;

        let status = response.status_code();
        if status == StatusCode::NOT_FOUND {
            let body: Value = response.json().await?;
            if body.get("found").is_some() {
                return Ok(None);
            }
            return Err(SearchError::IndexNotFound(index.to_string()));
        }

        if !status.is_success() {
            return Err(failure(response).await);
        }

        Ok(Some(response.json::<RawHit>().await?))
    }

    async fn index(&self, index: &str, _doc_type: &str, id: &str, body: Value) -> Result<()> {
        let response = self
            .client
            .index(opensearch::IndexParts::IndexId(index, id))
            .body(body)
            .send()
            .await?;

        if !response.status_code().is_success() {
            return Err(failure(response).await);
        }
        Ok(())
    }

    async fn update(&self, index: &str, _doc_type: &str, id: &str, partial: Value) -> Result<()> {
        let response = self
            .client
            .update(opensearch::UpdateParts::IndexId(index, id))
            .body(json!({ "doc": partial }))
            .send()
            .await?;

        let status = response.status_code();
        if status == StatusCode::NOT_FOUND {
            return Err(SearchError::DocumentNotFound {
                index: index.to_string(),
                id: id.to_string(),
            });
        }

        if !status.is_success() {
            return Err(failure(response).await);
        }
        Ok(())
    }

    async fn delete(&self, index: &str, _doc_type: &str, id: &str) -> Result<bool> {
        let response = self
            .client
            .delete(opensearch::DeleteParts::IndexId(index, id))
            .send()
            .await?;

        let status = response.status_code();
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }

        if !status.is_success() {
            return Err(failure(response).await);
        }
        Ok(true)
    }

    async fn create_index(&self, name: &str, body: Value) -> Result<()> {
        let response = self
            .client
            .indices()
            .create(opensearch::indices::IndicesCreateParts::Index(name))
            .body(body)
            .send()
            .await?;

        let status = response.status_code();
        if status.is_success() {
            return Ok(());
        }

        let body: Value = response.json().await?;
        if body["error"]["type"].as_str() == Some("resource_already_exists_exception") {
            return Err(SearchError::IndexExists(name.to_string()));
        }
        Err(SearchError::transport(status.as_u16(), error_reason(&body)))
    }

    async fn delete_index(&self, names: &[String]) -> Result<()> {
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();

        let response = self
            .client
            .indices()
            .delete(opensearch::indices::IndicesDeleteParts::Index(&refs))
            .send()
            .await?;

        let status = response.status_code();
        if status == StatusCode::NOT_FOUND {
            return Err(SearchError::IndexNotFound(names.join(",")));
        }

        if !status.is_success() {
            return Err(failure(response).await);
        }
        Ok(())
    }

    async fn index_exists(&self, name: &str) -> Result<bool> {
        let response = self
            .client
            .indices()
            .exists(opensearch::indices::IndicesExistsParts::Index(&[name]))
            .send()
            .await?;

        // HEAD answers carry no body to read a reason from.
        let status = response.status_code();
        match status {
            StatusCode::NOT_FOUND => Ok(false),
            _ if status.is_success() => Ok(true),
            _ => Err(SearchError::transport(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error"),
            )),
        }
    }

    async fn ping(&self) -> Result<bool> {
        let response = self.client.ping().send().await?;
        Ok(response.status_code().is_success())
    }
}
