use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::filter::Filter;
use crate::store::{Collection, DocumentStore, StoreError, StoreResult};

/// Document store backed by a PostgREST endpoint (`/rest/v1/<collection>`).
#[cfg_attr(test, derive(Debug))]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> StoreResult<Self> {
        if config.database_url.is_empty() {
            return Err(StoreError::Configuration("DATABASE_URL is empty".to_string()));
        }

        Ok(Self {
            client: Client::new(),
            base_url: config.database_url.trim_end_matches('/').to_string(),
            api_key: config.database_api_key.clone(),
        })
    }

    fn get_headers(&self, prefer: Option<&'static str>) -> StoreResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| StoreError::Configuration("database API key is not a valid header value".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| StoreError::Configuration("database API key is not a valid header value".to_string()))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(prefer) = prefer {
            headers.insert("Prefer", HeaderValue::from_static(prefer));
        }

        Ok(headers)
    }

    fn collection_path(collection: Collection, filter: Option<&Filter>) -> String {
        let query = filter.map(Filter::to_query_string).unwrap_or_default();
        if query.is_empty() {
            format!("/rest/v1/{}", collection.name())
        } else {
            format!("/rest/v1/{}?{}", collection.name(), query)
        }
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        prefer: Option<&'static str>,
    ) -> StoreResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut req = self.client.request(method, &url)
            .headers(self.get_headers(prefer)?);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await.map_err(|e| {
            error!("Store request to {} failed: {}", url, e);
            StoreError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Store error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::CONFLICT => StoreError::Conflict(error_text),
                _ => StoreError::Request {
                    status: status.as_u16(),
                    message: error_text,
                },
            });
        }

        let text = response.text().await?;
        // An empty body reads as an empty row set.
        let data = if text.trim().is_empty() {
            serde_json::from_str::<T>("[]")?
        } else {
            serde_json::from_str::<T>(&text)?
        };
        Ok(data)
    }
}

#[async_trait]
impl DocumentStore for SupabaseStore {
    async fn insert(&self, collection: Collection, document: Value) -> StoreResult<Value> {
        let path = Self::collection_path(collection, None);

        let mut result: Vec<Value> = self
            .request(Method::POST, &path, Some(document), Some("return=representation"))
            .await?;

        if result.is_empty() {
            return Err(StoreError::InvalidDocument(format!(
                "insert into {} returned no representation",
                collection.name()
            )));
        }

        Ok(result.swap_remove(0))
    }

    async fn find(&self, collection: Collection, filter: &Filter) -> StoreResult<Vec<Value>> {
        let path = Self::collection_path(collection, Some(filter));
        self.request(Method::GET, &path, None, None).await
    }

    async fn update(&self, collection: Collection, filter: &Filter, patch: Value) -> StoreResult<Vec<Value>> {
        let path = Self::collection_path(collection, Some(filter));
        self.request(Method::PATCH, &path, Some(patch), Some("return=representation"))
            .await
    }

    async fn delete(&self, collection: Collection, filter: &Filter) -> StoreResult<usize> {
        let path = Self::collection_path(collection, Some(filter));
        let deleted: Vec<Value> = self
            .request(Method::DELETE, &path, None, Some("return=representation"))
            .await?;
        Ok(deleted.len())
    }

    async fn ping(&self) -> StoreResult<()> {
        let filter = Filter::new().limit(1);
        let path = format!("{}&select=id", Self::collection_path(Collection::Users, Some(&filter)));
        let _: Vec<Value> = self.request(Method::GET, &path, None, None).await?;
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        // reqwest releases pooled connections when the client is dropped.
        info!("Closing REST document store at {}", self.base_url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> SupabaseStore {
        let config = AppConfig {
            database_url: server.uri(),
            database_api_key: "test-api-key".to_string(),
            ..AppConfig::default()
        };
        SupabaseStore::new(&config).unwrap()
    }

    #[test]
    fn new_requires_database_url() {
        let result = SupabaseStore::new(&AppConfig::default());
        assert_matches!(result, Err(StoreError::Configuration(_)));
    }

    #[tokio::test]
    async fn insert_posts_with_representation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/live_sessions"))
            .and(header("apikey", "test-api-key"))
            .and(header("Prefer", "return=representation"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": "s1" }])))
            .mount(&server)
            .await;

        let stored = store_for(&server)
            .insert(Collection::LiveSessions, json!({ "id": "s1" }))
            .await
            .unwrap();
        assert_eq!(stored["id"], "s1");
    }

    #[tokio::test]
    async fn find_sends_filter_as_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/live_sessions"))
            .and(query_param("doctor_id", "eq.doc1"))
            .and(query_param("order", "createdAt.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "s2" }, { "id": "s1" }])))
            .mount(&server)
            .await;

        let filter = Filter::new().eq("doctor_id", "doc1").newest_first();
        let found = store_for(&server).find(Collection::LiveSessions, &filter).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0]["id"], "s2");
    }

    #[tokio::test]
    async fn conflict_status_maps_to_conflict_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/users"))
            .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key value"))
            .mount(&server)
            .await;

        let result = store_for(&server)
            .insert(Collection::Users, json!({ "externalId": "ext_1" }))
            .await;
        assert_matches!(result, Err(StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn server_error_maps_to_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/vitals"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = store_for(&server).find(Collection::Vitals, &Filter::new()).await;
        assert_matches!(result, Err(StoreError::Request { status: 500, .. }));
    }

    #[tokio::test]
    async fn delete_counts_returned_rows() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/users"))
            .and(query_param("externalId", "eq.ext_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "u1" }])))
            .mount(&server)
            .await;

        let removed = store_for(&server)
            .delete(Collection::Users, &Filter::new().eq("externalId", "ext_1"))
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }
}
