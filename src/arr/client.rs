//! Low-level JSON client shared by the Radarr and Sonarr APIs

use std::time::{Duration, Instant};

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::error::{ArrError, ArrResult};
use super::Service;
use crate::config::ServiceConfig;
use crate::http_logger::{self, HttpTrace};

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum error body kept in error messages
const MAX_ERROR_BODY: usize = 500;

/// Query parameters as owned pairs
pub type Query = Vec<(&'static str, String)>;

#[derive(Debug, Clone)]
pub struct ArrClient {
    service: Service,
    api_root: String,
    api_key: String,
    http: Client,
}

impl ArrClient {
    pub fn new(service: Service, config: &ServiceConfig, http: Client) -> Self {
        Self {
            service,
            api_root: config.api_root(),
            api_key: config.api_key.trim().to_string(),
            http,
        }
    }

    /// Build a client with its own connection pool and the default timeout
    pub fn from_config(service: Service, config: &ServiceConfig) -> ArrResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|source| ArrError::Request { service, source })?;
        Ok(Self::new(service, config, http))
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: Query) -> ArrResult<T> {
        let value = self.send(Method::GET, path, query, None).await?;
        self.decode(value)
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ArrResult<T> {
        let body = self.encode(body)?;
        let value = self.send(Method::POST, path, Vec::new(), Some(body)).await?;
        self.decode(value)
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ArrResult<T> {
        let body = self.encode(body)?;
        let value = self.send(Method::PUT, path, Vec::new(), Some(body)).await?;
        self.decode(value)
    }

    pub async fn delete(&self, path: &str, query: Query) -> ArrResult<()> {
        self.send(Method::DELETE, path, query, None).await?;
        Ok(())
    }

    fn encode<B: Serialize>(&self, body: &B) -> ArrResult<Value> {
        serde_json::to_value(body).map_err(|source| ArrError::Encode {
            service: self.service,
            source,
        })
    }

    fn decode<T: DeserializeOwned>(&self, value: Value) -> ArrResult<T> {
        serde_json::from_value(value).map_err(|source| ArrError::Decode {
            service: self.service,
            source,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_root, path.trim_start_matches('/'))
    }

    /// Perform one request; an empty success body decodes as `null`
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Query,
        body: Option<Value>,
    ) -> ArrResult<Value> {
        if self.api_key.is_empty() {
            return Err(ArrError::NotConfigured(self.service));
        }

        let service = self.service;
        let mut builder = self
            .http
            .request(method.clone(), self.url(path))
            .header("X-Api-Key", &self.api_key)
            .header("Accept", "application/json");
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }
        let request = builder
            .build()
            .map_err(|source| ArrError::Request { service, source })?;

        let url = request.url().to_string();
        let body_text = body.as_ref().map(|b| b.to_string());
        let trace = HttpTrace::start(method.as_str(), &url, &self.api_key, body_text.as_deref());

        debug!("{} {} {}", service, method, url);
        let start_time = Instant::now();
        let response = self.http.execute(request).await;
        let duration_ms = start_time.elapsed().as_millis() as u64;

        let response = match response {
            Ok(resp) => resp,
            Err(source) => {
                if let Some(trace) = trace {
                    trace.failed(&source.to_string(), duration_ms);
                }
                return Err(ArrError::Request { service, source });
            }
        };

        let status = response.status();
        let response_headers = trace
            .as_ref()
            .map(|_| http_logger::response_headers(&response));
        let text = response
            .text()
            .await
            .map_err(|source| ArrError::Request { service, source })?;

        if let (Some(trace), Some(headers)) = (trace, response_headers) {
            trace.finished(status.as_u16(), headers, &text, duration_ms);
        }

        info!(
            "{} {} {} -> {} in {}ms",
            service,
            method,
            path,
            status.as_u16(),
            duration_ms
        );

        if !status.is_success() {
            let body = http_logger::truncate_utf8_safe(text.trim(), MAX_ERROR_BODY);
            return Err(ArrError::from_status(service, status.as_u16(), path, body));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|source| ArrError::Decode { service, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let cfg = ServiceConfig::new("key", "http://localhost:7878/");
        let client = ArrClient::new(Service::Radarr, &cfg, Client::new());
        assert_eq!(client.url("/movie"), "http://localhost:7878/api/v3/movie");
        assert_eq!(client.url("movie/5"), "http://localhost:7878/api/v3/movie/5");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let cfg = ServiceConfig::new("  ", "http://127.0.0.1:1");
        let client = ArrClient::new(Service::Sonarr, &cfg, Client::new());
        let err = client.get::<Value>("series", Vec::new()).await.unwrap_err();
        assert!(matches!(err, ArrError::NotConfigured(Service::Sonarr)));
        assert_eq!(err.to_string(), "Sonarr API key is not configured");
    }

    #[tokio::test]
    async fn test_unserializable_body_is_encode_error() {
        let cfg = ServiceConfig::new("key", "http://127.0.0.1:1");
        let client = ArrClient::new(Service::Radarr, &cfg, Client::new());
        // JSON object keys must be strings
        let body: std::collections::HashMap<(u8, u8), u8> = [((1, 2), 3)].into_iter().collect();
        let err = client.post::<Value, _>("movie", &body).await.unwrap_err();
        assert!(matches!(err, ArrError::Encode { service: Service::Radarr, .. }));
        assert!(err.to_string().starts_with("Failed to build Radarr request body"));
    }
}
