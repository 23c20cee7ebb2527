use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use dyn_clone::DynClone;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::{Error, Result};

/// Timeout applied to every outbound call unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// An outbound HTTP call, independent of the client that performs it.
#[derive(Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub timeout: Duration,
}

impl TransportRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn query<T: Serialize>(mut self, params: &T) -> Result<Self> {
        let value = serde_json::to_value(params)?;
        let serde_json::Value::Object(map) = value else {
            return Err(Error::UpstreamError(
                "query parameters must serialize to an object".to_string(),
            ));
        };
        for (name, value) in map {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => continue,
                other => other.to_string(),
            };
            self.query.push((name, value));
        }
        Ok(self)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Adds an `Authorization: Bearer` header, marked sensitive.
    pub fn bearer_auth(self, token: &str) -> Result<Self> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
            Error::InvalidHeaderValue(reqwest::header::AUTHORIZATION.to_string(), e)
        })?;
        value.set_sensitive(true);
        Ok(self.header(reqwest::header::AUTHORIZATION, value))
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_string(body)?);
        Ok(self.header(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

// Query values carry API keys, so only their names are printed.
impl fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query: Vec<&str> = self.query.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("TransportRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &query)
            .field("headers", &self.headers)
            .field("body_len", &self.body.as_ref().map(String::len))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Performs outbound calls and returns the raw response body.
///
/// Implementations must fail on transport errors and non-2xx statuses.
#[async_trait]
pub trait Transport: DynClone + fmt::Debug + Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<String>;
}

dyn_clone::clone_trait_object!(Transport);

/// [`Transport`] backed by [`reqwest`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<String> {
        let TransportRequest {
            method,
            url,
            query,
            headers,
            body,
            timeout,
        } = request;

        let mut builder = match method {
            Method::Get => self.http_client.get(&url),
            Method::Post => self.http_client.post(&url),
        }
        .headers(headers)
        .timeout(timeout);

        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(%url, status = status.as_u16(), %body, "upstream returned an error status");
            return Err(Error::UnexpectedStatus {
                url,
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}
