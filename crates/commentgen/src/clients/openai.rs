use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::completions::{CompletionProvider, CompletionRequest, CompletionResponse};
use crate::config::Config;
use crate::transport::{Transport, TransportRequest};
use crate::utils::uri::normalize_endpoint;
use crate::Result;

/// Client of the legacy OpenAI text completions endpoint.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Box<dyn Transport>,
    endpoint: String,
    api_key: SecretString,
}

impl Client {
    pub fn new(transport: Box<dyn Transport>, api_key: SecretString, endpoint: &str) -> Self {
        Self {
            transport,
            endpoint: normalize_endpoint(endpoint),
            api_key,
        }
    }

    pub fn from_config(config: &Config, transport: Box<dyn Transport>) -> Self {
        Self::new(
            transport,
            config.completion_api_key.clone(),
            &config.completion_endpoint,
        )
    }
}

#[async_trait]
impl CompletionProvider for Client {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let outbound = TransportRequest::post(&self.endpoint)
            .json(request)?
            .bearer_auth(self.api_key.expose_secret())?;

        let body = self.transport.send(outbound).await?;
        let response = serde_json::from_str::<CompletionResponse>(&body)?;

        Ok(response)
    }
}
