use async_trait::async_trait;

use crate::config::Config;
use crate::suggestions::{SuggestionRequest, SuggestionResponse, TermSuggestionProvider};
use crate::transport::{Transport, TransportRequest};
use crate::utils::uri::normalize_endpoint;
use crate::Result;

/// Client of the Seobility term suggestion API.
///
/// The API key travels in the query string, as part of [`SuggestionRequest`].
#[derive(Debug, Clone)]
pub struct Client {
    transport: Box<dyn Transport>,
    endpoint: String,
}

impl Client {
    pub fn new(transport: Box<dyn Transport>, endpoint: &str) -> Self {
        Self {
            transport,
            endpoint: normalize_endpoint(endpoint),
        }
    }

    pub fn from_config(config: &Config, transport: Box<dyn Transport>) -> Self {
        Self::new(transport, &config.suggestion_endpoint)
    }
}

#[async_trait]
impl TermSuggestionProvider for Client {
    async fn term_suggestions(&self, request: &SuggestionRequest) -> Result<SuggestionResponse> {
        let outbound = TransportRequest::get(&self.endpoint).query(request)?;

        let body = self.transport.send(outbound).await?;
        let response = serde_json::from_str::<SuggestionResponse>(&body)?;

        Ok(response)
    }
}

#[cfg(test)]
mod test {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::config::SearchEngine;
    use crate::suggestions::SuggestionRequestBuilder;
    use crate::transport::HttpTransport;
    use crate::{Error, ErrorKind};

    fn request() -> SuggestionRequest {
        SuggestionRequestBuilder::default()
            .api_key("seo-key")
            .keyword("Cats and dogs")
            .search_engine(SearchEngine::GoogleEs)
            .url("https://blog.example/?p=12")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_term_suggestions() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/es/resellerapi/termsuggestion")
                    .query_param("apikey", "seo-key")
                    .query_param("keyword", "Cats and dogs")
                    .query_param("searchengine", "google.es")
                    .query_param("url", "https://blog.example/?p=12");
                then.status(200).json_body(json!({
                    "termsuggestions": {
                        "ok": ["pets", "cat food"],
                        "more": ["dog toys"]
                    }
                }));
            })
            .await;

        let client = Client::new(
            Box::new(HttpTransport::new()),
            &server.url("/es/resellerapi/termsuggestion/"),
        );
        let terms = client
            .term_suggestions(&request())
            .await
            .unwrap()
            .into_terms()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(terms.ok, vec!["pets", "cat food"]);
        assert_eq!(terms.more, vec!["dog toys"]);
    }

    #[tokio::test]
    async fn test_term_suggestions_server_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(500);
            })
            .await;

        let client = Client::new(Box::new(HttpTransport::new()), &server.base_url());
        let err = client.term_suggestions(&request()).await.unwrap_err();

        assert!(matches!(err, Error::UnexpectedStatus { status: 500, .. }));
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }
}
