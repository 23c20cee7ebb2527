use std::future::Future;

use derive_builder::Builder;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::clients::{openai, seobility};
use crate::completions::{CompletionChoice, CompletionProvider, CompletionRequestBuilder};
use crate::config::{Config, ConfigStore};
use crate::content::{ContentId, ContentLookup};
use crate::permission::{Page, PermissionGate, Viewer};
use crate::selection::{build_prompt, select_terms};
use crate::suggestions::{SuggestionRequest, TermSuggestionProvider, TermSuggestions};
use crate::transport::Transport;
use crate::{Error, Result};

/// A trigger for one comment generation.
#[derive(Debug, Clone, Builder)]
#[builder(pattern = "mutable")]
#[builder(setter(into, strip_option))]
pub struct GenerateCommentRequest {
    pub content_id: ContentId,
    #[builder(default)]
    pub viewer: Viewer,
    /// Anti-forgery token sent with the trigger.
    #[builder(default)]
    pub token: String,
    /// Once cancelled, any result still in flight is discarded.
    #[builder(default = "None")]
    pub cancellation_token: Option<CancellationToken>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedComment {
    /// Text of the first completion choice.
    pub text: String,
    pub choices: Vec<CompletionChoice>,
    /// Suggested terms the prompt was built from.
    pub terms: Vec<String>,
    pub prompt: String,
}

/// Chains the term suggestion and text completion services into a comment.
///
/// Every collaborator is injected, so the orchestrator knows nothing about
/// where settings, content or sessions live.
#[derive(Debug, Clone)]
pub struct CommentOrchestrator {
    config_store: Box<dyn ConfigStore>,
    content_lookup: Box<dyn ContentLookup>,
    permission_gate: Box<dyn PermissionGate>,
    transport: Box<dyn Transport>,
    shuffle_seed: Option<u64>,
}

impl CommentOrchestrator {
    pub fn new(
        config_store: impl ConfigStore + 'static,
        content_lookup: impl ContentLookup + 'static,
        permission_gate: impl PermissionGate + 'static,
        transport: impl Transport + 'static,
    ) -> Self {
        Self {
            config_store: Box::new(config_store),
            content_lookup: Box::new(content_lookup),
            permission_gate: Box::new(permission_gate),
            transport: Box::new(transport),
            shuffle_seed: None,
        }
    }

    /// Makes the shuffle of secondary terms reproducible.
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// Whether the generate button should be rendered for this viewer and page.
    pub fn should_offer(&self, viewer: &Viewer, page: &Page) -> bool {
        match self.config_store.load() {
            Ok(config) if config.is_enabled() => self.permission_gate.is_visible(viewer, page),
            Ok(config) => {
                tracing::debug!(missing = config.missing_setting(), "comment generation disabled");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load configuration");
                false
            }
        }
    }

    /// Checks the first two preconditions of a generation: the feature is
    /// configured and the anti-forgery token is valid for `viewer`.
    pub fn authorize(&self, viewer: &Viewer, token: &str) -> Result<Config> {
        let config = self.config_store.load()?;
        config.ensure_enabled()?;

        if !self.permission_gate.verify_token(viewer, token) {
            return Err(Error::InvalidRequest);
        }
        Ok(config)
    }

    #[tracing::instrument(skip_all, fields(content_id = %request.content_id))]
    pub async fn generate_comment(
        &self,
        request: &GenerateCommentRequest,
    ) -> Result<GeneratedComment> {
        let cancellation_token = request.cancellation_token.as_ref();

        let config = self.authorize(&request.viewer, &request.token)?;

        let content = self
            .content_lookup
            .find(request.content_id)
            .ok_or_else(|| Error::not_found(request.content_id))?;

        let suggestions = seobility::Client::from_config(&config, self.transport.clone());
        let suggestion_request = SuggestionRequest {
            api_key: config.suggestion_api_key.clone(),
            keyword: content.title.clone(),
            search_engine: config.search_engine,
            url: content.permalink.clone(),
        };
        tracing::debug!(keyword = %content.title, "requesting term suggestions");
        let response = until_cancelled(
            cancellation_token,
            suggestions.term_suggestions(&suggestion_request),
        )
        .await?;

        let mut terms = response.into_terms()?;
        let selected = self.select(&mut terms, config.suggestion_count);
        if selected.is_empty() {
            return Err(Error::UpstreamError(
                "no usable term suggestions".to_string(),
            ));
        }

        let prompt = build_prompt(&config.output_prefix, &selected);
        tracing::debug!(%prompt, "requesting completion");

        let completion_request = CompletionRequestBuilder::default()
            .prompt(prompt.clone())
            .build()?;
        let completions = openai::Client::from_config(&config, self.transport.clone());
        let response =
            until_cancelled(cancellation_token, completions.complete(&completion_request)).await?;

        let (text, choices) = response.into_first_text()?;

        if cancellation_token.is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::Cancelled);
        }

        Ok(GeneratedComment {
            text,
            choices,
            terms: selected,
            prompt,
        })
    }

    fn select(&self, terms: &mut TermSuggestions, count: usize) -> Vec<String> {
        match self.shuffle_seed {
            Some(seed) => select_terms(terms, count, &mut StdRng::seed_from_u64(seed)),
            None => select_terms(terms, count, &mut rand::thread_rng()),
        }
    }
}

async fn until_cancelled<T, F>(
    cancellation_token: Option<&CancellationToken>,
    future: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(cancellation_token) = cancellation_token else {
        return future.await;
    };

    tokio::select! {
        biased;
        _ = cancellation_token.cancelled() => Err(Error::Cancelled),
        result = future => result,
    }
}
