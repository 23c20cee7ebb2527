//! The trigger surface: one action taking the form fields posted by the
//! comment form and answering with a success or failure envelope.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::completions::CompletionChoice;
use crate::content::ContentId;
use crate::orchestrator::{CommentOrchestrator, GenerateCommentRequest};
use crate::permission::Viewer;
use crate::Result;

pub const SUCCESS_MESSAGE: &str = "Comment generated.";
pub const FAILURE_MESSAGE: &str = "Something went wrong.";

/// Form fields posted by the generate button.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Identifier of the post being commented on, as posted.
    #[serde(default)]
    pub post_id: String,
    /// Anti-forgery token.
    #[serde(default)]
    pub security: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub ok: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<CompletionChoice>>,
}

impl ActionResponse {
    pub fn success(comment: String, choices: Vec<CompletionChoice>) -> Self {
        Self {
            ok: true,
            message: SUCCESS_MESSAGE.to_string(),
            comment: Some(comment),
            choices: Some(choices),
        }
    }

    pub fn failure() -> Self {
        Self {
            ok: false,
            message: FAILURE_MESSAGE.to_string(),
            comment: None,
            choices: None,
        }
    }
}

/// Runs one generation for `viewer` and shapes the outcome into an envelope.
///
/// Every error becomes the same generic failure; the cause is only logged.
pub async fn handle_generate_action(
    orchestrator: &CommentOrchestrator,
    viewer: &Viewer,
    request: ActionRequest,
    cancellation_token: Option<CancellationToken>,
) -> ActionResponse {
    match generate(orchestrator, viewer, request, cancellation_token).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(kind = %e.kind(), error = %e, "comment generation failed");
            ActionResponse::failure()
        }
    }
}

async fn generate(
    orchestrator: &CommentOrchestrator,
    viewer: &Viewer,
    request: ActionRequest,
    cancellation_token: Option<CancellationToken>,
) -> Result<ActionResponse> {
    let content_id = match request.post_id.parse::<ContentId>() {
        Ok(content_id) => content_id,
        Err(e) => {
            orchestrator.authorize(viewer, &request.security)?;
            return Err(e);
        }
    };
    let request = GenerateCommentRequest {
        content_id,
        viewer: viewer.clone(),
        token: request.security,
        cancellation_token,
    };

    let comment = orchestrator.generate_comment(&request).await?;
    tracing::info!(%content_id, terms = comment.terms.len(), "comment generated");

    Ok(ActionResponse::success(comment.text, comment.choices))
}
