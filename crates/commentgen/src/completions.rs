use async_trait::async_trait;
use derive_builder::Builder;
use dyn_clone::DynClone;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Builder, PartialEq)]
#[builder(pattern = "mutable")]
#[builder(setter(into))]
#[builder(derive(Debug))]
pub struct CompletionRequest {
    pub prompt: String,
    #[builder(default = "150")]
    pub max_tokens: u32,
    #[builder(default = "0.7")]
    pub temperature: f64,
    #[builder(default = "1.0")]
    pub top_p: f64,
    #[builder(default = "0.0")]
    pub frequency_penalty: f64,
    #[builder(default = "0.0")]
    pub presence_penalty: f64,
    #[builder(default = "1")]
    pub best_of: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// `None` when the field is missing or is not a list.
    #[serde(default, deserialize_with = "deserialize_choices")]
    pub choices: Option<Vec<CompletionChoice>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// Splits off the text of the first choice, keeping every choice.
    pub fn into_first_text(self) -> Result<(String, Vec<CompletionChoice>)> {
        match self.choices {
            Some(choices) if !choices.is_empty() => {
                let text = choices[0].text.clone();
                Ok((text, choices))
            }
            _ => Err(Error::UpstreamError(
                "completion response has no choices".to_string(),
            )),
        }
    }
}

fn deserialize_choices<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<CompletionChoice>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .map(CompletionChoice::deserialize)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[async_trait]
pub trait CompletionProvider: DynClone + std::fmt::Debug + Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;
}

dyn_clone::clone_trait_object!(CompletionProvider);
