use async_trait::async_trait;
use derive_builder::Builder;
use dyn_clone::DynClone;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::SearchEngine;
use crate::{Error, Result};

/// Query of the term suggestion service, sent as URL parameters.
#[derive(Debug, Clone, Serialize, Builder)]
#[builder(setter(into))]
pub struct SuggestionRequest {
    #[serde(rename = "apikey", serialize_with = "serialize_secret")]
    pub api_key: SecretString,
    /// Title of the content the comment is written for.
    pub keyword: String,
    #[serde(rename = "searchengine")]
    #[builder(default)]
    pub search_engine: SearchEngine,
    /// Canonical URL of the content.
    pub url: String,
}

fn serialize_secret<S: Serializer>(
    secret: &SecretString,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestionResponse {
    #[serde(default, deserialize_with = "deserialize_term_suggestions")]
    pub termsuggestions: Option<TermSuggestions>,
}

impl SuggestionResponse {
    /// Returns the suggestions, or an upstream error when the service sent none.
    pub fn into_terms(self) -> Result<TermSuggestions> {
        self.termsuggestions
            .ok_or_else(|| Error::UpstreamError("response has no termsuggestions".to_string()))
    }
}

/// Terms suggested for a keyword.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermSuggestions {
    /// High confidence terms, most relevant first.
    #[serde(default, deserialize_with = "deserialize_terms")]
    pub ok: Vec<String>,
    /// Secondary terms in no particular order.
    #[serde(default, deserialize_with = "deserialize_terms")]
    pub more: Vec<String>,
}

impl TermSuggestions {
    pub fn is_empty(&self) -> bool {
        self.ok.is_empty() && self.more.is_empty()
    }
}

// `null`, `[]` and `{}` all mean "no suggestions".
fn deserialize_term_suggestions<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<TermSuggestions>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Array(items)) if items.is_empty() => Ok(None),
        Some(serde_json::Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value) => TermSuggestions::deserialize(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

// Accepts strings and numbers; anything else in the list is skipped.
fn deserialize_terms<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}

#[async_trait]
pub trait TermSuggestionProvider: DynClone + std::fmt::Debug + Send + Sync {
    async fn term_suggestions(&self, request: &SuggestionRequest) -> Result<SuggestionResponse>;
}

dyn_clone::clone_trait_object!(TermSuggestionProvider);
