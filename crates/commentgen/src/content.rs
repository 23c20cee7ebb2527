use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use derive_builder::Builder;
use dyn_clone::DynClone;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Identifier of a published content item (a blog post).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub u64);

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.parse::<u64>() {
            Ok(0) | Err(_) => Err(Error::NotFound(trimmed.to_string())),
            Ok(id) => Ok(ContentId(id)),
        }
    }
}

impl From<u64> for ContentId {
    fn from(id: u64) -> Self {
        ContentId(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
pub struct Content {
    pub id: ContentId,
    pub title: String,
    /// Canonical URL of the content.
    pub permalink: String,
}

/// Resolves a [`ContentId`] to the title and canonical URL of the content.
pub trait ContentLookup: DynClone + fmt::Debug + Send + Sync {
    fn find(&self, id: ContentId) -> Option<Content>;
}

dyn_clone::clone_trait_object!(ContentLookup);

#[derive(Debug, Clone, Default)]
pub struct InMemoryContentLookup {
    items: HashMap<ContentId, Content>,
}

impl InMemoryContentLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, content: Content) -> Option<Content> {
        self.items.insert(content.id, content)
    }

    pub fn with(mut self, content: Content) -> Self {
        self.insert(content);
        self
    }
}

impl ContentLookup for InMemoryContentLookup {
    fn find(&self, id: ContentId) -> Option<Content> {
        self.items.get(&id).cloned()
    }
}
