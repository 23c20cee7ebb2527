use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use dyn_clone::DynClone;
use rand::Rng;
use rand::distributions::Alphanumeric;
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::content::ContentId;

/// Length of tokens issued by [`SessionTokenGate`].
pub const TOKEN_LENGTH: usize = 10;

/// Whoever triggered the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    /// `None` for anonymous visitors.
    pub session_id: Option<String>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn logged_in(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.session_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Post,
    Page,
    Archive,
    Other,
}

/// The page the comment form is rendered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub kind: PageKind,
    pub content_id: Option<ContentId>,
}

impl Page {
    pub fn post(id: ContentId) -> Self {
        Self {
            kind: PageKind::Post,
            content_id: Some(id),
        }
    }

    /// A single post, as opposed to a listing or a static page.
    pub fn is_single_post(&self) -> bool {
        self.kind == PageKind::Post && self.content_id.is_some()
    }
}

/// Decides who may see and use the generate button.
pub trait PermissionGate: DynClone + fmt::Debug + Send + Sync {
    fn is_visible(&self, viewer: &Viewer, page: &Page) -> bool;

    /// Checks the anti-forgery token sent along with a trigger request.
    fn verify_token(&self, viewer: &Viewer, token: &str) -> bool;
}

dyn_clone::clone_trait_object!(PermissionGate);

/// Gate issuing one random token per logged in session.
///
/// The button is offered to logged in viewers on single posts only. Clones
/// share the same tokens, so a handle kept by the caller can issue and
/// revoke tokens after the gate is handed to an orchestrator.
#[derive(Debug, Clone, Default)]
pub struct SessionTokenGate {
    tokens: Arc<RwLock<HashMap<String, SecretString>>>,
}

impl SessionTokenGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session's token, minting one on first use.
    ///
    /// Anonymous viewers get `None`.
    pub fn issue(&self, viewer: &Viewer) -> Option<String> {
        let session_id = viewer.session_id.as_ref()?;
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        let token = tokens
            .entry(session_id.clone())
            .or_insert_with(|| SecretString::from(random_token()));
        Some(token.expose_secret().to_string())
    }

    pub fn revoke(&self, viewer: &Viewer) {
        if let Some(session_id) = &viewer.session_id {
            self.tokens
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(session_id);
        }
    }
}

fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

impl PermissionGate for SessionTokenGate {
    fn is_visible(&self, viewer: &Viewer, page: &Page) -> bool {
        viewer.is_logged_in() && page.is_single_post()
    }

    fn verify_token(&self, viewer: &Viewer, token: &str) -> bool {
        let Some(session_id) = &viewer.session_id else {
            return false;
        };
        if token.is_empty() {
            return false;
        }
        let tokens = self.tokens.read().unwrap_or_else(PoisonError::into_inner);
        match tokens.get(session_id) {
            Some(expected) => expected.expose_secret().as_bytes().ct_eq(token.as_bytes()).into(),
            None => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_visibility() {
        let gate = SessionTokenGate::new();
        let post = Page::post(ContentId(3));

        assert!(gate.is_visible(&Viewer::logged_in("s1"), &post));
        assert!(!gate.is_visible(&Viewer::anonymous(), &post));
        assert!(!gate.is_visible(
            &Viewer::logged_in("s1"),
            &Page {
                kind: PageKind::Archive,
                content_id: None
            }
        ));
        assert!(!gate.is_visible(
            &Viewer::logged_in("s1"),
            &Page {
                kind: PageKind::Page,
                content_id: Some(ContentId(3))
            }
        ));
    }

    #[test]
    fn test_issue_and_verify() {
        let gate = SessionTokenGate::new();
        let alice = Viewer::logged_in("alice");
        let bob = Viewer::logged_in("bob");

        let token = gate.issue(&alice).unwrap();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(gate.issue(&alice).unwrap(), token);

        assert!(gate.verify_token(&alice, &token));
        assert!(!gate.verify_token(&alice, "wrong-token"));
        assert!(!gate.verify_token(&alice, ""));
        assert!(!gate.verify_token(&bob, &token));
        assert!(!gate.verify_token(&Viewer::anonymous(), &token));

        gate.revoke(&alice);
        assert!(!gate.verify_token(&alice, &token));
    }

    #[test]
    fn test_clones_share_tokens() {
        let gate = SessionTokenGate::new();
        let handle = gate.clone();
        let carol = Viewer::logged_in("carol");

        let token = handle.issue(&carol).unwrap();
        assert!(gate.verify_token(&carol, &token));
        assert_eq!(gate.issue(&carol).unwrap(), token);

        // same length, one character off
        let mut forged = token.clone().into_bytes();
        forged[0] = if forged[0] == b'a' { b'b' } else { b'a' };
        let forged = String::from_utf8(forged).unwrap();
        assert!(!gate.verify_token(&carol, &forged));
        assert!(!gate.verify_token(&carol, &token[..TOKEN_LENGTH - 1]));

        gate.revoke(&carol);
        assert!(!handle.verify_token(&carol, &token));
    }

    #[test]
    fn test_anonymous_gets_no_token() {
        let gate = SessionTokenGate::new();
        assert!(gate.issue(&Viewer::anonymous()).is_none());
    }
}
