//! Placeholder token allocation.
//!
//! Tokens have the form `[<session-key>-<n>]`. The session key is a fresh
//! random UUID per document, so a token cannot occur in natural content
//! unless that content was produced by the same session.

use uuid::Uuid;

/// Generator of placeholder tokens for a single document.
#[derive(Debug, Clone)]
pub struct PlaceholderAllocator {
    session_key: String,
    next: usize,
}

impl PlaceholderAllocator {
    /// Start a new session with a random key.
    #[must_use]
    pub fn new_session() -> Self {
        Self::with_key(Uuid::new_v4().to_string())
    }

    /// Start a session with a fixed key.
    ///
    /// Mostly useful for deterministic tests; production code should use
    /// [`PlaceholderAllocator::new_session`].
    #[must_use]
    pub fn with_key(session_key: impl Into<String>) -> Self {
        Self {
            session_key: session_key.into(),
            next: 0,
        }
    }

    /// Mint the next placeholder token.
    pub fn next_token(&mut self) -> String {
        let token = format!("[{}-{}]", self.session_key, self.next);
        self.next += 1;
        token
    }

    /// The random component shared by every token of this session.
    #[must_use]
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// Number of tokens minted so far.
    #[must_use]
    pub fn issued(&self) -> usize {
        self.next
    }

    /// Prefix shared by every token of this session (`[<session-key>-`).
    #[must_use]
    pub fn token_prefix(&self) -> String {
        format!("[{}-", self.session_key)
    }
}
