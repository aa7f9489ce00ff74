//! Greeting collaborator boundary.
//!
//! The terminal scene shows a short generated message. Generation lives
//! outside this crate (network client, script, whatever the host wires
//! up); the core only defines the interface and guarantees a deterministic
//! fallback, so a failed or absent generator can never reach the overlay.

use thiserror::Error;

/// The fixed pair substituted whenever generation fails.
pub const FALLBACK_MESSAGE: &str =
    "Seventeen orbits complete. May every dimension ahead unfold in your favour.";
pub const FALLBACK_AUTHOR: &str = "CORE_PROTOCOL";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Greeting {
    pub message: String,
    pub author: String,
}

impl Greeting {
    pub fn fallback() -> Self {
        Self {
            message: FALLBACK_MESSAGE.to_string(),
            author: FALLBACK_AUTHOR.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GreetingError {
    #[error(transparent)]
    Request(#[from] anyhow::Error),
    #[error("greeting response malformed: {0}")]
    Malformed(String),
}

/// A source of generated greetings keyed by the subject's name.
pub trait GreetingSource {
    fn generate(&self, subject: &str) -> Result<Greeting, GreetingError>;
}

/// Offline source returning a canned greeting; used when no generator is
/// configured and in tests.
pub struct FixedGreeting(pub Greeting);

impl GreetingSource for FixedGreeting {
    fn generate(&self, _subject: &str) -> Result<Greeting, GreetingError> {
        Ok(self.0.clone())
    }
}

/// Ask `source` for a greeting, substituting the fallback pair on any
/// error. Never panics, never returns empty fields.
pub fn fetch_or_fallback(source: &dyn GreetingSource, subject: &str) -> Greeting {
    match source.generate(subject) {
        Ok(g) if !g.message.is_empty() && !g.author.is_empty() => g,
        Ok(_) => {
            log::warn!("greeting source returned empty fields, using fallback");
            Greeting::fallback()
        }
        Err(e) => {
            log::warn!("greeting generation failed ({e}), using fallback");
            Greeting::fallback()
        }
    }
}
