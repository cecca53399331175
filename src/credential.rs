//! The API credential for one session.
//!
//! A [`Credential`] holds exactly one key. It is seeded from the environment,
//! can be overwritten or cleared by the user, and falls back to the
//! environment when the held value is empty. Nothing is persisted.

use std::fmt;

/// Environment variable the credential is seeded from and falls back to.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Session-scoped API key.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    held: String,
    env_fallback: Option<&'static str>,
}

impl Credential {
    /// Seed from `OPENAI_API_KEY` (empty if unset) and keep the env fallback.
    pub fn from_env() -> Self {
        Self {
            held: std::env::var(API_KEY_ENV).unwrap_or_default(),
            env_fallback: Some(API_KEY_ENV),
        }
    }

    /// A credential that only ever resolves to `key`; no env fallback.
    pub fn explicit(key: impl Into<String>) -> Self {
        Self {
            held: key.into(),
            env_fallback: None,
        }
    }

    /// An unconfigured credential with no env fallback.
    pub fn none() -> Self {
        Self::default()
    }

    /// Overwrite the held value.
    pub fn set(&mut self, key: impl Into<String>) {
        self.held = key.into();
    }

    /// Reset the held value to empty. The env fallback, if any, stays.
    pub fn clear(&mut self) {
        self.held.clear();
    }

    /// Whether a key was stored in the session itself.
    pub fn is_held(&self) -> bool {
        !self.held.trim().is_empty()
    }

    /// Resolve to the held value, else the env var, else `None`.
    pub fn resolve(&self) -> Option<String> {
        if self.is_held() {
            return Some(self.held.clone());
        }
        self.env_fallback
            .and_then(|name| std::env::var(name).ok())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn is_configured(&self) -> bool {
        self.resolve().is_some()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("held", &if self.is_held() { "<redacted>" } else { "<empty>" })
            .field("env_fallback", &self.env_fallback)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_unconfigured() {
        let c = Credential::none();
        assert!(c.resolve().is_none());
        assert!(!c.is_configured());
    }

    #[test]
    fn set_overwrites_and_clear_resets() {
        let mut c = Credential::none();
        c.set("sk-one");
        assert_eq!(c.resolve().as_deref(), Some("sk-one"));
        c.set("sk-two");
        assert_eq!(c.resolve().as_deref(), Some("sk-two"));
        c.clear();
        assert!(c.resolve().is_none());
    }

    #[test]
    fn whitespace_only_key_counts_as_empty() {
        let c = Credential::explicit("   ");
        assert!(!c.is_held());
        assert!(c.resolve().is_none());
    }

    #[test]
    fn debug_redacts_value() {
        let c = Credential::explicit("sk-very-secret");
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-very-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
