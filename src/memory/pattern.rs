// src/memory/pattern.rs

use std::fmt;

use globset::{Glob, GlobMatcher};

use crate::errors::{FlowError, Result};

/// A key or glob pattern, anchored below a scope prefix.
///
/// Patterns are written relative to the view they were registered on: a
/// pattern `status` subscribed through `scoped("shared")` matches the stored
/// key `shared:status`.
#[derive(Clone)]
pub struct KeyPattern {
    prefix: String,
    source: String,
    matcher: Option<GlobMatcher>,
}

impl fmt::Debug for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPattern")
            .field("prefix", &self.prefix)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl KeyPattern {
    pub fn new(prefix: &str, pattern: &str) -> Result<Self> {
        let matcher = if is_glob(pattern) {
            let glob = Glob::new(pattern).map_err(|e| {
                FlowError::ConfigError(format!("invalid key pattern '{pattern}': {e}"))
            })?;
            Some(glob.compile_matcher())
        } else {
            None
        };

        Ok(Self {
            prefix: prefix.to_string(),
            source: pattern.to_string(),
            matcher,
        })
    }

    /// Pattern as written by the caller.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_glob(&self) -> bool {
        self.matcher.is_some()
    }

    /// Match a fully qualified key.
    pub fn matches(&self, full_key: &str) -> bool {
        match full_key.strip_prefix(self.prefix.as_str()) {
            Some(rest) => self.matches_relative(rest),
            None => false,
        }
    }

    /// Match a key already relative to this pattern's prefix.
    pub fn matches_relative(&self, key: &str) -> bool {
        match &self.matcher {
            Some(m) => m.is_match(key),
            None => key == self.source,
        }
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_patterns_match_exactly() {
        let p = KeyPattern::new("", "status").unwrap();
        assert!(!p.is_glob());
        assert!(p.matches("status"));
        assert!(!p.matches("status2"));
    }

    #[test]
    fn globs_are_anchored_below_the_prefix() {
        let p = KeyPattern::new("shared:", "agent_*").unwrap();
        assert!(p.is_glob());
        assert!(p.matches("shared:agent_1"));
        assert!(!p.matches("other:agent_1"));
        assert!(!p.matches("agent_1"));
    }

    #[test]
    fn star_crosses_namespace_separators() {
        let p = KeyPattern::new("", "results:*").unwrap();
        assert!(p.matches("results:a:b"));
    }

    #[test]
    fn invalid_globs_are_configuration_errors() {
        let err = KeyPattern::new("", "[oops").unwrap_err();
        assert!(err.is_configuration());
    }
}
