//! Configuration constants and engine settings.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{CitationError, Result};

/// Number of recently mentioned laws kept for "同法" resolution.
pub const DEFAULT_RECENT_LAW_CAPACITY: usize = 10;

/// Citations below this confidence are offered to the verifier.
pub const DEFAULT_VERIFY_THRESHOLD: f64 = 0.5;

/// Upper bound for a single verifier call, in milliseconds.
pub const DEFAULT_VERIFIER_TIMEOUT_MS: u64 = 5_000;

/// Shortest query (in characters) allowed to use substring matching in the
/// law dictionary.
pub const DEFAULT_MIN_SUBSTRING_CHARS: usize = 2;

/// Widest range (in provisions) that is expanded; wider ranges are
/// treated as malformed.
pub const DEFAULT_MAX_RANGE_SPAN: usize = 1_000;

/// Longest law name the unknown-law heuristic will extract.
pub const MAX_LAW_NAME_CHARS: usize = 40;

/// Characters of surrounding text handed to the verifier on each side.
pub const VERIFIER_CONTEXT_CHARS: usize = 40;

/// Confidence values attached by the scorer.
pub mod confidence {
    /// Explicit article of the current law or of a law resolved by exact name.
    pub const DIRECT_PATTERN: f64 = 0.95;
    /// Law resolved through an alias, substring or law-level mention.
    pub const DICTIONARY: f64 = 0.9;
    /// One element of an expanded range.
    pub const RANGE_EXPANSION: f64 = 0.85;
    /// Self reference or preceding reference backed by tracked state.
    pub const CONTEXT_CERTAIN: f64 = 0.85;
    /// Reference resolved from memory, aliases or arithmetic.
    pub const CONTEXT_MEMORY: f64 = 0.8;
    /// Symbolic target such as "all preceding paragraphs".
    pub const CONTEXT_SYMBOLIC: f64 = 0.75;
    /// Relative paragraph that spilled over into the previous article.
    pub const CONTEXT_DEGRADED: f64 = 0.5;
    /// Law named explicitly but missing from the dictionary.
    pub const UNRESOLVED_IDENTITY: f64 = 0.2;
    /// Relative or contextual reference with no usable state.
    pub const UNRESOLVED_CONTEXT: f64 = 0.1;
    /// Range whose start lies after its end.
    pub const UNRESOLVED_MALFORMED: f64 = 0.1;
    /// Reference that names no specific provision at all.
    pub const UNSPECIFIABLE: f64 = 0.0;
}

/// Tunable settings of a [`CitationEngine`](crate::engine::CitationEngine).
///
/// Every field has a default, so a YAML document only needs the keys it
/// overrides.
///
/// # Examples
/// ```
/// use hourei_citations::config::EngineConfig;
///
/// let config = EngineConfig::from_yaml_str("recent_law_capacity: 4").unwrap();
/// assert_eq!(config.recent_law_capacity, 4);
/// assert_eq!(config.min_substring_chars, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Capacity of the recent-law memory.
    pub recent_law_capacity: usize,

    /// Confidence below which citations are sent to the verifier.
    pub verify_threshold: f64,

    /// Verifier timeout in milliseconds.
    pub verifier_timeout_ms: u64,

    /// Minimum query length for substring dictionary lookups.
    pub min_substring_chars: usize,

    /// Widest range that is expanded into individual citations.
    pub max_range_span: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recent_law_capacity: DEFAULT_RECENT_LAW_CAPACITY,
            verify_threshold: DEFAULT_VERIFY_THRESHOLD,
            verifier_timeout_ms: DEFAULT_VERIFIER_TIMEOUT_MS,
            min_substring_chars: DEFAULT_MIN_SUBSTRING_CHARS,
            max_range_span: DEFAULT_MAX_RANGE_SPAN,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is within its usable range.
    pub fn validate(&self) -> Result<()> {
        if self.recent_law_capacity == 0 {
            return Err(CitationError::InvalidConfig {
                field: "recent_law_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.verify_threshold) {
            return Err(CitationError::InvalidConfig {
                field: "verify_threshold",
                reason: format!("must be within 0.0..=1.0, got {}", self.verify_threshold),
            });
        }
        if self.verifier_timeout_ms == 0 {
            return Err(CitationError::InvalidConfig {
                field: "verifier_timeout_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.min_substring_chars == 0 {
            return Err(CitationError::InvalidConfig {
                field: "min_substring_chars",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_range_span == 0 {
            return Err(CitationError::InvalidConfig {
                field: "max_range_span",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Verifier timeout as a [`Duration`].
    #[must_use]
    pub fn verifier_timeout(&self) -> Duration {
        Duration::from_millis(self.verifier_timeout_ms)
    }
}
