//! Completion detection for authentication popups.
//!
//! No single URL pattern works for every identity provider, so the rule is
//! a trait the broker takes as a trait object. The default implementation
//! combines return-to-origin detection (the popup navigating back to the
//! parent's host+path) with configurable success/failure patterns.

use regex::Regex;
use url::Url;

use vitrine_common::ConfigError;

/// What a navigation URL means for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Still mid-flow.
    Neutral,
    Success,
    Failure,
}

/// Inputs available when classifying one observed navigation.
#[derive(Debug)]
pub struct MatchContext<'a> {
    /// The URL the popup just navigated to.
    pub candidate_url: &'a str,
    /// The parent window's original and current URLs, captured when the
    /// popup was requested.
    pub parent_urls: &'a [String],
}

pub trait CompletionMatcher: Send + Sync {
    fn classify(&self, ctx: &MatchContext<'_>) -> MatchOutcome;
}

/// Default rule: failure patterns first (an IdP error page can live on the
/// parent's host), then success patterns, then host+path equality against
/// the parent URLs.
#[derive(Debug)]
pub struct OriginReturnMatcher {
    success: Vec<Regex>,
    failure: Vec<Regex>,
}

impl OriginReturnMatcher {
    pub fn new(
        success_patterns: &[String],
        failure_patterns: &[String],
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            success: compile(success_patterns)?,
            failure: compile(failure_patterns)?,
        })
    }

    /// host + trailing-slash-normalized path, lowercased host.
    fn host_path(url: &str) -> Option<(String, String)> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_ascii_lowercase();
        let path = parsed.path().trim_end_matches('/').to_string();
        Some((host, path))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| {
                ConfigError::ValidationError(format!("invalid popup pattern {p:?}: {e}"))
            })
        })
        .collect()
}

impl CompletionMatcher for OriginReturnMatcher {
    fn classify(&self, ctx: &MatchContext<'_>) -> MatchOutcome {
        if self.failure.iter().any(|re| re.is_match(ctx.candidate_url)) {
            return MatchOutcome::Failure;
        }
        if self.success.iter().any(|re| re.is_match(ctx.candidate_url)) {
            return MatchOutcome::Success;
        }

        if let Some(candidate) = Self::host_path(ctx.candidate_url) {
            let returned = ctx
                .parent_urls
                .iter()
                .filter_map(|u| Self::host_path(u))
                .any(|parent| parent == candidate);
            if returned {
                return MatchOutcome::Success;
            }
        }

        MatchOutcome::Neutral
    }
}

impl Default for OriginReturnMatcher {
    fn default() -> Self {
        // Common OAuth/OIDC error markers; deployments override via config.
        Self::new(&[], &["[?&]error=".to_string()]).unwrap()
    }
}
