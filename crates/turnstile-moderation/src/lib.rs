//! Moderation Filter - scam heuristics and channel-scoped link policy
//!
//! The filter only classifies. Acting on a violation (deleting the
//! message, timing out the author, filing an incident report) belongs to
//! the caller.

#![deny(unsafe_code)]

use regex::Regex;
use thiserror::Error;
use turnstile_types::{ChannelId, Verdict, ViolationReason};

/// Message classifier for scam patterns and link policy
pub struct ModerationFilter {
    suspicious_patterns: Vec<String>,
    post_link: Regex,
    url: Regex,
    engagement_channel: ChannelId,
}

impl ModerationFilter {
    /// Build a filter.
    ///
    /// `post_link_pattern` is the only authorized link shape in the
    /// engagement channel; `suspicious_patterns` are matched as lower-case
    /// substrings everywhere.
    pub fn new(
        engagement_channel: ChannelId,
        post_link_pattern: &str,
        suspicious_patterns: Vec<String>,
    ) -> Result<Self, ModerationError> {
        let post_link = Regex::new(post_link_pattern)
            .map_err(|e| ModerationError::InvalidPattern(e.to_string()))?;
        let url = Regex::new(r"https?://\S+").map_err(|e| ModerationError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            suspicious_patterns: suspicious_patterns
                .into_iter()
                .map(|p| p.to_lowercase())
                .collect(),
            post_link,
            url,
            engagement_channel,
        })
    }

    /// Classify a message.
    ///
    /// Suspicious substrings flag everywhere; URLs are allowed only in the
    /// engagement channel, and there only when they match the authorized
    /// post-link shape.
    pub fn evaluate(&self, channel_id: &ChannelId, content: &str) -> Verdict {
        let lowered = content.to_lowercase();
        if self
            .suspicious_patterns
            .iter()
            .any(|pattern| lowered.contains(pattern))
        {
            return Verdict::Violation(ViolationReason::SuspiciousContent);
        }

        let unauthorized = self.url.find_iter(content).any(|link| {
            if channel_id == &self.engagement_channel {
                !self.post_link.is_match(link.as_str())
            } else {
                true
            }
        });
        if unauthorized {
            return Verdict::Violation(ViolationReason::UnauthorizedLink);
        }

        Verdict::Clean
    }

    /// Whether content counts as a qualifying post for engagement accrual
    pub fn is_qualifying_post(&self, content: &str) -> bool {
        self.post_link.is_match(content)
    }

    pub fn engagement_channel(&self) -> &ChannelId {
        &self.engagement_channel
    }
}

/// Moderation-related errors
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}
