//! Engine configuration
//!
//! Every limit and pattern the engine recognizes, with the platform's
//! production defaults. Deserializable so deployments can override any
//! subset from a config file.

use crate::ChannelId;
use serde::{Deserialize, Serialize};

/// Default qualifying-link pattern: a Twitter/X post URL
pub const DEFAULT_POST_LINK_PATTERN: &str =
    r"https?://(www\.)?(twitter\.com|x\.com)/[A-Za-z0-9_]+/status/[0-9]+";

/// Configuration for the tiering engine
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hard cap on Early Access seats
    pub early_access_max: u32,
    /// Hard cap on Waitlist seats
    pub waitlist_max: u32,
    /// Points awarded per qualifying post
    pub xp_per_post: u64,
    /// Minimum seconds between accruals for one user
    pub cooldown_seconds: u64,
    /// Points at which a Waitlist member becomes promotable
    pub promotion_threshold: u64,
    /// Minimum account age before verification is accepted
    pub min_account_age_days: u32,
    /// The channel where qualifying posts earn points
    pub engagement_channel: ChannelId,
    /// Regex for an authorized platform-post link
    pub post_link_pattern: String,
    /// Lower-cased substrings that flag a message as a scam attempt
    pub suspicious_patterns: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            early_access_max: 500,
            waitlist_max: 10_000,
            xp_per_post: 10,
            cooldown_seconds: 120,
            promotion_threshold: 1_000,
            min_account_age_days: 7,
            engagement_channel: ChannelId::new("engage"),
            post_link_pattern: DEFAULT_POST_LINK_PATTERN.to_string(),
            suspicious_patterns: vec![
                "private key".to_string(),
                "seed phrase".to_string(),
                "send me".to_string(),
                "dm me".to_string(),
                "click here".to_string(),
                "free money".to_string(),
                "giveaway".to_string(),
                "airdrop".to_string(),
            ],
        }
    }
}
