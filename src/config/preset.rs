//! Named rate limit presets.
//!
//! Each preset mirrors the published request budget of an upstream API so a
//! client can be configured with a single string such as `"github"`.

use crate::error::ConfigError;
use crate::rate_limit::RateLimitConfig;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A pre-configured rate limit profile for a known upstream service.
///
/// Presets can be parsed from their string names and displayed back. Use
/// [`RateLimitPreset::Custom`] for services without a preset.
///
/// # Example
///
/// ```rust
/// use fluent_rest::RateLimitPreset;
/// use std::time::Duration;
///
/// let preset: RateLimitPreset = "spotify".parse().unwrap();
/// assert_eq!(preset, RateLimitPreset::Spotify);
///
/// let config = preset.config();
/// assert_eq!(config.max_requests, 180);
/// assert_eq!(config.window, Duration::from_secs(60));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLimitPreset {
    /// GitHub REST API, authenticated: 5000 requests per hour.
    GitHub,
    /// GitHub REST API, unauthenticated: 60 requests per hour.
    GitHubUnauthenticated,
    /// Spotify Web API: 180 requests per minute.
    Spotify,
    /// GitLab.com API: 2000 requests per minute.
    GitLab,
    /// npm registry: 1000 requests per hour.
    Npm,
    /// Google APIs: 1000 requests per 100 seconds.
    Google,
    /// Vercel REST API: 100 requests per 10 seconds.
    Vercel,
    /// Discord API: 50 requests per second.
    Discord,
    /// Notion API: 3 requests per second.
    Notion,
    /// Explicit values for services without a preset.
    Custom(RateLimitConfig),
}

impl RateLimitPreset {
    /// Returns every named preset (excluding `Custom`).
    #[must_use]
    pub fn all() -> Vec<Self> {
        vec![
            Self::GitHub,
            Self::GitHubUnauthenticated,
            Self::Spotify,
            Self::GitLab,
            Self::Npm,
            Self::Google,
            Self::Vercel,
            Self::Discord,
            Self::Notion,
        ]
    }

    /// Returns the limiter settings for this preset.
    #[must_use]
    pub fn config(&self) -> RateLimitConfig {
        let (max_requests, window_secs, retry_after_secs) = match self {
            Self::GitHub => (5000, 3600, 60),
            Self::GitHubUnauthenticated => (60, 3600, 60),
            Self::Spotify => (180, 60, 30),
            Self::GitLab => (2000, 60, 60),
            Self::Npm => (1000, 3600, 60),
            Self::Google => (1000, 100, 10),
            Self::Vercel => (100, 10, 10),
            Self::Discord => (50, 1, 1),
            Self::Notion => (3, 1, 1),
            Self::Custom(config) => return config.clone(),
        };
        RateLimitConfig {
            max_requests,
            window: Duration::from_secs(window_secs),
            retry_after: Duration::from_secs(retry_after_secs),
        }
    }

    fn known_names() -> String {
        Self::all()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for RateLimitPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GitHub => "github",
            Self::GitHubUnauthenticated => "github-unauthenticated",
            Self::Spotify => "spotify",
            Self::GitLab => "gitlab",
            Self::Npm => "npm",
            Self::Google => "google",
            Self::Vercel => "vercel",
            Self::Discord => "discord",
            Self::Notion => "notion",
            Self::Custom(_) => "custom",
        };
        f.write_str(name)
    }
}

impl FromStr for RateLimitPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();

        match name.as_str() {
            "github" => Ok(Self::GitHub),
            "github-unauthenticated" => Ok(Self::GitHubUnauthenticated),
            "spotify" => Ok(Self::Spotify),
            "gitlab" => Ok(Self::GitLab),
            "npm" => Ok(Self::Npm),
            "google" => Ok(Self::Google),
            "vercel" => Ok(Self::Vercel),
            "discord" => Ok(Self::Discord),
            "notion" => Ok(Self::Notion),
            _ => Err(ConfigError::UnknownRateLimitPreset {
                name,
                known: Self::known_names(),
            }),
        }
    }
}

impl From<RateLimitConfig> for RateLimitPreset {
    fn from(config: RateLimitConfig) -> Self {
        Self::Custom(config)
    }
}
