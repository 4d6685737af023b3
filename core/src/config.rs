//! Board configuration
//!
//! Defaults match the interaction timings of the board UI. Values can be
//! overridden from `TASKBOARD_*` environment variables.

use std::time::Duration;

use serde::Deserialize;

use crate::board::StackLayout;
use crate::error::Error;
use crate::Result;

/// Configuration for a board session
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Base URL of the remote task store
    pub base_url: String,
    /// Grace period before a deletion is sent to the store
    pub undo_grace_ms: u64,
    /// Interval of the undo countdown display
    pub countdown_tick_ms: u64,
    /// Fade-out time before a hidden card leaves the view
    pub fade_ms: u64,
    /// Upper bound on simultaneously undoable deletions
    pub max_pending_deletions: usize,
    /// Per-request timeout for the HTTP store
    pub request_timeout_ms: u64,
    pub layout: StackLayout,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            undo_grace_ms: 5000,
            countdown_tick_ms: 1000,
            fade_ms: 300,
            max_pending_deletions: 16,
            request_timeout_ms: 10_000,
            layout: StackLayout::default(),
        }
    }
}

impl BoardConfig {
    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup("TASKBOARD_BASE_URL") {
            config.base_url = url;
        }
        if let Some(v) = lookup("TASKBOARD_UNDO_GRACE_MS") {
            config.undo_grace_ms = parse_var("TASKBOARD_UNDO_GRACE_MS", &v)?;
        }
        if let Some(v) = lookup("TASKBOARD_COUNTDOWN_TICK_MS") {
            config.countdown_tick_ms = parse_var("TASKBOARD_COUNTDOWN_TICK_MS", &v)?;
        }
        if let Some(v) = lookup("TASKBOARD_FADE_MS") {
            config.fade_ms = parse_var("TASKBOARD_FADE_MS", &v)?;
        }
        if let Some(v) = lookup("TASKBOARD_MAX_PENDING_DELETIONS") {
            config.max_pending_deletions = parse_var("TASKBOARD_MAX_PENDING_DELETIONS", &v)?;
        }
        if let Some(v) = lookup("TASKBOARD_REQUEST_TIMEOUT_MS") {
            config.request_timeout_ms = parse_var("TASKBOARD_REQUEST_TIMEOUT_MS", &v)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.undo_grace_ms == 0 || self.countdown_tick_ms == 0 {
            return Err(Error::Config(
                "undo grace period and countdown tick must be non-zero".into(),
            ));
        }
        if self.undo_grace_ms % self.countdown_tick_ms != 0 {
            return Err(Error::Config(format!(
                "undo grace period ({} ms) must be a whole number of countdown ticks ({} ms)",
                self.undo_grace_ms, self.countdown_tick_ms
            )));
        }
        if self.max_pending_deletions == 0 {
            return Err(Error::Config("max_pending_deletions must be at least 1".into()));
        }
        if self.layout.card_height <= 0.0 {
            return Err(Error::Config("layout card_height must be positive".into()));
        }
        Ok(())
    }

    pub fn undo_grace(&self) -> Duration {
        Duration::from_millis(self.undo_grace_ms)
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }

    /// Value the countdown display starts from
    pub fn countdown_start(&self) -> u32 {
        u32::try_from(self.undo_grace_ms / self.countdown_tick_ms).unwrap_or(u32::MAX)
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} has an invalid value: {:?}", key, value)))
}
