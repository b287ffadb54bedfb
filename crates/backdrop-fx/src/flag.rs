//! Enable flag for background animation.
//!
//! The flag comes from a remote setting (`{"enabled": bool}`). Answers are
//! cached for a minute and every failure reads as "disabled".

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default time an answer stays fresh.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

/// Remote payload.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationSetting {
    #[serde(default)]
    pub enabled: bool,
}

/// Decodes the remote payload.
pub fn parse_animation_setting(body: &str) -> Result<AnimationSetting> {
    serde_json::from_str(body).context("malformed animation setting payload")
}

/// Where the flag is looked up.
pub trait FlagSource {
    fn fetch(&mut self) -> Result<AnimationSetting>;
}

impl<F> FlagSource for F
where
    F: FnMut() -> Result<AnimationSetting>,
{
    fn fetch(&mut self) -> Result<AnimationSetting> {
        self()
    }
}

/// A flag fixed at construction (CLI hosts, tests).
#[derive(Debug, Copy, Clone)]
pub struct StaticFlag(pub bool);

impl FlagSource for StaticFlag {
    fn fetch(&mut self) -> Result<AnimationSetting> {
        Ok(AnimationSetting { enabled: self.0 })
    }
}

/// Stale-tolerant cache in front of a [`FlagSource`].
#[derive(Debug)]
pub struct CachedFlag<S> {
    source: S,
    stale_time: Duration,
    cached: Option<(Instant, bool)>,
}

impl<S: FlagSource> CachedFlag<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            stale_time: DEFAULT_STALE_TIME,
            cached: None,
        }
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn is_enabled(&mut self) -> bool {
        self.is_enabled_at(Instant::now())
    }

    /// Answers from cache while fresh, otherwise fetches.
    ///
    /// A failed fetch answers `false`; that answer is cached like any other
    /// so a broken endpoint is not hammered every frame.
    pub fn is_enabled_at(&mut self, now: Instant) -> bool {
        if let Some((at, enabled)) = self.cached {
            if now.saturating_duration_since(at) < self.stale_time {
                return enabled;
            }
        }

        let enabled = match self.source.fetch() {
            Ok(setting) => setting.enabled,
            Err(err) => {
                log::warn!("animation flag lookup failed, treating as disabled: {err:#}");
                false
            }
        };
        self.cached = Some((now, enabled));
        enabled
    }

    /// Forces the next query to fetch.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn parses_payload() {
        assert!(parse_animation_setting(r#"{"enabled":true}"#).unwrap().enabled);
        assert!(!parse_animation_setting(r#"{}"#).unwrap().enabled);
        assert!(parse_animation_setting("<html>").is_err());
    }

    #[test]
    fn answers_from_cache_until_stale() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut flag = CachedFlag::new(move || {
            counter.set(counter.get() + 1);
            Ok(AnimationSetting { enabled: true })
        });

        let t0 = Instant::now();
        assert!(flag.is_enabled_at(t0));
        assert!(flag.is_enabled_at(t0 + Duration::from_secs(59)));
        assert_eq!(calls.get(), 1);

        assert!(flag.is_enabled_at(t0 + Duration::from_secs(60)));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn failures_read_as_disabled_and_are_cached() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut flag = CachedFlag::new(move || -> Result<AnimationSetting> {
            counter.set(counter.get() + 1);
            anyhow::bail!("connection refused")
        });

        let t0 = Instant::now();
        assert!(!flag.is_enabled_at(t0));
        assert!(!flag.is_enabled_at(t0 + Duration::from_secs(1)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn invalidate_forces_refetch() {
        let mut flag = CachedFlag::new(StaticFlag(true)).with_stale_time(Duration::from_secs(3600));
        let t0 = Instant::now();
        assert!(flag.is_enabled_at(t0));
        flag.invalidate();
        assert!(flag.is_enabled_at(t0));
    }
}
