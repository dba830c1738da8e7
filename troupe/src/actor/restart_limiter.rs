/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Sliding-window restart limiting with exponential backoff.
//!
//! A restarting actor asks its limiter before every restart. Restarts are counted in a
//! sliding time window; once `max_restarts` have happened inside the window the next
//! request is refused and the actor stops instead.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Restart limits and backoff, also the `[supervision]` configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartLimiterConfig {
    /// When disabled, restarts are never refused and never delayed.
    pub enabled: bool,
    /// Restarts allowed inside one window.
    pub max_restarts: u32,
    /// Window length in seconds.
    pub window_secs: u64,
    /// Delay before the first restart in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound on the delay in milliseconds.
    pub max_backoff_ms: u64,
    /// Growth factor applied per consecutive restart.
    pub backoff_multiplier: f64,
}

impl Default for RestartLimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_restarts: 5,
            window_secs: 60,
            initial_backoff_ms: 100,
            max_backoff_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RestartLimiterConfig {
    /// Unlimited, immediate restarts.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            max_restarts: 0,
            window_secs: 0,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            backoff_multiplier: 0.0,
        }
    }

    /// At most `max_restarts` restarts per `window`, without backoff.
    #[must_use]
    pub const fn immediate(max_restarts: u32, window: Duration) -> Self {
        Self {
            enabled: true,
            max_restarts,
            window_secs: window.as_secs(),
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            backoff_multiplier: 1.0,
        }
    }

    /// Window length.
    #[must_use]
    pub const fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Delay before the restart following `consecutive` earlier ones.
    #[must_use]
    pub fn backoff_after(&self, consecutive: u32) -> Duration {
        if !self.enabled {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(consecutive).unwrap_or(i32::MAX);
        #[allow(clippy::cast_precision_loss)]
        let raw = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent);
        #[allow(
            clippy::cast_sign_loss,
            clippy::cast_possible_truncation,
            clippy::cast_precision_loss
        )]
        let capped = raw.min(self.max_backoff_ms as f64).max(0.0) as u64;
        Duration::from_millis(capped)
    }
}

/// Refusal returned by [`RestartLimiter::try_restart`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("restart limit exceeded: {attempts} restarts (max {max_restarts}) within {window_secs}s")]
pub struct RestartLimitExceeded {
    /// Restarts counted in the current window.
    pub attempts: usize,
    /// Allowed restarts per window.
    pub max_restarts: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

/// Tracks the restarts of one supervised actor.
#[derive(Debug)]
pub struct RestartLimiter {
    config: RestartLimiterConfig,
    recent: VecDeque<Instant>,
    consecutive: u32,
}

impl RestartLimiter {
    /// A limiter with no recorded restarts.
    #[must_use]
    pub const fn new(config: RestartLimiterConfig) -> Self {
        Self {
            config,
            recent: VecDeque::new(),
            consecutive: 0,
        }
    }

    /// Records a restart if the window allows one and returns how long to wait before it.
    ///
    /// # Errors
    ///
    /// [`RestartLimitExceeded`] when the window is full. Nothing is recorded then.
    pub fn try_restart(&mut self) -> Result<Duration, RestartLimitExceeded> {
        self.try_restart_at(Instant::now())
    }

    fn try_restart_at(&mut self, now: Instant) -> Result<Duration, RestartLimitExceeded> {
        if !self.config.enabled {
            return Ok(Duration::ZERO);
        }
        let window = self.config.window();
        while self
            .recent
            .front()
            .is_some_and(|&at| now.saturating_duration_since(at) >= window)
        {
            self.recent.pop_front();
        }
        if self.recent.is_empty() {
            self.consecutive = 0;
        }
        if self.recent.len() >= self.config.max_restarts as usize {
            return Err(RestartLimitExceeded {
                attempts: self.recent.len(),
                max_restarts: self.config.max_restarts,
                window_secs: self.config.window_secs,
            });
        }
        let backoff = self.config.backoff_after(self.consecutive);
        self.recent.push_back(now);
        self.consecutive = self.consecutive.saturating_add(1);
        Ok(backoff)
    }

    /// Restarts counted in the current window.
    #[must_use]
    pub fn restarts_in_window(&self) -> usize {
        self.recent.len()
    }

    /// The limiter's configuration.
    #[must_use]
    pub const fn config(&self) -> &RestartLimiterConfig {
        &self.config
    }
}
