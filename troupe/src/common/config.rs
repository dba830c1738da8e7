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

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::actor::RestartLimiterConfig;
use crate::common::{ActorError, ActorResult};

/// Configuration for the troupe runtime.
///
/// Loaded from `$XDG_CONFIG_HOME/troupe/config.toml` when present. Every section and
/// field is optional in the file; missing values take their defaults.
///
/// ```toml
/// [timeouts]
/// ask_timeout_ms = 3000
/// exists_timeout_ms = 250
///
/// [blocking_io]
/// worker_threads = 8
///
/// [dispatchers.ledger]
/// worker_threads = 2
/// thread_name = "ledger-worker"
///
/// [mailboxes.audit]
/// capacity = 64
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TroupeConfig {
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// Mailbox limits
    pub limits: LimitsConfig,
    /// Pool used by the blocking-IO dispatcher
    pub blocking_io: DispatcherConfig,
    /// Named custom dispatchers
    pub dispatchers: HashMap<String, DispatcherConfig>,
    /// Named custom mailboxes
    pub mailboxes: HashMap<String, MailboxConfig>,
    /// Restart limits used by `SupervisionStrategy::restart()`
    pub supervision: RestartLimiterConfig,
}

/// Timeout-related configuration values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Default `ask` timeout in milliseconds
    pub ask_timeout_ms: u64,
    /// Default existence-check timeout in milliseconds; must stay below `ask_timeout_ms`
    pub exists_timeout_ms: u64,
    /// Timeout for spawn, stop and lookup requests in milliseconds
    pub spawn_timeout_ms: u64,
    /// How long a stopping actor waits for each child in milliseconds
    pub actor_shutdown_timeout_ms: u64,
    /// How long `ActorSystem::shutdown` waits in milliseconds
    pub system_shutdown_timeout_ms: u64,
}

/// Mailbox limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Capacity of a named mailbox declared `bounded` without an explicit capacity
    pub bounded_mailbox_default_capacity: usize,
    /// Capacity of the root guardian's mailbox; unbounded when absent
    pub guardian_mailbox_capacity: Option<usize>,
}

/// A dedicated worker pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Number of worker threads
    pub worker_threads: usize,
    /// Worker thread name; defaults to `troupe-<dispatcher>`
    pub thread_name: Option<String>,
}

/// A named mailbox
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    /// Whether the mailbox is bounded
    pub bounded: bool,
    /// Capacity; setting it implies `bounded`
    pub capacity: Option<usize>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            ask_timeout_ms: 3_000,
            exists_timeout_ms: 250,
            spawn_timeout_ms: 3_000,
            actor_shutdown_timeout_ms: 10_000,
            system_shutdown_timeout_ms: 30_000,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            bounded_mailbox_default_capacity: 1_024,
            guardian_mailbox_capacity: None,
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            thread_name: None,
        }
    }
}

impl TroupeConfig {
    /// Default `ask` timeout.
    #[must_use]
    pub const fn ask_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.ask_timeout_ms)
    }

    /// Default existence-check timeout.
    #[must_use]
    pub const fn exists_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.exists_timeout_ms)
    }

    /// Timeout for guardian and child protocol requests.
    #[must_use]
    pub const fn spawn_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.spawn_timeout_ms)
    }

    /// Per-child wait while an actor stops.
    #[must_use]
    pub const fn actor_shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.actor_shutdown_timeout_ms)
    }

    /// Convert system shutdown timeout to Duration
    #[must_use]
    pub const fn system_shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.system_shutdown_timeout_ms)
    }

    /// Capacity for a named mailbox, `Ok(None)` meaning unbounded.
    ///
    /// # Errors
    ///
    /// [`ActorError::UnknownMailbox`] if no mailbox with that name is configured.
    pub fn mailbox_capacity(&self, name: &str) -> ActorResult<Option<usize>> {
        let mailbox = self
            .mailboxes
            .get(name)
            .ok_or_else(|| ActorError::UnknownMailbox(name.to_string()))?;
        Ok(match (mailbox.bounded, mailbox.capacity) {
            (_, Some(capacity)) => Some(capacity),
            (true, None) => Some(self.limits.bounded_mailbox_default_capacity),
            (false, None) => None,
        })
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// [`ActorError::InvalidConfiguration`] describing the first violation found.
    pub fn validate(&self) -> ActorResult<()> {
        let invalid = |reason: String| Err(ActorError::InvalidConfiguration(reason));
        let t = &self.timeouts;
        if t.ask_timeout_ms == 0 || t.exists_timeout_ms == 0 || t.spawn_timeout_ms == 0 {
            return invalid("timeouts must be greater than zero".into());
        }
        if t.exists_timeout_ms >= t.ask_timeout_ms {
            return invalid(format!(
                "exists_timeout_ms ({}) must be less than ask_timeout_ms ({})",
                t.exists_timeout_ms, t.ask_timeout_ms
            ));
        }
        if self.limits.bounded_mailbox_default_capacity == 0
            || self.limits.guardian_mailbox_capacity == Some(0)
        {
            return invalid("mailbox capacities must be greater than zero".into());
        }
        if self.blocking_io.worker_threads == 0 {
            return invalid("blocking_io.worker_threads must be greater than zero".into());
        }
        for (name, dispatcher) in &self.dispatchers {
            if dispatcher.worker_threads == 0 {
                return invalid(format!(
                    "dispatchers.{name}.worker_threads must be greater than zero"
                ));
            }
        }
        for (name, mailbox) in &self.mailboxes {
            if mailbox.capacity == Some(0) {
                return invalid(format!("mailboxes.{name}.capacity must be greater than zero"));
            }
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ActorError::InvalidConfiguration`] on malformed TOML or failed validation.
    pub fn from_toml_str(source: &str) -> ActorResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| ActorError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ActorError::InvalidConfiguration`] if the file cannot be read or is invalid.
    pub fn load_from(path: impl AsRef<Path>) -> ActorResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ActorError::InvalidConfiguration(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Load configuration from XDG-compliant locations
    ///
    /// Looks for `troupe/config.toml` under the XDG config directories. If no file is
    /// found, returns the default configuration. A file that cannot be read, parsed or
    /// validated is logged and ignored.
    pub fn load() -> Self {
        use tracing::{error, info};

        let xdg_dirs = match xdg::BaseDirectories::with_prefix("troupe") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        match xdg_dirs.find_config_file("config.toml") {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                Self::load_from(&path).unwrap_or_else(|e| {
                    error!("Ignoring configuration file {}: {}", path.display(), e);
                    Self::default()
                })
            }
            None => {
                info!("No configuration file found, using defaults");
                Self::default()
            }
        }
    }
}

lazy_static! {
    /// Global configuration instance loaded from XDG-compliant locations
    pub static ref CONFIG: TroupeConfig = TroupeConfig::load();
}
