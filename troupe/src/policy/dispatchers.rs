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

//! Resolution of dispatcher and mailbox selections into runtime resources.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, instrument};

use crate::common::config::{DispatcherConfig, TroupeConfig};
use crate::common::{ActorError, ActorResult};
use crate::policy::{Dispatcher, Mailbox, SpawnProps};

/// The executor an actor's mailbox loop was placed on.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedDispatcher {
    pub(crate) label: Arc<str>,
    pub(crate) handle: Handle,
    /// Yield to the scheduler after every message.
    pub(crate) cooperative: bool,
}

/// A dedicated multi-thread Tokio runtime owned by the actor system.
#[derive(Debug)]
struct DispatcherPool {
    runtime: Option<Runtime>,
}

impl DispatcherPool {
    fn build(label: &str, config: &DispatcherConfig) -> ActorResult<Self> {
        let thread_name = config
            .thread_name
            .clone()
            .unwrap_or_else(|| format!("troupe-{label}"));
        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads)
            .thread_name(thread_name)
            .enable_all()
            .build()
            .map_err(|e| ActorError::InvalidConfiguration(format!("dispatcher `{label}`: {e}")))?;
        debug!(dispatcher = label, workers = config.worker_threads, "Started dispatcher pool");
        Ok(Self {
            runtime: Some(runtime),
        })
    }

    fn handle(&self) -> Option<Handle> {
        self.runtime.as_ref().map(|rt| rt.handle().clone())
    }
}

impl Drop for DispatcherPool {
    fn drop(&mut self) {
        // Dropping a runtime from async code panics; shutdown_background never blocks.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// All executors known to one actor system.
///
/// Dedicated pools are started lazily on first use and live as long as the system.
#[derive(Debug)]
pub(crate) struct Dispatchers {
    default: Handle,
    blocking: Mutex<Option<Arc<DispatcherPool>>>,
    named: DashMap<String, Arc<DispatcherPool>>,
    config: Arc<TroupeConfig>,
}

impl Dispatchers {
    pub(crate) fn new(default: Handle, config: Arc<TroupeConfig>) -> Self {
        Self {
            default,
            blocking: Mutex::new(None),
            named: DashMap::new(),
            config,
        }
    }

    /// The executor of the runtime the system was launched on.
    pub(crate) fn default_dispatcher(&self) -> ResolvedDispatcher {
        ResolvedDispatcher {
            label: Arc::from("default"),
            handle: self.default.clone(),
            cooperative: false,
        }
    }

    /// Resolves spawn parameters into an executor and a mailbox capacity.
    ///
    /// `parent` is the executor of the spawning actor, used by [`Dispatcher::SameAsParent`].
    #[instrument(skip(self, parent), fields(parent = %parent.label))]
    pub(crate) fn resolve(
        &self,
        props: &SpawnProps,
        parent: &ResolvedDispatcher,
    ) -> ActorResult<(ResolvedDispatcher, Option<usize>)> {
        let capacity = self.mailbox_capacity(props.mailbox())?;
        if !props.requires_parameters() {
            return Ok((self.default_dispatcher(), capacity));
        }
        let dispatcher = match props.dispatcher() {
            Dispatcher::Default => self.default_dispatcher(),
            Dispatcher::SameAsParent => parent.clone(),
            Dispatcher::Virtual(_) => ResolvedDispatcher {
                label: Arc::from("virtual"),
                handle: self.default.clone(),
                cooperative: true,
            },
            Dispatcher::BlockingIo => {
                let mut slot = self.blocking.lock();
                let pool = match slot.as_ref() {
                    Some(pool) => Arc::clone(pool),
                    None => {
                        let built = DispatcherPool::build("blocking-io", &self.config.blocking_io)?;
                        let pool = Arc::new(built);
                        *slot = Some(Arc::clone(&pool));
                        pool
                    }
                };
                Self::pool_dispatcher("blocking-io", &pool)?
            }
            Dispatcher::Named(name) => {
                let config = self
                    .config
                    .dispatchers
                    .get(name)
                    .ok_or_else(|| ActorError::UnknownDispatcher(name.clone()))?;
                let pool = match self.named.entry(name.clone()) {
                    Entry::Occupied(existing) => Arc::clone(existing.get()),
                    Entry::Vacant(vacant) => {
                        let pool = Arc::new(DispatcherPool::build(name, config)?);
                        vacant.insert(Arc::clone(&pool));
                        pool
                    }
                };
                Self::pool_dispatcher(name, &pool)?
            }
        };
        Ok((dispatcher, capacity))
    }

    fn pool_dispatcher(label: &str, pool: &DispatcherPool) -> ActorResult<ResolvedDispatcher> {
        let handle = pool
            .handle()
            .ok_or_else(|| ActorError::UnknownDispatcher(label.to_string()))?;
        Ok(ResolvedDispatcher {
            label: Arc::from(label),
            handle,
            cooperative: false,
        })
    }

    /// `Ok(None)` means unbounded.
    pub(crate) fn mailbox_capacity(&self, mailbox: &Mailbox) -> ActorResult<Option<usize>> {
        match mailbox {
            Mailbox::Unbounded => Ok(None),
            Mailbox::Bounded(0) => Err(ActorError::InvalidConfiguration(
                "bounded mailbox capacity must be greater than zero".into(),
            )),
            Mailbox::Bounded(capacity) => Ok(Some(*capacity)),
            Mailbox::Named(name) => self.config.mailbox_capacity(name),
        }
    }
}
