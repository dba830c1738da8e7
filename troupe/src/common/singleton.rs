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

use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, instrument};

use crate::actor::{ActorCell, Behavior, Launch};
use crate::common::{ActorAddress, ActorRef, ActorResult};

/// Places actors that must have at most one live instance.
///
/// The system consults its placement only for spawn requests marked as singleton. A
/// system launched without one answers those requests with
/// [`ActorError::SingletonUnavailable`](crate::common::ActorError::SingletonUnavailable);
/// it never falls back to plain local instantiation.
pub trait SingletonPlacement: Send + Sync + fmt::Debug + 'static {
    /// Returns the reference messages for `unique_name` should go to.
    ///
    /// `behavior` is a freshly built instance. An implementation that hosts the actor in
    /// this process starts it with [`SingletonHost::instantiate`]; one that finds the
    /// actor already running elsewhere returns a reference to that instance and drops
    /// `behavior`.
    ///
    /// # Errors
    ///
    /// Implementation-specific placement failures.
    fn place_singleton(
        &self,
        unique_name: &str,
        behavior: Box<dyn Behavior>,
        host: SingletonHost<'_>,
    ) -> ActorResult<ActorRef>;

    /// The live instance currently placed under `unique_name`, if any.
    ///
    /// Consulted before a fresh singleton spawn, which must not reuse a running instance.
    fn locate(&self, unique_name: &str) -> Option<ActorRef>;
}

/// A shared placement, so the caller can keep inspecting one it installed.
impl<P: SingletonPlacement> SingletonPlacement for Arc<P> {
    fn place_singleton(
        &self,
        unique_name: &str,
        behavior: Box<dyn Behavior>,
        host: SingletonHost<'_>,
    ) -> ActorResult<ActorRef> {
        (**self).place_singleton(unique_name, behavior, host)
    }

    fn locate(&self, unique_name: &str) -> Option<ActorRef> {
        (**self).locate(unique_name)
    }
}

/// The local runtime offered to a [`SingletonPlacement`].
pub struct SingletonHost<'a> {
    cell: &'a ActorCell,
    launch: Launch,
}

impl<'a> SingletonHost<'a> {
    pub(crate) const fn new(cell: &'a ActorCell, launch: Launch) -> Self {
        Self { cell, launch }
    }

    /// The address being placed.
    #[must_use]
    pub const fn address(&self) -> &ActorAddress {
        &self.launch.address
    }

    /// Starts `behavior` locally under the requesting parent with the requested policy.
    #[must_use]
    pub fn instantiate(self, behavior: Box<dyn Behavior>) -> ActorRef {
        self.cell.instantiate(self.launch, behavior)
    }
}

impl fmt::Debug for SingletonHost<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonHost")
            .field("parent", self.cell.path())
            .field("address", &self.launch.address)
            .finish()
    }
}

/// Singleton placement for a single process.
///
/// Keeps at most one live instance per unique name across the whole system, whichever
/// parent asks.
#[derive(Debug, Default)]
pub struct SingleNodePlacement {
    instances: DashMap<String, ActorRef>,
}

impl SingleNodePlacement {
    /// An empty placement.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of singletons currently alive.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.instances.iter().filter(|entry| entry.value().is_alive()).count()
    }
}

impl SingletonPlacement for SingleNodePlacement {
    #[instrument(skip(self, behavior, host))]
    fn place_singleton(
        &self,
        unique_name: &str,
        behavior: Box<dyn Behavior>,
        host: SingletonHost<'_>,
    ) -> ActorResult<ActorRef> {
        match self.instances.entry(unique_name.to_string()) {
            Entry::Occupied(existing) if existing.get().is_alive() => {
                debug!(path = %existing.get().path(), "Singleton already running");
                Ok(existing.get().clone())
            }
            Entry::Occupied(mut stale) => {
                let actor = host.instantiate(behavior);
                stale.insert(actor.clone());
                Ok(actor)
            }
            Entry::Vacant(vacant) => {
                let actor = host.instantiate(behavior);
                vacant.insert(actor.clone());
                Ok(actor)
            }
        }
    }

    fn locate(&self, unique_name: &str) -> Option<ActorRef> {
        self.instances
            .get(unique_name)
            .map(|entry| entry.value().clone())
            .filter(ActorRef::is_alive)
    }
}
