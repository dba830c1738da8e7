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

use std::sync::Arc;

use tracing::{debug, instrument, trace, warn};

use crate::actor::{lifecycle, supervise, ActorContext, Behavior};
use crate::common::config::TroupeConfig;
use crate::common::{
    ActorAddress, ActorError, ActorHandle, ActorPath, ActorRef, ActorResult, ActorTypeRegistry,
    ChildEntry, RuntimeCore, SingletonHost,
};
use crate::message::{mailbox, SpawnRequest, StopOutcome};
use crate::policy::{ResolvedDispatcher, Tags};

/// The running actor's view of itself and of the system.
///
/// Handed to every [`Behavior`] call. Child management through the cell is synchronous:
/// the actor processes one message at a time, so its child table never sees two spawns
/// racing for the same name.
pub struct ActorCell {
    myself: ActorRef,
    parent: Option<ActorRef>,
    core: Arc<RuntimeCore>,
    context: ActorContext,
}

/// Everything [`ActorCell::instantiate`] needs besides the behavior.
#[derive(Debug)]
pub(crate) struct Launch {
    pub(crate) address: ActorAddress,
    pub(crate) context: ActorContext,
    pub(crate) dispatcher: ResolvedDispatcher,
    pub(crate) capacity: Option<usize>,
    pub(crate) tags: Tags,
}

impl ActorCell {
    pub(crate) fn new(
        myself: ActorRef,
        parent: Option<ActorRef>,
        core: Arc<RuntimeCore>,
        context: ActorContext,
    ) -> Self {
        Self {
            myself,
            parent,
            core,
            context,
        }
    }

    /// A handle to this actor.
    #[must_use]
    pub fn handle(&self) -> ActorHandle {
        self.core.handle_for(self.myself.clone())
    }

    /// A handle to the parent, `None` for top-level actors.
    #[must_use]
    pub fn parent(&self) -> Option<ActorHandle> {
        self.parent
            .as_ref()
            .filter(|parent| parent.path() != &ActorPath::root())
            .map(|parent| self.core.handle_for(parent.clone()))
    }

    /// The construction context this actor was built with.
    #[must_use]
    pub const fn context(&self) -> &ActorContext {
        &self.context
    }

    /// This actor's address.
    #[must_use]
    pub fn address(&self) -> &ActorAddress {
        self.myself.address()
    }

    /// This actor's path.
    #[must_use]
    pub fn path(&self) -> &ActorPath {
        self.myself.path()
    }

    /// The runtime reference of this actor.
    #[must_use]
    pub const fn actor_ref(&self) -> &ActorRef {
        &self.myself
    }

    /// The system configuration.
    #[must_use]
    pub fn config(&self) -> &TroupeConfig {
        &self.core.config
    }

    /// The system's actor-type registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ActorTypeRegistry> {
        &self.core.registry
    }

    /// Spawns a child, or returns the existing one unless the request is `fresh`.
    ///
    /// The factory is resolved, the supervision strategy applied and the execution policy
    /// composed exactly as for top-level actors; uniqueness is scoped to this actor's
    /// children.
    ///
    /// A singleton that another actor already hosts is recorded here as borrowed: it is
    /// reachable under this actor's name but never stopped by it.
    ///
    /// # Errors
    ///
    /// [`ActorError::AddressInUse`] for a fresh request on a taken name or on a singleton
    /// that is already running,
    /// [`ActorError::SingletonUnavailable`] without a singleton placement,
    /// [`ActorError::UnknownType`] and [`ActorError::SpawnFailed`] from the registry, and
    /// dispatcher or mailbox errors from the policy.
    #[instrument(
        skip(self, request),
        fields(parent = %self.path(), child = %request.address, fresh = request.fresh)
    )]
    pub fn spawn_child(&self, request: SpawnRequest) -> ActorResult<ActorHandle> {
        let SpawnRequest {
            address,
            context,
            policy,
            strategy,
            fresh,
            singleton,
        } = request;
        let name = address.name();

        if let Some(existing) = self.myself.child_entry(&name) {
            if fresh {
                debug!("Name already in use");
                return Err(ActorError::AddressInUse(address));
            }
            trace!("Returning existing actor");
            return Ok(self.core.handle_for(existing.into_actor()));
        }

        let placement = if singleton {
            let placement = self.core.placement.clone().ok_or_else(|| {
                warn!("Singleton requested without a singleton placement");
                ActorError::SingletonUnavailable(address.clone())
            })?;
            if fresh && placement.locate(&name).is_some() {
                debug!("Singleton already running elsewhere");
                return Err(ActorError::AddressInUse(address));
            }
            Some(placement)
        } else {
            None
        };

        let props = policy.compose();
        let (dispatcher, capacity) = self
            .core
            .dispatchers
            .resolve(&props, self.myself.dispatcher())?;

        let mut context = context.unwrap_or_default();
        context.assign_address(address.clone());
        let behavior = self.core.registry.resolve(address.type_id(), &mut context)?;
        let behavior = supervise(
            strategy,
            behavior,
            &address,
            &context,
            &self.core.registry,
            &self.core.config.supervision,
        );

        let launch = Launch {
            address: address.clone(),
            context,
            dispatcher,
            capacity,
            tags: props.tags().clone(),
        };
        let entry = match placement {
            Some(placement) => {
                let hosted_path = self.path().child(&name);
                let host = SingletonHost::new(self, launch);
                let actor = placement.place_singleton(&name, behavior, host)?;
                if actor.path() == &hosted_path {
                    ChildEntry::Hosted(actor)
                } else if fresh {
                    debug!(owner = %actor.path(), "Singleton already running elsewhere");
                    return Err(ActorError::AddressInUse(address));
                } else {
                    debug!(owner = %actor.path(), "Borrowing singleton");
                    ChildEntry::Borrowed(actor)
                }
            }
            None => ChildEntry::Hosted(self.instantiate(launch, behavior)),
        };
        let actor = entry.actor().clone();
        self.myself.insert_child(name, entry);
        debug!(path = %actor.path(), dispatcher = actor.dispatcher_label(), "Actor spawned");
        Ok(self.core.handle_for(actor))
    }

    /// Looks up a child in this actor's child table.
    #[must_use]
    pub fn child(&self, address: &ActorAddress) -> Option<ActorHandle> {
        self.myself
            .child(&address.name())
            .map(|actor| self.core.handle_for(actor))
    }

    /// Whether a live child with this address exists.
    #[must_use]
    pub fn has_child(&self, address: &ActorAddress) -> bool {
        self.myself.child(&address.name()).is_some()
    }

    /// Requests a child to stop and frees its name immediately.
    ///
    /// Only live children this actor hosts are stopped. A borrowed singleton is released
    /// from the table and keeps running under its owner; that, like a name whose actor
    /// has already ended, answers [`StopOutcome::NotFound`].
    pub fn stop_child(&self, address: &ActorAddress) -> StopOutcome {
        match self.myself.remove_child(&address.name()) {
            Some(ChildEntry::Hosted(child)) if child.is_alive() => {
                debug!(child = %child.path(), "Stopping child");
                child.stop();
                StopOutcome::Stopped
            }
            Some(ChildEntry::Borrowed(singleton)) => {
                debug!(owner = %singleton.path(), "Releasing borrowed singleton");
                StopOutcome::NotFound
            }
            Some(ChildEntry::Hosted(_)) | None => {
                trace!(child = %address, "No such child to stop");
                StopOutcome::NotFound
            }
        }
    }

    /// Handles to the live children this actor hosts.
    #[must_use]
    pub fn children(&self) -> Vec<ActorHandle> {
        self.myself
            .children()
            .into_iter()
            .filter(ActorRef::is_alive)
            .map(|actor| self.core.handle_for(actor))
            .collect()
    }

    /// Requests this actor to stop after the current message.
    pub fn stop(&self) {
        self.myself.stop();
    }

    /// Starts a behavior as a child of this actor without registering it by name.
    pub(crate) fn instantiate(&self, launch: Launch, behavior: Box<dyn Behavior>) -> ActorRef {
        let Launch {
            address,
            context,
            dispatcher,
            capacity,
            tags,
        } = launch;
        let (sender, inbox) = mailbox(capacity);
        let path = self.myself.path().child(&address.name());
        let token = self.myself.token().child_token();
        let actor = ActorRef::new(address, path, sender, token, dispatcher, tags);
        let parent = Some(self.myself.clone());
        let cell = Self::new(actor.clone(), parent, Arc::clone(&self.core), context);
        lifecycle::start(cell, behavior, inbox);
        actor
    }

    pub(crate) const fn parent_ref(&self) -> Option<&ActorRef> {
        self.parent.as_ref()
    }
}

impl std::fmt::Debug for ActorCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorCell")
            .field("path", self.myself.path())
            .field("children", &self.myself.child_count())
            .finish_non_exhaustive()
    }
}
