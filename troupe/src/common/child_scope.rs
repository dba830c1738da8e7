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

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::actor::{ActorContext, SupervisionStrategy};
use crate::common::config::TroupeConfig;
use crate::common::{ActorAddress, ActorHandle, ActorRef, ActorResult};
use crate::message::{ask_actor, ChildCommand, GuardianCommand, SpawnRequest, StopOutcome};
use crate::policy::ExecutionPolicy;

/// Where a scope's requests go.
#[derive(Debug, Clone)]
pub(crate) enum ScopeTarget {
    /// The root guardian, speaking [`GuardianCommand`].
    Guardian(ActorRef),
    /// A parent actor, speaking [`ChildCommand`].
    Parent(ActorRef),
}

/// A handle-builder for one `(type, instance)` under a specific parent.
///
/// Obtained from [`ActorSystem::actor`](crate::common::ActorSystem::actor) for top-level
/// actors or [`ActorHandle::child`] for children. Every operation is a request to the
/// owning parent, answered from its child table.
///
/// A malformed type id is reported by the first operation on the scope.
#[derive(Debug, Clone)]
pub struct ChildScope {
    target: ScopeTarget,
    address: ActorResult<ActorAddress>,
    context: Option<ActorContext>,
    policy: ExecutionPolicy,
    singleton: bool,
    config: Arc<TroupeConfig>,
}

impl ChildScope {
    pub(crate) fn of_guardian(
        guardian: ActorRef,
        address: ActorResult<ActorAddress>,
        config: Arc<TroupeConfig>,
    ) -> Self {
        Self::new(ScopeTarget::Guardian(guardian), address, config)
    }

    pub(crate) fn of_parent(
        parent: ActorRef,
        address: ActorResult<ActorAddress>,
        config: Arc<TroupeConfig>,
    ) -> Self {
        Self::new(ScopeTarget::Parent(parent), address, config)
    }

    fn new(
        target: ScopeTarget,
        address: ActorResult<ActorAddress>,
        config: Arc<TroupeConfig>,
    ) -> Self {
        Self {
            target,
            address,
            context: None,
            policy: ExecutionPolicy::default(),
            singleton: false,
            config,
        }
    }

    /// The address this scope refers to, `None` if the type id was rejected.
    #[must_use]
    pub fn address(&self) -> Option<&ActorAddress> {
        self.address.as_ref().ok()
    }

    /// Construction context for a spawn.
    #[must_use]
    pub fn with_context(mut self, context: ActorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Adds one typed value to the construction context.
    #[must_use]
    pub fn with_extension<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.context = Some(self.context.take().unwrap_or_default().with_extension(value));
        self
    }

    /// Execution policy for a spawn.
    #[must_use]
    pub fn with_policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Routes a spawn through the system's singleton placement.
    #[must_use]
    pub const fn as_singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    /// Looks up the actor.
    ///
    /// # Errors
    ///
    /// [`ActorError::AskTimeout`](crate::common::ActorError::AskTimeout) if the parent does
    /// not answer in time, [`ActorError::NoReply`](crate::common::ActorError::NoReply) if
    /// it does not intercept child commands.
    pub async fn get(&self) -> ActorResult<Option<ActorHandle>> {
        let address = self.address.clone()?;
        request_get(&self.target, address, self.config.spawn_timeout()).await
    }

    /// Whether the actor exists, using the short existence-check timeout.
    ///
    /// # Errors
    ///
    /// Same as [`ChildScope::get`].
    pub async fn exists(&self) -> ActorResult<bool> {
        let address = self.address.clone()?;
        request_exists(&self.target, address, self.config.exists_timeout()).await
    }

    /// Spawns a new actor. Fails if the name is taken.
    ///
    /// # Errors
    ///
    /// [`ActorError::AddressInUse`](crate::common::ActorError::AddressInUse) plus every
    /// error of [`ChildScope::get_or_spawn`].
    pub async fn spawn(&self, strategy: SupervisionStrategy) -> ActorResult<ActorHandle> {
        let request = self.request(strategy)?.fresh();
        request_spawn(&self.target, request, self.config.spawn_timeout()).await
    }

    /// Returns the existing actor or spawns it.
    ///
    /// # Errors
    ///
    /// Registry, policy and placement errors from the parent, or a timeout.
    pub async fn get_or_spawn(&self, strategy: SupervisionStrategy) -> ActorResult<ActorHandle> {
        let request = self.request(strategy)?;
        request_spawn(&self.target, request, self.config.spawn_timeout()).await
    }

    /// Stops the actor. `NotFound` is not an error.
    ///
    /// # Errors
    ///
    /// Same as [`ChildScope::get`].
    pub async fn stop(&self) -> ActorResult<StopOutcome> {
        let address = self.address.clone()?;
        request_stop(&self.target, address, self.config.spawn_timeout()).await
    }

    fn request(&self, strategy: SupervisionStrategy) -> ActorResult<SpawnRequest> {
        let mut request = SpawnRequest::new(self.address.clone()?)
            .with_policy(self.policy.clone())
            .with_strategy(strategy);
        request.context.clone_from(&self.context);
        request.singleton = self.singleton;
        Ok(request)
    }
}

#[instrument(skip(target, request), fields(address = %request.address))]
pub(crate) async fn request_spawn(
    target: &ScopeTarget,
    request: SpawnRequest,
    timeout: Duration,
) -> ActorResult<ActorHandle> {
    match target {
        ScopeTarget::Guardian(guardian) => {
            ask_actor(
                guardian,
                |reply| GuardianCommand::SpawnActor { request, reply },
                timeout,
            )
            .await?
        }
        ScopeTarget::Parent(parent) => {
            ask_actor(parent, |reply| ChildCommand::SpawnChild { request, reply }, timeout).await?
        }
    }
}

pub(crate) async fn request_get(
    target: &ScopeTarget,
    address: ActorAddress,
    timeout: Duration,
) -> ActorResult<Option<ActorHandle>> {
    match target {
        ScopeTarget::Guardian(guardian) => {
            ask_actor(guardian, |reply| GuardianCommand::GetActor { address, reply }, timeout).await
        }
        ScopeTarget::Parent(parent) => {
            ask_actor(parent, |reply| ChildCommand::GetChild { address, reply }, timeout).await
        }
    }
}

pub(crate) async fn request_exists(
    target: &ScopeTarget,
    address: ActorAddress,
    timeout: Duration,
) -> ActorResult<bool> {
    match target {
        ScopeTarget::Guardian(guardian) => {
            ask_actor(
                guardian,
                |reply| GuardianCommand::CheckExists { address, reply },
                timeout,
            )
            .await
        }
        ScopeTarget::Parent(parent) => {
            ask_actor(parent, |reply| ChildCommand::ExistsChild { address, reply }, timeout).await
        }
    }
}

pub(crate) async fn request_stop(
    target: &ScopeTarget,
    address: ActorAddress,
    timeout: Duration,
) -> ActorResult<StopOutcome> {
    match target {
        ScopeTarget::Guardian(guardian) => {
            ask_actor(
                guardian,
                |reply| GuardianCommand::StopActor { address, reply },
                timeout,
            )
            .await
        }
        ScopeTarget::Parent(parent) => {
            ask_actor(parent, |reply| ChildCommand::StopChild { address, reply }, timeout).await
        }
    }
}
