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

use crate::actor::{ActorContext, SupervisionStrategy};
use crate::common::{ActorAddress, ActorHandle, ActorResult};
use crate::message::ReplyTo;
use crate::policy::ExecutionPolicy;

/// Everything needed to bring one actor into existence.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    /// The logical address. Its `type_id` selects the registered factory.
    pub address: ActorAddress,
    /// Construction context handed to the factory. `None` uses an empty context.
    pub context: Option<ActorContext>,
    /// Dispatcher, mailbox and tags.
    pub policy: ExecutionPolicy,
    /// What happens when the behavior fails.
    pub strategy: SupervisionStrategy,
    /// When set, an existing actor under the same name is an error instead of the answer.
    pub fresh: bool,
    /// Place the actor through the system's singleton placement.
    pub singleton: bool,
}

impl SpawnRequest {
    /// Creates a get-or-spawn request with default policy and no supervision.
    #[must_use]
    pub fn new(address: ActorAddress) -> Self {
        Self {
            address,
            context: None,
            policy: ExecutionPolicy::default(),
            strategy: SupervisionStrategy::default(),
            fresh: false,
            singleton: false,
        }
    }

    /// Sets the construction context.
    #[must_use]
    pub fn with_context(mut self, context: ActorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Sets the execution policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the supervision strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: SupervisionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Requires that no actor with this name exists yet.
    #[must_use]
    pub fn fresh(mut self) -> Self {
        self.fresh = true;
        self
    }

    /// Requests cluster-singleton placement.
    #[must_use]
    pub fn as_singleton(mut self) -> Self {
        self.singleton = true;
        self
    }
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopOutcome {
    /// A stop was initiated and the entry removed.
    Stopped,
    /// No actor with that name was registered.
    NotFound,
}

/// Commands understood by the root guardian.
///
/// The guardian processes its mailbox one command at a time, so two concurrent spawn
/// requests for the same name always resolve to a single actor.
#[derive(Debug)]
#[non_exhaustive]
pub enum GuardianCommand {
    /// Spawn (or fetch) a top-level actor.
    SpawnActor {
        /// What to spawn.
        request: SpawnRequest,
        /// Receives the handle or the reason spawning failed.
        reply: ReplyTo<ActorResult<ActorHandle>>,
    },
    /// Stop a top-level actor and forget its name.
    StopActor {
        /// Which actor.
        address: ActorAddress,
        /// Receives whether an actor was found.
        reply: ReplyTo<StopOutcome>,
    },
    /// Ask whether a top-level actor with this name is registered.
    CheckExists {
        /// Which actor.
        address: ActorAddress,
        /// Receives the answer.
        reply: ReplyTo<bool>,
    },
    /// Look up a top-level actor.
    GetActor {
        /// Which actor.
        address: ActorAddress,
        /// Receives the handle if registered.
        reply: ReplyTo<Option<ActorHandle>>,
    },
}

/// Commands addressed to a parent actor about its own children.
///
/// Only actors whose behavior is wrapped in a
/// [`ChildCommandInterceptor`](crate::actor::ChildCommandInterceptor) answer these. Any
/// other actor treats them as an unhandled message: the reply capability is dropped and
/// the requester fails with [`ActorError::NoReply`](crate::common::ActorError::NoReply).
#[derive(Debug)]
#[non_exhaustive]
pub enum ChildCommand {
    /// Spawn (or fetch) a child.
    SpawnChild {
        /// What to spawn.
        request: SpawnRequest,
        /// Receives the handle or the reason spawning failed.
        reply: ReplyTo<ActorResult<ActorHandle>>,
    },
    /// Look up a child.
    GetChild {
        /// Which child.
        address: ActorAddress,
        /// Receives the handle if present.
        reply: ReplyTo<Option<ActorHandle>>,
    },
    /// Ask whether a child exists.
    ExistsChild {
        /// Which child.
        address: ActorAddress,
        /// Receives the answer.
        reply: ReplyTo<bool>,
    },
    /// Stop a child.
    StopChild {
        /// Which child.
        address: ActorAddress,
        /// Receives whether a child was found.
        reply: ReplyTo<StopOutcome>,
    },
}
