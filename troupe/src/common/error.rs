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

use std::time::Duration;

use crate::common::{ActorAddress, ActorPath, ActorTypeId};

/// Convenience alias for framework results.
pub type ActorResult<T> = Result<T, ActorError>;

/// Errors surfaced by the actor system.
///
/// Behaviors and factories report their own failures through `anyhow::Error`; those are
/// converted into [`ActorError::SpawnFailed`] or handled by the actor's supervision
/// strategy and never reach the guardian.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ActorError {
    /// No factory is registered for the requested type.
    #[error("no factory registered for actor type `{0}`")]
    UnknownType(ActorTypeId),

    /// A factory for this type was already registered.
    #[error("actor type `{0}` is already registered")]
    DuplicateType(ActorTypeId),

    /// A fresh spawn was requested for a name that is taken.
    #[error("an actor named `{0}` already exists")]
    AddressInUse(ActorAddress),

    /// Singleton placement was requested but no placement is installed, or the target
    /// cannot host singletons.
    #[error("singleton placement unavailable for `{0}`")]
    SingletonUnavailable(ActorAddress),

    /// No reply arrived before the deadline.
    #[error("no reply from {target} within {timeout:?}")]
    AskTimeout {
        /// Who was asked.
        target: ActorPath,
        /// How long the caller waited.
        timeout: Duration,
    },

    /// The target dropped the reply capability without answering.
    #[error("{0} dropped the request without replying")]
    NoReply(ActorPath),

    /// The host runtime cannot provide the requested scheduling mode.
    #[error("unsupported execution model: {0}")]
    UnsupportedExecutionModel(String),

    /// The factory returned an error or panicked.
    #[error("failed to spawn `{address}`: {reason}")]
    SpawnFailed {
        /// What was being spawned.
        address: ActorAddress,
        /// The factory's error or panic message.
        reason: String,
    },

    /// A bounded mailbox had no room.
    #[error("mailbox of {0} is full")]
    MailboxFull(ActorPath),

    /// The actor has stopped and no longer accepts messages.
    #[error("mailbox of {0} is closed")]
    MailboxClosed(ActorPath),

    /// The policy names a dispatcher missing from the configuration.
    #[error("no dispatcher named `{0}` is configured")]
    UnknownDispatcher(String),

    /// The policy names a mailbox missing from the configuration.
    #[error("no mailbox named `{0}` is configured")]
    UnknownMailbox(String),

    /// The type id is empty or contains the address separator.
    #[error("invalid actor type id `{id}`: {reason}")]
    InvalidTypeId {
        /// The rejected id.
        id: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A configuration value or policy parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An actor did not finish stopping in time.
    #[error("{path} did not terminate within {timeout:?}")]
    ShutdownTimeout {
        /// The actor that was waited on.
        path: ActorPath,
        /// How long the caller waited.
        timeout: Duration,
    },
}

impl ActorError {
    /// Returns `true` for [`ActorError::AskTimeout`].
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::AskTimeout { .. })
    }
}
