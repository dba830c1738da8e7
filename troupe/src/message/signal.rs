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

/// Lifecycle notifications delivered to a [`Behavior`](crate::actor::Behavior).
///
/// Signals bypass the mailbox: the runtime hands them to the behavior directly at the
/// matching point of the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Signal {
    /// Sent once before the first message is processed.
    PreStart,
    /// Sent to the failing instance right before it is replaced by a fresh one.
    PreRestart {
        /// Why the instance is being replaced.
        reason: TerminationReason,
    },
    /// Sent once after the message loop has ended and all children have terminated.
    PostStop {
        /// Why the actor stopped.
        reason: TerminationReason,
    },
}

/// Why an actor (or one incarnation of it) ended.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TerminationReason {
    /// Stopped from outside through a stop request.
    Stopped,
    /// The behavior returned [`Next::Stop`](crate::actor::Next::Stop).
    Normal,
    /// A handler returned an error.
    Failed(String),
    /// A handler panicked.
    Panic(String),
    /// Every sender is gone.
    InboxClosed,
    /// The parent terminated first.
    ParentShutdown,
}

impl TerminationReason {
    /// Returns `true` for reasons caused by a handler failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Panic(_))
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Normal => write!(f, "finished normally"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::Panic(reason) => write!(f, "panicked: {reason}"),
            Self::InboxClosed => write!(f, "inbox closed"),
            Self::ParentShutdown => write!(f, "parent shut down"),
        }
    }
}
