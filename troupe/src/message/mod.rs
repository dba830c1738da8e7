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

//! Defines envelopes, mailboxes, lifecycle signals and the command protocols.
//!
//! # Key Components
//!
//! *   [`Envelope`]: A type-erased message on its way into a mailbox.
//! *   [`ReplyTo`]: The one-shot reply capability carried by `ask` requests.
//! *   [`Signal`] and [`TerminationReason`]: lifecycle notifications delivered to behaviors.
//! *   [`GuardianCommand`]: The root guardian's spawn/stop/lookup protocol.
//! *   [`ChildCommand`]: The same protocol scoped to one actor's children, understood by
//!     actors wrapped in a [`ChildCommandInterceptor`](crate::actor::ChildCommandInterceptor).
//!
//! Mailbox plumbing (`MailboxSender`/`MailboxReceiver`) stays crate-internal.

// --- Public Re-exports ---
pub use ask::ReplyTo;
pub use commands::{ChildCommand, GuardianCommand, SpawnRequest, StopOutcome};
pub use envelope::Envelope;
pub use signal::{Signal, TerminationReason};

// --- Crate-Internal Re-exports ---
pub(crate) use ask::ask_actor;
pub(crate) use mailbox::{mailbox, MailboxReceiver, MailboxSender};

/// Defines [`ReplyTo`] and the caller side of the ask pattern.
mod ask;
/// Defines [`GuardianCommand`], [`ChildCommand`] and [`SpawnRequest`].
mod commands;
/// Defines [`Envelope`].
mod envelope;
/// Defines the bounded/unbounded mailbox channel pair.
mod mailbox;
/// Defines [`Signal`] and [`TerminationReason`].
mod signal;
