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
use std::time::Duration;

use static_assertions::assert_impl_all;
use tracing::{instrument, warn};

use crate::common::config::TroupeConfig;
use crate::common::{ActorAddress, ActorError, ActorPath, ActorRef, ActorResult, ChildScope};
use crate::message::{ask_actor, Envelope, ReplyTo};
use crate::policy::Tags;
use crate::traits::ActorMessage;

/// The ask/tell façade over one actor.
///
/// Cheap to clone and safe to share. A handle stays valid after its actor stops:
/// `tell` then drops the message, `try_tell` and `ask` report
/// [`ActorError::MailboxClosed`].
#[derive(Clone)]
pub struct ActorHandle {
    actor: ActorRef,
    config: Arc<TroupeConfig>,
    ask_timeout: Duration,
}

assert_impl_all!(ActorHandle: Send, Sync, Clone);

impl ActorHandle {
    pub(crate) fn new(actor: ActorRef, config: Arc<TroupeConfig>) -> Self {
        let ask_timeout = config.ask_timeout();
        Self {
            actor,
            config,
            ask_timeout,
        }
    }

    /// The actor's logical address.
    #[must_use]
    pub fn address(&self) -> &ActorAddress {
        self.actor.address()
    }

    /// The actor's hierarchical path.
    #[must_use]
    pub fn path(&self) -> &ActorPath {
        self.actor.path()
    }

    /// Diagnostic tags of the actor.
    #[must_use]
    pub fn tags(&self) -> &Tags {
        self.actor.tags()
    }

    /// The underlying runtime reference.
    #[must_use]
    pub const fn actor_ref(&self) -> &ActorRef {
        &self.actor
    }

    /// The timeout used by [`ActorHandle::ask_default`].
    #[must_use]
    pub const fn ask_timeout(&self) -> Duration {
        self.ask_timeout
    }

    /// Returns a copy of this handle with a different default ask timeout.
    #[must_use]
    pub fn with_ask_timeout(mut self, timeout: Duration) -> Self {
        self.ask_timeout = timeout;
        self
    }

    /// Fire-and-forget send.
    ///
    /// Never blocks. If the mailbox is full or closed the message is dropped and a
    /// warning logged.
    #[instrument(skip(self, message), fields(target = %self.path()))]
    pub fn tell(&self, message: impl ActorMessage) {
        if let Err(e) = self.actor.deliver(Envelope::new(message)) {
            warn!(error = %e, "Message dropped");
        }
    }

    /// Send that reports backpressure.
    ///
    /// # Errors
    ///
    /// [`ActorError::MailboxFull`] or [`ActorError::MailboxClosed`].
    pub fn try_tell(&self, message: impl ActorMessage) -> ActorResult<()> {
        self.actor.deliver(Envelope::new(message))
    }

    /// Request/response with a deadline.
    ///
    /// `make` receives the one-shot reply capability and builds the request. A reply
    /// arriving after `timeout` is discarded.
    ///
    /// # Errors
    ///
    /// [`ActorError::AskTimeout`] when the deadline passes, [`ActorError::NoReply`] when
    /// the target drops the capability, and delivery errors from the mailbox.
    pub async fn ask<R, M, F>(&self, make: F, timeout: Duration) -> ActorResult<R>
    where
        R: Send + 'static,
        M: ActorMessage,
        F: FnOnce(ReplyTo<R>) -> M,
    {
        ask_actor(&self.actor, make, timeout).await
    }

    /// [`ActorHandle::ask`] with this handle's default timeout.
    ///
    /// # Errors
    ///
    /// Same as [`ActorHandle::ask`].
    pub async fn ask_default<R, M, F>(&self, make: F) -> ActorResult<R>
    where
        R: Send + 'static,
        M: ActorMessage,
        F: FnOnce(ReplyTo<R>) -> M,
    {
        self.ask(make, self.ask_timeout).await
    }

    /// Request/response that degrades to `fallback` on any failure, timeout included.
    pub async fn ask_or<R, M, F>(&self, make: F, timeout: Duration, fallback: R) -> R
    where
        R: Send + 'static,
        M: ActorMessage,
        F: FnOnce(ReplyTo<R>) -> M,
    {
        self.ask_or_else(make, timeout, |_| fallback).await
    }

    /// Request/response that maps any failure to a value.
    pub async fn ask_or_else<R, M, F, G>(&self, make: F, timeout: Duration, fallback: G) -> R
    where
        R: Send + 'static,
        M: ActorMessage,
        F: FnOnce(ReplyTo<R>) -> M,
        G: FnOnce(ActorError) -> R,
    {
        match self.ask(make, timeout).await {
            Ok(value) => value,
            Err(e) => {
                warn!(target = %self.path(), error = %e, "Ask failed, using fallback");
                fallback(e)
            }
        }
    }

    /// Requests the actor to stop. Returns immediately.
    pub fn stop(&self) {
        self.actor.stop();
    }

    /// Resolves once the actor has fully terminated.
    pub async fn terminated(&self) {
        self.actor.terminated().await;
    }

    /// `true` while the actor runs and no stop has been requested.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.actor.is_alive()
    }

    /// Scope for one child of this actor, addressed through the child-command protocol.
    ///
    /// The actor must be wrapped in a
    /// [`ChildCommandInterceptor`](crate::actor::ChildCommandInterceptor); otherwise the
    /// actor drops every request on the scope unanswered and it fails with
    /// [`ActorError::NoReply`].
    #[must_use]
    pub fn child(&self, type_id: impl AsRef<str>, instance_id: impl AsRef<str>) -> ChildScope {
        ChildScope::of_parent(
            self.actor.clone(),
            ActorAddress::try_new(type_id, instance_id),
            Arc::clone(&self.config),
        )
    }
}

impl PartialEq for ActorHandle {
    fn eq(&self, other: &Self) -> bool {
        self.actor == other.actor
    }
}

impl Eq for ActorHandle {}

impl fmt::Debug for ActorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorHandle")
            .field("path", self.actor.path())
            .field("ask_timeout", &self.ask_timeout)
            .finish()
    }
}
