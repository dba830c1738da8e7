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
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{instrument, trace, warn};

use crate::common::{ActorError, ActorRef, ActorResult};
use crate::message::Envelope;
use crate::traits::ActorMessage;

/// A one-shot reply capability.
///
/// Every `ask` request carries a `ReplyTo`. The receiving actor answers by calling
/// [`ReplyTo::send`] at most once. If the requester has already timed out the reply is
/// discarded.
pub struct ReplyTo<R> {
    sender: oneshot::Sender<R>,
}

/// Creates a reply capability and the receiver the requester waits on.
pub(crate) fn reply_channel<R>() -> (ReplyTo<R>, oneshot::Receiver<R>) {
    let (sender, receiver) = oneshot::channel();
    (ReplyTo { sender }, receiver)
}

impl<R> ReplyTo<R> {
    /// Delivers the reply. Returns `false` when nobody is waiting for it anymore.
    pub fn send(self, value: R) -> bool {
        if self.sender.send(value).is_ok() {
            true
        } else {
            warn!(
                reply_type = std::any::type_name::<R>(),
                "Requester no longer waiting, reply discarded"
            );
            false
        }
    }

    /// Returns `true` if the requester has given up.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl<R> fmt::Debug for ReplyTo<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyTo")
            .field("reply_type", &std::any::type_name::<R>())
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

/// Sends a request built around a fresh [`ReplyTo`] and waits for the answer.
///
/// Fails with [`ActorError::AskTimeout`] when no reply arrives within `timeout`, and with
/// [`ActorError::NoReply`] when the target drops the capability without answering.
#[instrument(
    skip(target, make),
    fields(target = %target.path(), timeout_ms = timeout.as_millis() as u64)
)]
pub(crate) async fn ask_actor<R, M, F>(
    target: &ActorRef,
    make: F,
    timeout: Duration,
) -> ActorResult<R>
where
    R: Send + 'static,
    M: ActorMessage,
    F: FnOnce(ReplyTo<R>) -> M,
{
    let (reply_to, receiver) = reply_channel::<R>();
    target.deliver(Envelope::new(make(reply_to)))?;
    match tokio::time::timeout(timeout, receiver).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(_)) => Err(ActorError::NoReply(target.path().clone())),
        Err(_) => {
            trace!("Ask timed out");
            Err(ActorError::AskTimeout {
                target: target.path().clone(),
                timeout,
            })
        }
    }
}
