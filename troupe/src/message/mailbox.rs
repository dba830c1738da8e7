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

//! Mailbox channels.
//!
//! A mailbox is either an unbounded or a bounded Tokio MPSC channel. Both preserve FIFO
//! order per sender. Delivery never blocks: a full bounded mailbox rejects the message.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::common::{ActorError, ActorPath, ActorResult};
use crate::message::Envelope;

/// Sending half of an actor mailbox.
#[derive(Debug, Clone)]
pub(crate) enum MailboxSender {
    Unbounded(mpsc::UnboundedSender<Envelope>),
    Bounded(mpsc::Sender<Envelope>),
}

/// Receiving half of an actor mailbox, owned by the actor's message loop.
#[derive(Debug)]
pub(crate) enum MailboxReceiver {
    Unbounded(mpsc::UnboundedReceiver<Envelope>),
    Bounded(mpsc::Receiver<Envelope>),
}

/// Creates a mailbox. `None` means unbounded; the capacity must be non-zero.
pub(crate) fn mailbox(capacity: Option<usize>) -> (MailboxSender, MailboxReceiver) {
    match capacity {
        Some(capacity) => {
            let (tx, rx) = mpsc::channel(capacity.max(1));
            (MailboxSender::Bounded(tx), MailboxReceiver::Bounded(rx))
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (MailboxSender::Unbounded(tx), MailboxReceiver::Unbounded(rx))
        }
    }
}

impl MailboxSender {
    /// Enqueues without waiting.
    pub(crate) fn deliver(&self, envelope: Envelope, path: &ActorPath) -> ActorResult<()> {
        match self {
            Self::Unbounded(tx) => tx
                .send(envelope)
                .map_err(|_| ActorError::MailboxClosed(path.clone())),
            Self::Bounded(tx) => tx.try_send(envelope).map_err(|e| match e {
                TrySendError::Full(_) => ActorError::MailboxFull(path.clone()),
                TrySendError::Closed(_) => ActorError::MailboxClosed(path.clone()),
            }),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        match self {
            Self::Unbounded(tx) => tx.is_closed(),
            Self::Bounded(tx) => tx.is_closed(),
        }
    }

    /// Mailbox capacity, `None` when unbounded.
    pub(crate) fn capacity(&self) -> Option<usize> {
        match self {
            Self::Unbounded(_) => None,
            Self::Bounded(tx) => Some(tx.max_capacity()),
        }
    }
}

impl MailboxReceiver {
    pub(crate) async fn recv(&mut self) -> Option<Envelope> {
        match self {
            Self::Unbounded(rx) => rx.recv().await,
            Self::Bounded(rx) => rx.recv().await,
        }
    }

    /// Closes the mailbox and returns how many queued messages were discarded.
    pub(crate) fn close_and_drain(&mut self) -> usize {
        let mut dropped = 0;
        match self {
            Self::Unbounded(rx) => {
                rx.close();
                while rx.try_recv().is_ok() {
                    dropped += 1;
                }
            }
            Self::Bounded(rx) => {
                rx.close();
                while rx.try_recv().is_ok() {
                    dropped += 1;
                }
            }
        }
        dropped
    }
}
