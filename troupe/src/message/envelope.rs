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

use std::any::{Any, TypeId};
use std::fmt;
use std::time::Instant;

use crate::traits::ActorMessage;

/// A type-erased message travelling through a mailbox.
///
/// An `Envelope` owns exactly one message. Behaviors inspect it with [`Envelope::is`] and
/// take the message back out with [`Envelope::downcast`], which hands the envelope back
/// untouched when the type does not match so the next candidate type can be tried.
pub struct Envelope {
    payload: Box<dyn Any + Send>,
    type_id: TypeId,
    message_type: &'static str,
    sent_at: Instant,
}

impl Envelope {
    /// Wraps a message for delivery.
    pub fn new<M: ActorMessage>(message: M) -> Self {
        Self {
            message_type: message.message_type(),
            type_id: TypeId::of::<M>(),
            payload: Box::new(message),
            sent_at: Instant::now(),
        }
    }

    /// Returns `true` if the envelope carries a message of type `M`.
    #[inline]
    #[must_use]
    pub fn is<M: ActorMessage>(&self) -> bool {
        self.type_id == TypeId::of::<M>()
    }

    /// Takes the message out as `M`, or returns the envelope unchanged if it holds another type.
    ///
    /// # Errors
    ///
    /// Returns `Err(self)` when the payload is not an `M`.
    pub fn downcast<M: ActorMessage>(self) -> Result<M, Self> {
        let Self {
            payload,
            type_id,
            message_type,
            sent_at,
        } = self;
        payload.downcast::<M>().map(|message| *message).map_err(|payload| Self {
            payload,
            type_id,
            message_type,
            sent_at,
        })
    }

    /// Borrows the message as `M` without consuming the envelope.
    #[must_use]
    pub fn peek<M: ActorMessage>(&self) -> Option<&M> {
        self.payload.downcast_ref::<M>()
    }

    /// The `TypeId` of the carried message, used for handler lookup.
    #[inline]
    #[must_use]
    pub fn message_type_id(&self) -> TypeId {
        self.type_id
    }

    /// The Rust type name of the carried message.
    #[inline]
    #[must_use]
    pub const fn message_type(&self) -> &'static str {
        self.message_type
    }

    /// When the envelope was created.
    #[inline]
    #[must_use]
    pub const fn sent_at(&self) -> Instant {
        self.sent_at
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("message_type", &self.message_type)
            .field("sent_at", &self.sent_at)
            .finish_non_exhaustive()
    }
}
