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

use std::any::{type_name, TypeId};
use std::fmt;

use async_trait::async_trait;
use tracing::{instrument, trace};

use crate::actor::ActorCell;
use crate::common::{MessageHandler, ReactorMap, SignalHandler};
use crate::message::{Envelope, Signal};
use crate::traits::ActorMessage;

/// The running state-transition function of an actor.
///
/// A behavior receives one message at a time and decides what happens next. It is
/// owned by the actor's mailbox loop, so it needs `Send` but never `Sync`.
#[async_trait]
pub trait Behavior: Send + 'static {
    /// Handles one message.
    ///
    /// # Errors
    ///
    /// Any error is a failure of this actor and is handled by its supervision strategy.
    async fn receive(&mut self, cx: &mut ActorCell, envelope: Envelope) -> anyhow::Result<Next>;

    /// Handles a lifecycle signal. The default ignores it.
    ///
    /// # Errors
    ///
    /// An error or panic from `PreStart` is a failure like one from
    /// [`receive`](Behavior::receive): the supervision strategy decides, and a restart
    /// counts against the restart limit. Without a strategy it stops the actor before its
    /// first message. A failing `PreRestart` is logged and the restart goes ahead; a
    /// failing `PostStop` is logged.
    async fn signal(&mut self, cx: &mut ActorCell, signal: Signal) -> anyhow::Result<Next> {
        let _ = (cx, signal);
        Ok(Next::Same)
    }
}

#[async_trait]
impl Behavior for Box<dyn Behavior> {
    async fn receive(&mut self, cx: &mut ActorCell, envelope: Envelope) -> anyhow::Result<Next> {
        (**self).receive(cx, envelope).await
    }

    async fn signal(&mut self, cx: &mut ActorCell, signal: Signal) -> anyhow::Result<Next> {
        (**self).signal(cx, signal).await
    }
}

/// What an actor does after handling a message.
pub enum Next {
    /// Keep the current behavior.
    Same,
    /// Replace the current behavior.
    Become(Box<dyn Behavior>),
    /// Stop the actor.
    Stop,
}

impl Next {
    /// Convenience for `Next::Become(Box::new(behavior))`.
    #[must_use]
    pub fn switch_to(behavior: impl Behavior) -> Self {
        Self::Become(Box::new(behavior))
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Same => write!(f, "Same"),
            Self::Become(_) => write!(f, "Become(..)"),
            Self::Stop => write!(f, "Stop"),
        }
    }
}

/// A behavior assembled from per-message-type closures over some state.
///
/// Each handler receives the state, the actor's cell and the concrete message, and
/// returns the [`Next`] step. Messages without a handler are logged and dropped.
///
/// ```rust
/// use troupe::prelude::*;
///
/// #[troupe_message]
/// struct Add(u64);
///
/// let counter = Reactor::new(0_u64).mutate_on::<Add>(|total, _cx, Add(n)| {
///     *total += n;
///     Ok(Next::Same)
/// });
/// assert_eq!(*counter.state(), 0);
/// ```
pub struct Reactor<State: Send + 'static> {
    state: State,
    handlers: ReactorMap<State>,
    signal_handler: Option<SignalHandler<State>>,
}

impl<State: Send + 'static> Reactor<State> {
    /// Starts a reactor with the given initial state and no handlers.
    #[must_use]
    pub fn new(state: State) -> Self {
        Self {
            state,
            handlers: ReactorMap::new(),
            signal_handler: None,
        }
    }

    /// Registers the handler for messages of type `M`, replacing any previous one.
    #[must_use]
    #[instrument(skip(self, handler), level = "trace")]
    pub fn mutate_on<M>(
        mut self,
        handler: impl Fn(&mut State, &mut ActorCell, M) -> anyhow::Result<Next>
            + Send
            + Sync
            + 'static,
    ) -> Self
    where
        M: ActorMessage,
    {
        let type_id = TypeId::of::<M>();
        trace!(type_name = type_name::<M>(), type_id = ?type_id, "Adding message handler");
        let erased: MessageHandler<State> =
            Box::new(move |state: &mut State, cx: &mut ActorCell, envelope: Envelope| {
                match envelope.downcast::<M>() {
                    Ok(message) => handler(state, cx, message),
                    Err(envelope) => {
                        trace!(
                            expected = type_name::<M>(),
                            found = envelope.message_type(),
                            "Handler called with incompatible message type"
                        );
                        Ok(Next::Same)
                    }
                }
            });
        self.handlers.insert(type_id, erased);
        self
    }

    /// Registers a hook for lifecycle signals.
    #[must_use]
    pub fn on_signal(
        mut self,
        handler: impl Fn(&mut State, &mut ActorCell, &Signal) -> anyhow::Result<Next>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.signal_handler = Some(Box::new(handler));
        self
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Whether a handler for `M` is registered.
    #[must_use]
    pub fn handles<M: ActorMessage>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<M>())
    }
}

#[async_trait]
impl<State: Send + 'static> Behavior for Reactor<State> {
    async fn receive(&mut self, cx: &mut ActorCell, envelope: Envelope) -> anyhow::Result<Next> {
        match self.handlers.get(&envelope.message_type_id()) {
            Some(handler) => handler(&mut self.state, cx, envelope),
            None => {
                trace!(
                    message = envelope.message_type(),
                    path = %cx.path(),
                    "No handler for message, dropping"
                );
                Ok(Next::Same)
            }
        }
    }

    async fn signal(&mut self, cx: &mut ActorCell, signal: Signal) -> anyhow::Result<Next> {
        match &self.signal_handler {
            Some(handler) => handler(&mut self.state, cx, &signal),
            None => Ok(Next::Same),
        }
    }
}

impl<State: Send + fmt::Debug + 'static> fmt::Debug for Reactor<State> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactor")
            .field("state", &self.state)
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}
