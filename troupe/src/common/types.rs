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

//! Crate-internal type aliases shared by the runtime.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::actor::{ActorCell, ActorContext, Behavior, Next};
use crate::message::{Envelope, Signal};

/// A factory turning a construction context into a fresh behavior.
pub(crate) type BehaviorFactory =
    Arc<dyn Fn(&ActorContext) -> anyhow::Result<Box<dyn Behavior>> + Send + Sync + 'static>;

/// A type-dispatched message handler of a [`Reactor`](crate::actor::Reactor).
pub(crate) type MessageHandler<State> = Box<
    dyn Fn(&mut State, &mut ActorCell, Envelope) -> anyhow::Result<Next> + Send + Sync + 'static,
>;

/// A lifecycle signal hook of a [`Reactor`](crate::actor::Reactor).
pub(crate) type SignalHandler<State> = Box<
    dyn Fn(&mut State, &mut ActorCell, &Signal) -> anyhow::Result<Next> + Send + Sync + 'static,
>;

/// Map storing message handlers (`TypeId` -> handler).
///
/// Populated while the reactor is built and read-only afterwards, on a single task.
pub(crate) type ReactorMap<State> = HashMap<TypeId, MessageHandler<State>>;

/// Typed extension values carried by an [`ActorContext`].
pub(crate) type Extensions = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Renders a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
