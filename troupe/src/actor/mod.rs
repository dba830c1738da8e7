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

//! Behaviors, the actor cell and the runtime pieces that drive them.
//!
//! *   [`Behavior`], [`Next`] and the closure-based [`Reactor`] define what an actor does.
//! *   [`ActorCell`] is the actor's view of itself and its children while it runs.
//! *   [`ActorContext`] carries construction-time data into factories.
//! *   [`SupervisionStrategy`] and [`RestartLimiter`] govern failures.
//! *   [`ChildCommandInterceptor`] adds the child-command protocol to any behavior.

pub use actor_cell::ActorCell;
pub use behavior::{Behavior, Next, Reactor};
pub use context::ActorContext;
pub use interceptor::ChildCommandInterceptor;
pub use restart_limiter::{RestartLimitExceeded, RestartLimiter, RestartLimiterConfig};
pub use supervision::{SupervisionDecision, SupervisionStrategy};

pub(crate) use actor_cell::Launch;
pub(crate) use guardian::RootGuardian;
pub(crate) use supervision::{supervise, Escalation};

mod actor_cell;
mod behavior;
mod context;
mod guardian;
mod interceptor;
pub(crate) mod lifecycle;
mod restart_limiter;
mod supervision;
