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

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Troupe
//!
//! Troupe is a dynamic actor lifecycle and supervision core built on Tokio. Actors are
//! addressed by an `(actor type, instance id)` pair, created from factories held in a
//! frozen [`ActorTypeRegistry`](crate::common::ActorTypeRegistry), and scheduled under a
//! composable [`ExecutionPolicy`](crate::policy::ExecutionPolicy).
//!
//! ## Key Concepts
//!
//! - **Registry (`ActorTypeRegistry`)**: maps an [`ActorTypeId`](crate::common::ActorTypeId)
//!   to a factory `ActorContext -> Behavior`. Filled during startup, then frozen.
//! - **Root guardian**: the top-level actor that serializes `SpawnActor`, `StopActor`,
//!   `CheckExists` and `GetActor` requests, so only one factory invocation ever happens
//!   per address.
//! - **Handles (`ActorHandle`)**: `tell`, `ask` with timeout and fallback, `stop`, and
//!   `child(...)` for the same spawn protocol one level down.
//! - **Child interception (`ChildCommandInterceptor`)**: an opt-in wrapper that teaches an
//!   actor the `SpawnChild`/`GetChild`/`ExistsChild`/`StopChild` protocol.
//! - **Execution policy**: dispatcher, mailbox and tag axes composed into
//!   [`SpawnProps`](crate::policy::SpawnProps).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use troupe::prelude::*;
//!
//! #[troupe_message]
//! struct Greet {
//!     reply: ReplyTo<String>,
//! }
//!
//! let mut builder = ActorTypeRegistry::builder();
//! builder.register("greeter", |cx: &ActorContext| {
//!     let id = cx.actor_id().to_string();
//!     Reactor::new(id).mutate_on::<Greet>(|id, _cx, msg| {
//!         msg.reply.send(format!("hello from {id}"));
//!         Ok(Next::Same)
//!     })
//! })?;
//!
//! let system = TroupeApp::launch_async(builder.freeze()).await?;
//! let greeter = system
//!     .actor("greeter", "g-1")
//!     .get_or_spawn(SupervisionStrategy::restart())
//!     .await?;
//! let answer = greeter
//!     .ask(|reply| Greet { reply }, Duration::from_millis(100))
//!     .await?;
//! system.shutdown().await?;
//! ```

/// Actor behaviors, the runtime cell, supervision and child interception.
pub(crate) mod actor;

/// System bootstrap, handles, registry, addressing, configuration and errors.
pub(crate) mod common;

/// Envelopes, mailboxes, lifecycle signals and the command protocols.
pub(crate) mod message;

/// Execution policy composition and dispatcher pools.
pub(crate) mod policy;

/// Core traits shared across the crate.
pub(crate) mod traits;

/// A prelude module for conveniently importing the most commonly used items.
///
/// # Re-exports
///
/// ## Macros (from `troupe-macro`)
/// *   [`troupe_macro::troupe_message`]: Attribute macro for declaring messages.
///
/// ## External Crates
/// *   [`async_trait::async_trait`]: needed to implement
///     [`Behavior`](crate::actor::Behavior) by hand.
///
/// ## Core Types
/// *   [`crate::common::TroupeApp`] and [`crate::common::SystemBuilder`]: system bootstrap.
/// *   [`crate::common::ActorSystem`]: the running system and its root guardian.
/// *   [`crate::common::ActorHandle`] and [`crate::common::ChildScope`]: the ask/tell façade.
/// *   [`crate::common::ActorTypeRegistry`]: factories keyed by [`crate::common::ActorTypeId`].
/// *   [`crate::actor::Behavior`], [`crate::actor::Reactor`], [`crate::actor::Next`]: actor logic.
/// *   [`crate::policy::ExecutionPolicy`]: dispatcher, mailbox and tag axes.
/// *   [`crate::actor::SupervisionStrategy`]: failure handling applied at spawn time.
pub mod prelude {
    pub use troupe_macro::*;

    pub use async_trait::async_trait;

    pub use crate::actor::{
        ActorCell, ActorContext, Behavior, ChildCommandInterceptor, Next, Reactor,
        RestartLimiter, RestartLimiterConfig, RestartLimitExceeded, SupervisionDecision,
        SupervisionStrategy,
    };
    pub use crate::common::config::{
        DispatcherConfig, LimitsConfig, MailboxConfig, TimeoutConfig, TroupeConfig, CONFIG,
    };
    pub use crate::common::{
        ActorAddress, ActorError, ActorHandle, ActorPath, ActorRef, ActorResult, ActorSystem,
        ActorTypeId, ActorTypeRegistry, ActorTypeRegistryBuilder, ChildScope,
        SingleNodePlacement, SingletonHost, SingletonPlacement, SystemBuilder, TroupeApp,
        ADDRESS_SEPARATOR,
    };
    pub use crate::message::{
        ChildCommand, Envelope, GuardianCommand, ReplyTo, Signal, SpawnRequest, StopOutcome,
        TerminationReason,
    };
    pub use crate::policy::{
        compose, Dispatcher, ExecutionPolicy, Mailbox, SpawnProps, Tags, VirtualThreads,
    };
    pub use crate::traits::ActorMessage;
}
