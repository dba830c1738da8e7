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

//! System bootstrap, handles, registry, addressing, configuration and errors.

pub use actor_handle::ActorHandle;
pub use actor_ref::ActorRef;
pub use actor_system::ActorSystem;
pub use address::{ActorAddress, ActorPath, ActorTypeId, ADDRESS_SEPARATOR};
pub use child_scope::ChildScope;
pub use error::{ActorError, ActorResult};
pub use registry::{ActorTypeRegistry, ActorTypeRegistryBuilder};
pub use singleton::{SingleNodePlacement, SingletonHost, SingletonPlacement};
pub use troupe_app::{SystemBuilder, TroupeApp};

pub(crate) use actor_ref::ChildEntry;
pub(crate) use child_scope::{
    request_exists, request_get, request_spawn, request_stop, ScopeTarget,
};
pub(crate) use system_inner::{RuntimeCore, SystemInner};
pub(crate) use types::*;

mod actor_handle;
mod actor_ref;
mod actor_system;
mod address;
mod child_scope;
/// Runtime configuration loaded from XDG locations.
pub mod config;
mod error;
mod registry;
mod singleton;
mod system_inner;
mod troupe_app;
mod types;
