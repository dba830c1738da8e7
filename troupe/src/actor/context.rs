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
use std::sync::Arc;

use crate::common::{ActorAddress, ActorTypeRegistry, Extensions};

/// Construction-time data handed to a behavior factory.
///
/// Created by the caller of a spawn (or defaulted), completed by the runtime with the
/// actor's address and a reference to the type registry, and kept by the running actor.
/// Domain data travels as typed extensions.
///
/// ```rust
/// use troupe::prelude::*;
///
/// #[derive(Debug)]
/// struct Region(&'static str);
///
/// let context = ActorContext::new().with_extension(Region("eu"));
/// assert_eq!(context.get::<Region>().map(|r| r.0), Some("eu"));
/// ```
#[derive(Clone, Default)]
pub struct ActorContext {
    address: Option<ActorAddress>,
    registry: Option<Arc<ActorTypeRegistry>>,
    extensions: Arc<Extensions>,
}

impl ActorContext {
    /// An empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The instance id of the actor being built. Empty until the runtime assigns an address.
    #[must_use]
    pub fn actor_id(&self) -> &str {
        self.address.as_ref().map_or("", ActorAddress::instance_id)
    }

    /// The full address of the actor being built.
    #[must_use]
    pub const fn address(&self) -> Option<&ActorAddress> {
        self.address.as_ref()
    }

    /// The registry the actor was resolved from.
    #[must_use]
    pub const fn registry(&self) -> Option<&Arc<ActorTypeRegistry>> {
        self.registry.as_ref()
    }

    /// Attaches a registry explicitly. The runtime only injects one when none is present.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<ActorTypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Adds a typed extension, replacing any previous value of the same type.
    #[must_use]
    pub fn with_extension<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Adds a typed extension in place.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        Arc::make_mut(&mut self.extensions).insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Borrows a typed extension.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub(crate) fn assign_address(&mut self, address: ActorAddress) {
        self.address = Some(address);
    }

    pub(crate) fn inject_registry(&mut self, registry: &Arc<ActorTypeRegistry>) {
        if self.registry.is_none() {
            self.registry = Some(Arc::clone(registry));
        }
    }
}

impl fmt::Debug for ActorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorContext")
            .field("address", &self.address)
            .field("has_registry", &self.registry.is_some())
            .field("extensions", &self.extensions.len())
            .finish()
    }
}
