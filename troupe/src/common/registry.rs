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

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, instrument, trace};

use crate::actor::{ActorContext, Behavior, ChildCommandInterceptor};
use crate::common::{
    panic_message, ActorAddress, ActorError, ActorResult, ActorTypeId, BehaviorFactory,
};

/// Collects actor-type factories during startup.
///
/// Registration is the only write phase. [`ActorTypeRegistryBuilder::freeze`] ends it and
/// yields the immutable registry shared by the whole system.
#[derive(Default)]
pub struct ActorTypeRegistryBuilder {
    factories: HashMap<ActorTypeId, BehaviorFactory>,
}

impl ActorTypeRegistryBuilder {
    /// Registers an infallible factory.
    ///
    /// # Errors
    ///
    /// [`ActorError::InvalidTypeId`] for a malformed id, [`ActorError::DuplicateType`] if
    /// the id is already registered.
    pub fn register<B, F>(
        &mut self,
        type_id: impl AsRef<str>,
        factory: F,
    ) -> ActorResult<&mut Self>
    where
        B: Behavior,
        F: Fn(&ActorContext) -> B + Send + Sync + 'static,
    {
        self.insert(
            type_id,
            Arc::new(move |cx: &ActorContext| {
                Ok::<_, anyhow::Error>(Box::new(factory(cx)) as Box<dyn Behavior>)
            }),
        )
    }

    /// Registers a factory that may refuse to build a behavior.
    ///
    /// # Errors
    ///
    /// Same as [`ActorTypeRegistryBuilder::register`].
    pub fn register_fn<B, F>(
        &mut self,
        type_id: impl AsRef<str>,
        factory: F,
    ) -> ActorResult<&mut Self>
    where
        B: Behavior,
        F: Fn(&ActorContext) -> anyhow::Result<B> + Send + Sync + 'static,
    {
        self.insert(
            type_id,
            Arc::new(move |cx: &ActorContext| {
                factory(cx).map(|behavior| Box::new(behavior) as Box<dyn Behavior>)
            }),
        )
    }

    /// Registers a factory whose actors answer the child-command protocol.
    ///
    /// # Errors
    ///
    /// Same as [`ActorTypeRegistryBuilder::register`].
    pub fn register_intercepted<B, F>(
        &mut self,
        type_id: impl AsRef<str>,
        factory: F,
    ) -> ActorResult<&mut Self>
    where
        B: Behavior,
        F: Fn(&ActorContext) -> B + Send + Sync + 'static,
    {
        self.insert(
            type_id,
            Arc::new(move |cx: &ActorContext| {
                let behavior = ChildCommandInterceptor::new(factory(cx));
                Ok::<_, anyhow::Error>(Box::new(behavior) as Box<dyn Behavior>)
            }),
        )
    }

    fn insert(
        &mut self,
        type_id: impl AsRef<str>,
        factory: BehaviorFactory,
    ) -> ActorResult<&mut Self> {
        let type_id = ActorTypeId::new(type_id)?;
        if self.factories.contains_key(&type_id) {
            error!(%type_id, "Rejecting duplicate actor type registration");
            return Err(ActorError::DuplicateType(type_id));
        }
        debug!(%type_id, "Registered actor type");
        self.factories.insert(type_id, factory);
        Ok(self)
    }

    /// Ends registration.
    #[must_use]
    pub fn freeze(self) -> Arc<ActorTypeRegistry> {
        debug!(types = self.factories.len(), "Actor type registry frozen");
        Arc::new(ActorTypeRegistry {
            factories: self.factories,
        })
    }
}

impl fmt::Debug for ActorTypeRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorTypeRegistryBuilder")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Immutable map from actor type to factory.
///
/// Read concurrently by every spawning actor without locking.
pub struct ActorTypeRegistry {
    factories: HashMap<ActorTypeId, BehaviorFactory>,
}

impl ActorTypeRegistry {
    /// Starts the registration phase.
    #[must_use]
    pub fn builder() -> ActorTypeRegistryBuilder {
        ActorTypeRegistryBuilder::default()
    }

    /// Builds a fresh behavior of the given type.
    ///
    /// Injects this registry into `context` when it does not carry one yet, so that the
    /// built actor can spawn registered children itself. A factory error or panic is
    /// caught and reported as [`ActorError::SpawnFailed`].
    ///
    /// # Errors
    ///
    /// [`ActorError::UnknownType`] or [`ActorError::SpawnFailed`].
    #[instrument(skip(self, context), fields(actor_id = context.actor_id()))]
    pub fn resolve(
        self: &Arc<Self>,
        type_id: &ActorTypeId,
        context: &mut ActorContext,
    ) -> ActorResult<Box<dyn Behavior>> {
        let factory = self
            .factories
            .get(type_id)
            .ok_or_else(|| ActorError::UnknownType(type_id.clone()))?;
        context.inject_registry(self);
        let context: &ActorContext = context;

        let failed = |reason: String| {
            let address = context
                .address()
                .cloned()
                .unwrap_or_else(|| ActorAddress::new(type_id.clone(), context.actor_id()));
            error!(%address, %reason, "Actor factory failed");
            ActorError::SpawnFailed { address, reason }
        };
        match catch_unwind(AssertUnwindSafe(|| factory(context))) {
            Ok(Ok(behavior)) => {
                trace!("Behavior built");
                Ok(behavior)
            }
            Ok(Err(e)) => Err(failed(format!("{e:#}"))),
            Err(payload) => {
                let message = panic_message(&*payload);
                Err(failed(format!("factory panicked: {message}")))
            }
        }
    }

    /// Whether a factory is registered for `type_id`.
    #[must_use]
    pub fn contains(&self, type_id: &ActorTypeId) -> bool {
        self.factories.contains_key(type_id)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// The registered type ids, sorted.
    #[must_use]
    pub fn type_ids(&self) -> Vec<ActorTypeId> {
        let mut ids: Vec<_> = self.factories.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl fmt::Debug for ActorTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorTypeRegistry")
            .field("types", &self.type_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Reactor;

    fn registry() -> Arc<ActorTypeRegistry> {
        let mut builder = ActorTypeRegistry::builder();
        builder
            .register("counter", |_cx: &ActorContext| Reactor::new(0_u64))
            .unwrap()
            .register_fn("picky", |cx: &ActorContext| {
                anyhow::ensure!(cx.actor_id() != "rejected", "instance refused");
                Ok(Reactor::new(()))
            })
            .unwrap()
            .register("explosive", |_cx: &ActorContext| -> Reactor<()> { panic!("boom") })
            .unwrap();
        builder.freeze()
    }

    fn context_for(type_id: &str, instance: &str) -> ActorContext {
        let mut context = ActorContext::new();
        context.assign_address(ActorAddress::try_new(type_id, instance).unwrap());
        context
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut builder = ActorTypeRegistry::builder();
        builder.register("counter", |_cx: &ActorContext| Reactor::new(0_u8)).unwrap();
        let err = builder
            .register("counter", |_cx: &ActorContext| Reactor::new(1_u8))
            .unwrap_err();
        assert_eq!(err, ActorError::DuplicateType(ActorTypeId::new("counter").unwrap()));
        assert_eq!(builder.freeze().len(), 1);
    }

    #[test]
    fn unknown_type_leaves_registry_untouched() {
        let registry = registry();
        let before = registry.type_ids();
        let missing = ActorTypeId::new("no-such-type").unwrap();
        let err = registry.resolve(&missing, &mut ActorContext::new()).err();
        assert_eq!(err, Some(ActorError::UnknownType(missing)));
        assert_eq!(registry.type_ids(), before);
    }

    #[test]
    fn resolve_injects_registry_when_absent() {
        let registry = registry();
        let mut context = context_for("counter", "1");
        assert!(context.registry().is_none());
        registry
            .resolve(&ActorTypeId::new("counter").unwrap(), &mut context)
            .unwrap();
        assert!(context.registry().is_some_and(|r| Arc::ptr_eq(r, &registry)));
    }

    #[test]
    fn resolve_keeps_a_registry_the_caller_attached() {
        let registry = registry();
        let other = ActorTypeRegistry::builder().freeze();
        let mut context = context_for("counter", "1").with_registry(Arc::clone(&other));
        registry
            .resolve(&ActorTypeId::new("counter").unwrap(), &mut context)
            .unwrap();
        assert!(context.registry().is_some_and(|r| Arc::ptr_eq(r, &other)));
    }

    #[test]
    fn factory_errors_and_panics_become_spawn_failures() {
        let registry = registry();

        let mut refused = context_for("picky", "rejected");
        let err = registry
            .resolve(&ActorTypeId::new("picky").unwrap(), &mut refused)
            .err();
        assert!(matches!(
            err,
            Some(ActorError::SpawnFailed { ref reason, .. }) if reason.contains("instance refused")
        ));

        let mut doomed = context_for("explosive", "1");
        let err = registry
            .resolve(&ActorTypeId::new("explosive").unwrap(), &mut doomed)
            .err();
        assert!(matches!(
            err,
            Some(ActorError::SpawnFailed { ref reason, .. }) if reason.contains("boom")
        ));
    }
}
