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

use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::common::config::TroupeConfig;
use crate::common::{
    request_exists, request_get, request_spawn, request_stop, ActorAddress, ActorError, ActorHandle,
    ActorResult, ActorTypeRegistry, ChildScope, ScopeTarget, SystemInner,
};
use crate::message::{SpawnRequest, StopOutcome};

/// A running actor system.
///
/// Cloning shares the same system. All top-level operations are requests to the root
/// guardian, which handles them one at a time.
#[derive(Debug, Clone)]
pub struct ActorSystem {
    inner: Arc<SystemInner>,
}

impl ActorSystem {
    pub(crate) fn new(inner: SystemInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    fn target(&self) -> ScopeTarget {
        ScopeTarget::Guardian(self.inner.guardian.clone())
    }

    /// Scope for one top-level actor.
    #[must_use]
    pub fn actor(&self, type_id: impl AsRef<str>, instance_id: impl AsRef<str>) -> ChildScope {
        ChildScope::of_guardian(
            self.inner.guardian.clone(),
            ActorAddress::try_new(type_id, instance_id),
            Arc::clone(&self.inner.core.config),
        )
    }

    /// Sends a full `SpawnActor` request.
    ///
    /// # Errors
    ///
    /// Whatever the guardian reports, or [`ActorError::AskTimeout`].
    pub async fn spawn_actor(&self, request: SpawnRequest) -> ActorResult<ActorHandle> {
        request_spawn(&self.target(), request, self.config().spawn_timeout()).await
    }

    /// Sends `StopActor`. Stopping an absent actor yields [`StopOutcome::NotFound`].
    ///
    /// # Errors
    ///
    /// [`ActorError::AskTimeout`] if the guardian does not answer.
    pub async fn stop_actor(&self, address: &ActorAddress) -> ActorResult<StopOutcome> {
        request_stop(&self.target(), address.clone(), self.config().spawn_timeout()).await
    }

    /// Sends `CheckExists` with the short existence-check timeout.
    ///
    /// # Errors
    ///
    /// [`ActorError::AskTimeout`] if the guardian does not answer in time.
    pub async fn exists(&self, address: &ActorAddress) -> ActorResult<bool> {
        request_exists(&self.target(), address.clone(), self.config().exists_timeout()).await
    }

    /// Sends `GetActor`.
    ///
    /// # Errors
    ///
    /// [`ActorError::AskTimeout`] if the guardian does not answer.
    pub async fn get_actor(&self, address: &ActorAddress) -> ActorResult<Option<ActorHandle>> {
        request_get(&self.target(), address.clone(), self.config().spawn_timeout()).await
    }

    /// The frozen type registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ActorTypeRegistry> {
        &self.inner.core.registry
    }

    /// The configuration the system was launched with.
    #[must_use]
    pub fn config(&self) -> &TroupeConfig {
        &self.inner.core.config
    }

    /// Number of live top-level actors.
    #[must_use]
    pub fn top_level_count(&self) -> usize {
        self.inner
            .guardian
            .children()
            .iter()
            .filter(|actor| actor.is_alive())
            .count()
    }

    /// Whether the root guardian still runs.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.guardian.is_alive()
    }

    /// Stops every actor and waits for them.
    ///
    /// The guardian stops its children concurrently, each bounded by the actor shutdown
    /// timeout; the whole shutdown is bounded by the system shutdown timeout. Dedicated
    /// dispatcher pools are released once the last actor is gone.
    ///
    /// # Errors
    ///
    /// [`ActorError::ShutdownTimeout`] if the guardian did not finish in time.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> ActorResult<()> {
        let guardian = &self.inner.guardian;
        let timeout = self.config().system_shutdown_timeout();
        info!(actors = self.top_level_count(), "Shutting down actor system");
        guardian.stop();
        if tokio::time::timeout(timeout, guardian.terminated()).await.is_err() {
            error!(
                timeout_ms = timeout.as_millis() as u64,
                "Actor system did not shut down in time"
            );
            return Err(ActorError::ShutdownTimeout {
                path: guardian.path().clone(),
                timeout,
            });
        }
        debug!("Actor system stopped");
        Ok(())
    }
}
