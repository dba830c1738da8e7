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

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::actor::{lifecycle, ActorCell, ActorContext, RootGuardian};
use crate::common::config::{TroupeConfig, CONFIG};
use crate::common::{
    ActorAddress, ActorError, ActorPath, ActorRef, ActorResult, ActorSystem, ActorTypeId,
    ActorTypeRegistry, RuntimeCore, SingletonPlacement, SystemInner,
};
use crate::message::mailbox;
use crate::policy::{Dispatchers, Tags};

/// Entry point for launching an actor system.
#[derive(Debug, Default, Clone, Copy)]
pub struct TroupeApp;

impl TroupeApp {
    /// Launches a system with the global configuration and no singleton placement.
    ///
    /// # Errors
    ///
    /// See [`SystemBuilder::launch`].
    pub async fn launch_async(registry: Arc<ActorTypeRegistry>) -> ActorResult<ActorSystem> {
        Self::builder(registry).launch().await
    }

    /// Starts configuring a system.
    #[must_use]
    pub fn builder(registry: Arc<ActorTypeRegistry>) -> SystemBuilder {
        SystemBuilder {
            registry,
            config: None,
            placement: None,
        }
    }
}

/// Configures and launches an [`ActorSystem`].
pub struct SystemBuilder {
    registry: Arc<ActorTypeRegistry>,
    config: Option<TroupeConfig>,
    placement: Option<Arc<dyn SingletonPlacement>>,
}

impl SystemBuilder {
    /// Uses `config` instead of the global configuration.
    #[must_use]
    pub fn with_config(mut self, config: TroupeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Installs a singleton placement.
    #[must_use]
    pub fn with_singleton_placement(mut self, placement: impl SingletonPlacement) -> Self {
        self.placement = Some(Arc::new(placement));
        self
    }

    /// Validates the configuration and starts the root guardian on the current runtime.
    ///
    /// # Errors
    ///
    /// [`ActorError::InvalidConfiguration`] for an invalid configuration and
    /// [`ActorError::UnsupportedExecutionModel`] outside a Tokio runtime.
    #[instrument(skip(self), fields(types = self.registry.len()))]
    pub async fn launch(self) -> ActorResult<ActorSystem> {
        let config = Arc::new(self.config.unwrap_or_else(|| CONFIG.clone()));
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| {
            let detail = format!("actor system needs a Tokio runtime: {e}");
            ActorError::UnsupportedExecutionModel(detail)
        })?;

        let dispatchers = Dispatchers::new(runtime, Arc::clone(&config));
        let root_dispatcher = dispatchers.default_dispatcher();
        let core = Arc::new(RuntimeCore {
            config: Arc::clone(&config),
            registry: self.registry,
            dispatchers,
            placement: self.placement,
        });

        let (sender, inbox) = mailbox(config.limits.guardian_mailbox_capacity);
        let guardian = ActorRef::new(
            ActorAddress::new(ActorTypeId::of::<RootGuardian>(), "root"),
            ActorPath::root(),
            sender,
            CancellationToken::new(),
            root_dispatcher,
            Tags::new(),
        );
        let cell = ActorCell::new(guardian.clone(), None, core.clone(), ActorContext::new());
        lifecycle::start(cell, Box::new(RootGuardian), inbox);

        info!(path = %guardian.path(), "Actor system launched");
        Ok(ActorSystem::new(SystemInner { core, guardian }))
    }
}

impl fmt::Debug for SystemBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemBuilder")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("placement", &self.placement)
            .finish()
    }
}
