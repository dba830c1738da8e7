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

use crate::common::config::TroupeConfig;
use crate::common::{ActorHandle, ActorRef, ActorTypeRegistry, SingletonPlacement};
use crate::policy::Dispatchers;

/// State shared by every actor of one system.
///
/// Cells hold this rather than the system so that no actor keeps the system handle,
/// and with it the root guardian, alive.
pub(crate) struct RuntimeCore {
    pub(crate) config: Arc<TroupeConfig>,
    pub(crate) registry: Arc<ActorTypeRegistry>,
    pub(crate) dispatchers: Dispatchers,
    pub(crate) placement: Option<Arc<dyn SingletonPlacement>>,
}

impl RuntimeCore {
    pub(crate) fn handle_for(&self, actor: ActorRef) -> ActorHandle {
        ActorHandle::new(actor, Arc::clone(&self.config))
    }
}

impl fmt::Debug for RuntimeCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeCore")
            .field("registry", &self.registry)
            .field("placement", &self.placement)
            .finish_non_exhaustive()
    }
}

/// Owned by [`ActorSystem`](crate::common::ActorSystem).
#[derive(Debug)]
pub(crate) struct SystemInner {
    pub(crate) core: Arc<RuntimeCore>,
    pub(crate) guardian: ActorRef,
}
