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

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::actor::{ActorCell, Behavior, Next};
use crate::message::{ChildCommand, Envelope, Signal};

/// Teaches any behavior the [`ChildCommand`] protocol.
///
/// Child commands are answered from the actor's own child table; everything else goes to
/// the wrapped behavior untouched. Actors that are not wrapped pay nothing: the check is
/// part of this wrapper, not of the mailbox loop.
///
/// Install it per type with
/// [`register_intercepted`](crate::common::ActorTypeRegistryBuilder::register_intercepted)
/// or by wrapping a behavior by hand.
#[derive(Debug)]
pub struct ChildCommandInterceptor<B> {
    inner: B,
}

impl<B: Behavior> ChildCommandInterceptor<B> {
    /// Wraps a behavior.
    #[must_use]
    pub const fn new(inner: B) -> Self {
        Self { inner }
    }

    fn rewrap(next: Next) -> Next {
        match next {
            Next::Become(behavior) => {
                Next::Become(Box::new(ChildCommandInterceptor::new(behavior)))
            }
            other => other,
        }
    }
}

#[async_trait]
impl<B: Behavior> Behavior for ChildCommandInterceptor<B> {
    async fn receive(&mut self, cx: &mut ActorCell, envelope: Envelope) -> anyhow::Result<Next> {
        match envelope.downcast::<ChildCommand>() {
            Ok(command) => {
                handle_command(cx, command);
                Ok(Next::Same)
            }
            Err(envelope) => self.inner.receive(cx, envelope).await.map(Self::rewrap),
        }
    }

    async fn signal(&mut self, cx: &mut ActorCell, signal: Signal) -> anyhow::Result<Next> {
        self.inner.signal(cx, signal).await.map(Self::rewrap)
    }
}

#[instrument(skip(cx), fields(parent = %cx.path()), level = "debug")]
fn handle_command(cx: &ActorCell, command: ChildCommand) {
    match command {
        ChildCommand::SpawnChild { request, reply } => {
            let result = cx.spawn_child(request);
            if let Err(e) = &result {
                debug!(error = %e, "Child spawn failed");
            }
            reply.send(result);
        }
        ChildCommand::GetChild { address, reply } => {
            reply.send(cx.child(&address));
        }
        ChildCommand::ExistsChild { address, reply } => {
            reply.send(cx.has_child(&address));
        }
        ChildCommand::StopChild { address, reply } => {
            reply.send(cx.stop_child(&address));
        }
    }
}
