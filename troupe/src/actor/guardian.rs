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

use std::panic::{catch_unwind, AssertUnwindSafe};

use async_trait::async_trait;
use tracing::{debug, error, instrument, warn};

use crate::actor::{ActorCell, Behavior, Next};
use crate::common::panic_message;
use crate::message::{Envelope, GuardianCommand};

/// The top-level actor owning every first-level actor.
///
/// Answers [`GuardianCommand`]s one at a time. Failures of a single command, including
/// panics, are reported to that command's requester and never stop the guardian.
#[derive(Debug, Default)]
pub(crate) struct RootGuardian;

#[async_trait]
impl Behavior for RootGuardian {
    async fn receive(&mut self, cx: &mut ActorCell, envelope: Envelope) -> anyhow::Result<Next> {
        match envelope.downcast::<GuardianCommand>() {
            Ok(command) => {
                let cell: &ActorCell = cx;
                let outcome = catch_unwind(AssertUnwindSafe(|| handle_command(cell, command)));
                if let Err(payload) = outcome {
                    error!(panic = %panic_message(&*payload), "Guardian command panicked");
                }
            }
            Err(other) => {
                warn!(message = other.message_type(), "Guardian ignores unexpected message");
            }
        }
        Ok(Next::Same)
    }
}

#[instrument(skip(cx), level = "debug")]
fn handle_command(cx: &ActorCell, command: GuardianCommand) {
    match command {
        GuardianCommand::SpawnActor { request, reply } => {
            let result = cx.spawn_child(request);
            if let Err(e) = &result {
                debug!(error = %e, "Spawn request failed");
            }
            reply.send(result);
        }
        GuardianCommand::StopActor { address, reply } => {
            reply.send(cx.stop_child(&address));
        }
        GuardianCommand::CheckExists { address, reply } => {
            reply.send(cx.has_child(&address));
        }
        GuardianCommand::GetActor { address, reply } => {
            reply.send(cx.child(&address));
        }
    }
}
