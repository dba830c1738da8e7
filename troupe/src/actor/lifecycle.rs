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

//! The mailbox loop every actor runs.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use tracing::{debug, error, trace, warn, Instrument};

use crate::actor::{ActorCell, Behavior, Escalation, Next};
use crate::common::{panic_message, ActorRef};
use crate::message::{Envelope, MailboxReceiver, Signal, TerminationReason};

/// Spawns the mailbox loop on the actor's dispatcher.
pub(crate) fn start(cell: ActorCell, behavior: Box<dyn Behavior>, inbox: MailboxReceiver) {
    let actor = cell.actor_ref().clone();
    let span = tracing::debug_span!(
        "actor",
        path = %actor.path(),
        address = %actor.address(),
        tags = %actor.tags(),
        dispatcher = actor.dispatcher_label(),
    );
    let handle = actor.dispatcher().handle.clone();
    actor
        .tracker()
        .spawn_on(run(cell, behavior, inbox).instrument(span), &handle);
    actor.tracker().close();
}

/// One step of the loop after a handler returned.
enum Step {
    Continue,
    Exit(TerminationReason),
}

async fn run(mut cell: ActorCell, mut behavior: Box<dyn Behavior>, mut inbox: MailboxReceiver) {
    let actor = cell.actor_ref().clone();
    let token = actor.token().clone();
    let cooperative = actor.dispatcher().cooperative;
    debug!("Actor started");

    let mut exit = match deliver_signal(&mut behavior, &mut cell, Signal::PreStart).await {
        Step::Continue => None,
        Step::Exit(reason) => Some(reason),
    };

    while exit.is_none() {
        let envelope = tokio::select! {
            biased;
            () = token.cancelled() => {
                exit = Some(cancellation_reason(&cell));
                break;
            }
            envelope = inbox.recv() => envelope,
        };
        let Some(envelope) = envelope else {
            exit = Some(TerminationReason::InboxClosed);
            break;
        };
        if let Step::Exit(reason) = deliver_message(&mut behavior, &mut cell, envelope).await {
            exit = Some(reason);
        }
        if cooperative {
            tokio::task::yield_now().await;
        }
    }

    let reason = exit.unwrap_or(TerminationReason::Normal);
    let dropped = inbox.close_and_drain();
    if dropped > 0 {
        debug!(dropped, "Discarded undelivered messages");
    }
    token.cancel();
    terminate_children(&actor, cell.config().actor_shutdown_timeout()).await;

    let post_stop = Signal::PostStop {
        reason: reason.clone(),
    };
    if let Step::Exit(failure) = deliver_signal(&mut behavior, &mut cell, post_stop).await {
        if failure.is_failure() {
            warn!(%failure, "PostStop hook failed");
        }
    }
    if let Some(parent) = cell.parent_ref() {
        parent.forget_child(&actor.address().name(), actor.uid());
    }
    debug!(%reason, "Actor stopped");
}

fn cancellation_reason(cell: &ActorCell) -> TerminationReason {
    match cell.parent_ref() {
        Some(parent) if parent.token().is_cancelled() => TerminationReason::ParentShutdown,
        _ => TerminationReason::Stopped,
    }
}

async fn deliver_message(
    behavior: &mut Box<dyn Behavior>,
    cell: &mut ActorCell,
    envelope: Envelope,
) -> Step {
    trace!(
        message = envelope.message_type(),
        queued_us = envelope.sent_at().elapsed().as_micros() as u64,
        "Processing message"
    );
    let outcome = AssertUnwindSafe(behavior.receive(cell, envelope))
        .catch_unwind()
        .await;
    apply(behavior, outcome)
}

async fn deliver_signal(
    behavior: &mut Box<dyn Behavior>,
    cell: &mut ActorCell,
    signal: Signal,
) -> Step {
    trace!(?signal, "Delivering signal");
    let outcome = AssertUnwindSafe(behavior.signal(cell, signal))
        .catch_unwind()
        .await;
    apply(behavior, outcome)
}

fn apply(
    behavior: &mut Box<dyn Behavior>,
    outcome: Result<anyhow::Result<Next>, Box<dyn std::any::Any + Send>>,
) -> Step {
    match outcome {
        Ok(Ok(Next::Same)) => Step::Continue,
        Ok(Ok(Next::Become(next))) => {
            trace!("Behavior replaced");
            *behavior = next;
            Step::Continue
        }
        Ok(Ok(Next::Stop)) => Step::Exit(TerminationReason::Normal),
        Ok(Err(e)) => match e.downcast::<Escalation>() {
            Ok(Escalation(reason)) => Step::Exit(reason),
            Err(e) => {
                let reason = format!("{e:#}");
                error!(error = %reason, "Handler failed, stopping");
                Step::Exit(TerminationReason::Failed(reason))
            }
        },
        Err(payload) => {
            let message = panic_message(&*payload);
            error!(panic = %message, "Handler panicked, stopping");
            Step::Exit(TerminationReason::Panic(message))
        }
    }
}

/// Waits for every child to finish, concurrently, each bounded by `timeout`.
///
/// Children were already cancelled through the token hierarchy. Timeouts are logged
/// once, aggregated.
async fn terminate_children(actor: &ActorRef, timeout: Duration) {
    let children = actor.children();
    if children.is_empty() {
        return;
    }
    trace!(count = children.len(), "Waiting for children to stop");

    let waits = children.iter().map(|child| async move {
        child.stop();
        tokio::time::timeout(timeout, child.terminated())
            .await
            .map_err(|_| child.path().to_string())
    });
    let timed_out: Vec<String> = join_all(waits)
        .await
        .into_iter()
        .filter_map(Result::err)
        .collect();

    if !timed_out.is_empty() {
        error!(
            "Shutdown timeout ({} ms) for {} child(ren) of {}: [{}]",
            timeout.as_millis(),
            timed_out.len(),
            actor.path(),
            timed_out.join(", ")
        );
    }
    trace!("All children stopped");
}
