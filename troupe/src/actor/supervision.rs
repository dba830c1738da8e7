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

//! What happens when a behavior fails.
//!
//! A failure is a handler or a `PreStart` hook returning an error or panicking. With
//! [`SupervisionStrategy::None`] the behavior runs unwrapped and any failure stops the
//! actor. Every other strategy wraps the behavior once at spawn time.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, error, warn};

use crate::actor::{ActorCell, ActorContext, Behavior, Next, RestartLimiter, RestartLimiterConfig};
use crate::common::{panic_message, ActorAddress, ActorTypeRegistry};
use crate::message::{Envelope, Signal, TerminationReason};

/// Reaction to an unhandled failure, chosen at spawn time.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SupervisionStrategy {
    /// No wrapping. A failure stops the actor.
    #[default]
    None,
    /// Replace the failed behavior with a fresh one from its factory.
    Restart {
        /// Restart limits. `None` uses the `[supervision]` configuration.
        limit: Option<RestartLimiterConfig>,
    },
    /// Stop the actor, logging the failure.
    Stop,
    /// Drop the failing message and keep the current behavior.
    Resume,
}

/// What a supervised actor does about one failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupervisionDecision {
    /// Keep going with the same behavior.
    Resume,
    /// Rebuild the behavior.
    Restart,
    /// Terminate.
    Stop,
}

impl SupervisionStrategy {
    /// Restart with the configured limits.
    #[must_use]
    pub const fn restart() -> Self {
        Self::Restart { limit: None }
    }

    /// Restart with explicit limits.
    #[must_use]
    pub const fn restart_with_limit(limit: RestartLimiterConfig) -> Self {
        Self::Restart { limit: Some(limit) }
    }

    /// The decision for a failure.
    #[must_use]
    pub const fn decide(&self, _failure: &TerminationReason) -> SupervisionDecision {
        match self {
            Self::None | Self::Stop => SupervisionDecision::Stop,
            Self::Resume => SupervisionDecision::Resume,
            Self::Restart { .. } => SupervisionDecision::Restart,
        }
    }
}

/// Applies `strategy` to a freshly resolved behavior.
pub(crate) fn supervise(
    strategy: SupervisionStrategy,
    behavior: Box<dyn Behavior>,
    address: &ActorAddress,
    context: &ActorContext,
    registry: &Arc<ActorTypeRegistry>,
    defaults: &RestartLimiterConfig,
) -> Box<dyn Behavior> {
    let limiter = match &strategy {
        SupervisionStrategy::None => return behavior,
        SupervisionStrategy::Restart { limit } => Some(RestartLimiter::new(
            limit.clone().unwrap_or_else(|| defaults.clone()),
        )),
        SupervisionStrategy::Stop | SupervisionStrategy::Resume => None,
    };
    Box::new(Supervised {
        inner: behavior,
        strategy,
        limiter,
        address: address.clone(),
        context: context.clone(),
        registry: Arc::clone(registry),
    })
}

/// A failure the strategy decided to stop on, handed to the mailbox loop unchanged.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub(crate) struct Escalation(pub(crate) TerminationReason);

type Caught = Result<anyhow::Result<Next>, Box<dyn Any + Send>>;

fn classify(outcome: Caught) -> Result<Next, TerminationReason> {
    match outcome {
        Ok(Ok(next)) => Ok(next),
        Ok(Err(e)) => Err(TerminationReason::Failed(format!("{e:#}"))),
        Err(payload) => Err(TerminationReason::Panic(panic_message(&*payload))),
    }
}

/// A behavior guarded by a supervision strategy.
struct Supervised {
    inner: Box<dyn Behavior>,
    strategy: SupervisionStrategy,
    limiter: Option<RestartLimiter>,
    address: ActorAddress,
    context: ActorContext,
    registry: Arc<ActorTypeRegistry>,
}

/// Outcome of one restart attempt.
enum Restarted {
    Ready(Next),
    Failed(TerminationReason),
}

impl Supervised {
    fn adopt(&mut self, next: Next) -> Next {
        match next {
            Next::Become(next) => {
                self.inner = next;
                Next::Same
            }
            next => next,
        }
    }

    async fn on_failure(
        &mut self,
        cx: &mut ActorCell,
        mut failure: TerminationReason,
    ) -> anyhow::Result<Next> {
        loop {
            match self.strategy.decide(&failure) {
                SupervisionDecision::Resume => {
                    warn!(path = %cx.path(), %failure, "Resuming after failure");
                    return Ok(Next::Same);
                }
                SupervisionDecision::Stop => {
                    error!(path = %cx.path(), %failure, "Stopping after failure");
                    return Err(Escalation(failure).into());
                }
                SupervisionDecision::Restart => match self.restart(cx, failure).await? {
                    Restarted::Ready(next) => return Ok(next),
                    Restarted::Failed(again) => failure = again,
                },
            }
        }
    }

    async fn restart(
        &mut self,
        cx: &mut ActorCell,
        failure: TerminationReason,
    ) -> anyhow::Result<Restarted> {
        let backoff = match self.limiter.as_mut().map(RestartLimiter::try_restart) {
            Some(Err(exceeded)) => {
                error!(path = %cx.path(), %failure, %exceeded, "Not restarting");
                return Err(exceeded.into());
            }
            Some(Ok(backoff)) => backoff,
            None => Duration::ZERO,
        };
        warn!(
            path = %cx.path(),
            %failure,
            backoff_ms = backoff.as_millis() as u64,
            "Restarting after failure"
        );

        let pre_restart = Signal::PreRestart { reason: failure };
        let outcome = AssertUnwindSafe(self.inner.signal(cx, pre_restart))
            .catch_unwind()
            .await;
        if let Err(hook_failure) = classify(outcome) {
            warn!(path = %cx.path(), %hook_failure, "PreRestart hook failed");
        }
        let token = cx.actor_ref().token().clone();
        if backoff.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::select! {
                () = tokio::time::sleep(backoff) => {}
                () = token.cancelled() => {}
            }
        }
        if token.is_cancelled() {
            return Ok(Restarted::Ready(Next::Stop));
        }

        let mut context = self.context.clone();
        self.inner = self.registry.resolve(self.address.type_id(), &mut context)?;
        let outcome = AssertUnwindSafe(self.inner.signal(cx, Signal::PreStart))
            .catch_unwind()
            .await;
        match classify(outcome) {
            Ok(next) => {
                debug!(path = %cx.path(), "Restarted");
                Ok(Restarted::Ready(self.adopt(next)))
            }
            Err(again) => Ok(Restarted::Failed(again)),
        }
    }
}

#[async_trait]
impl Behavior for Supervised {
    async fn receive(&mut self, cx: &mut ActorCell, envelope: Envelope) -> anyhow::Result<Next> {
        let outcome = AssertUnwindSafe(self.inner.receive(cx, envelope))
            .catch_unwind()
            .await;
        match classify(outcome) {
            Ok(next) => Ok(self.adopt(next)),
            Err(failure) => self.on_failure(cx, failure).await,
        }
    }

    async fn signal(&mut self, cx: &mut ActorCell, signal: Signal) -> anyhow::Result<Next> {
        let starting = matches!(signal, Signal::PreStart);
        let outcome = AssertUnwindSafe(self.inner.signal(cx, signal))
            .catch_unwind()
            .await;
        match classify(outcome) {
            Ok(next) => Ok(self.adopt(next)),
            Err(failure) if starting => self.on_failure(cx, failure).await,
            Err(failure) => Err(Escalation(failure).into()),
        }
    }
}
