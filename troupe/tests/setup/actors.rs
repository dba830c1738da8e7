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
#![allow(unused)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;
use troupe::prelude::*;

use crate::setup::messages::{
    Explode, Fail, GetCount, Hold, Increment, Ping, Retire, SlowPing, WhichThread,
};

/// Shared counters the test actors report into.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    built: Arc<AtomicUsize>,
    started: Arc<AtomicUsize>,
    restarts: Arc<AtomicUsize>,
    discarded_replies: Arc<AtomicUsize>,
    stop_reasons: Arc<Mutex<Vec<TerminationReason>>>,
}

impl Recorder {
    /// Factory invocations so far.
    pub fn built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }

    /// `PreStart` signals seen.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// `PreRestart` signals seen.
    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }

    /// Replies that found no waiting requester.
    pub fn discarded_replies(&self) -> usize {
        self.discarded_replies.load(Ordering::SeqCst)
    }

    /// Reasons carried by `PostStop` signals, in arrival order.
    pub fn stop_reasons(&self) -> Vec<TerminationReason> {
        self.stop_reasons.lock().clone()
    }
}

/// Extension read by the greeter factory.
#[derive(Debug, Clone, Copy)]
pub struct Salutation(pub &'static str);

/// Counts `Increment`s; fails, panics or stops on request.
pub fn counter(recorder: &Recorder) -> Reactor<usize> {
    recorder.built.fetch_add(1, Ordering::SeqCst);
    let recorder = recorder.clone();
    Reactor::new(0_usize)
        .mutate_on::<Increment>(|count, _cx, _msg| {
            *count += 1;
            Ok(Next::Same)
        })
        .mutate_on::<GetCount>(|count, _cx, msg| {
            msg.reply.send(*count);
            Ok(Next::Same)
        })
        .mutate_on::<Fail>(|_count, _cx, _msg| Err(anyhow::anyhow!("asked to fail")))
        .mutate_on::<Explode>(|_count, _cx, _msg| panic!("asked to explode"))
        .mutate_on::<Retire>(|_count, _cx, _msg| Ok(Next::Stop))
        .on_signal(move |_count, cx, signal| {
            trace!(path = %cx.path(), ?signal, "counter signal");
            match signal {
                Signal::PreStart => {
                    recorder.started.fetch_add(1, Ordering::SeqCst);
                }
                Signal::PreRestart { .. } => {
                    recorder.restarts.fetch_add(1, Ordering::SeqCst);
                }
                Signal::PostStop { reason } => recorder.stop_reasons.lock().push(reason.clone()),
                _ => {}
            }
            Ok(Next::Same)
        })
}

/// Answers `Ping` with a greeting naming its instance id.
pub fn greeter(cx: &ActorContext) -> Reactor<String> {
    let salutation = cx.get::<Salutation>().map_or("hello", |s| s.0);
    Reactor::new(format!("{salutation} from {}", cx.actor_id()))
        .mutate_on::<Ping>(|greeting, _cx, msg| {
            msg.reply.send(greeting.clone());
            Ok(Next::Same)
        })
        .mutate_on::<WhichThread>(|_greeting, _cx, msg| {
            let name = std::thread::current().name().unwrap_or("unnamed").to_string();
            msg.reply.send(name);
            Ok(Next::Same)
        })
}

/// Keeps every `Ping` reply capability without answering.
pub fn hoarder() -> Reactor<Vec<ReplyTo<String>>> {
    Reactor::new(Vec::new()).mutate_on::<Ping>(|held, _cx, msg| {
        held.push(msg.reply);
        Ok(Next::Same)
    })
}

/// Answers `SlowPing` only after its delay.
#[derive(Debug)]
pub struct Sleeper {
    recorder: Recorder,
}

#[async_trait]
impl Behavior for Sleeper {
    async fn receive(&mut self, _cx: &mut ActorCell, envelope: Envelope) -> anyhow::Result<Next> {
        if let Ok(SlowPing { delay, reply }) = envelope.downcast::<SlowPing>() {
            tokio::time::sleep(delay).await;
            if !reply.send("late") {
                self.recorder.discarded_replies.fetch_add(1, Ordering::SeqCst);
            }
        }
        Ok(Next::Same)
    }
}

/// Parks on `Hold` until released, ignoring everything else.
#[derive(Debug, Default)]
pub struct Gate;

#[async_trait]
impl Behavior for Gate {
    async fn receive(&mut self, _cx: &mut ActorCell, envelope: Envelope) -> anyhow::Result<Next> {
        match envelope.downcast::<Hold>() {
            Ok(Hold { started, release }) => {
                started.send(());
                release.notified().await;
            }
            Err(other) => trace!(message = other.message_type(), "gate ignores message"),
        }
        Ok(Next::Same)
    }
}

/// Refuses to start until it has been built `READY_AFTER` times, then counts `Increment`s.
#[derive(Debug)]
pub struct Stubborn {
    recorder: Recorder,
    ready: bool,
}

impl Stubborn {
    pub const READY_AFTER: usize = 3;

    fn build(recorder: &Recorder) -> Self {
        let builds = recorder.built.fetch_add(1, Ordering::SeqCst) + 1;
        Self {
            recorder: recorder.clone(),
            ready: builds >= Self::READY_AFTER,
        }
    }
}

#[async_trait]
impl Behavior for Stubborn {
    async fn receive(&mut self, _cx: &mut ActorCell, envelope: Envelope) -> anyhow::Result<Next> {
        trace!(message = envelope.message_type(), "stubborn has not started");
        Ok(Next::Same)
    }

    async fn signal(&mut self, _cx: &mut ActorCell, signal: Signal) -> anyhow::Result<Next> {
        match signal {
            Signal::PreStart if !self.ready => Err(anyhow::anyhow!("not ready yet")),
            Signal::PreStart => {
                self.recorder.started.fetch_add(1, Ordering::SeqCst);
                Ok(Next::switch_to(
                    Reactor::new(0_usize)
                        .mutate_on::<Increment>(|count, _cx, _msg| {
                            *count += 1;
                            Ok(Next::Same)
                        })
                        .mutate_on::<GetCount>(|count, _cx, msg| {
                            msg.reply.send(*count);
                            Ok(Next::Same)
                        }),
                ))
            }
            Signal::PostStop { reason } => {
                self.recorder.stop_reasons.lock().push(reason);
                Ok(Next::Same)
            }
            _ => Ok(Next::Same),
        }
    }
}

/// Registers every test actor type.
///
/// * `counter`, `greeter`, `hoarder`, `sleeper`, `gate`: plain actors.
/// * `stubborn`: fails `PreStart` on its first builds.
/// * `parent`: a greeter that answers the child-command protocol.
/// * `plain-parent`: a greeter that does not.
/// * `broken`, `panicky`: factories that fail.
pub fn registry(recorder: &Recorder) -> anyhow::Result<ActorTypeRegistryBuilder> {
    let mut builder = ActorTypeRegistry::builder();
    let counter_recorder = recorder.clone();
    let sleeper_recorder = recorder.clone();
    let stubborn_recorder = recorder.clone();
    builder
        .register("counter", move |_cx: &ActorContext| counter(&counter_recorder))?
        .register("greeter", greeter)?
        .register("hoarder", |_cx: &ActorContext| hoarder())?
        .register("sleeper", move |_cx: &ActorContext| Sleeper {
            recorder: sleeper_recorder.clone(),
        })?
        .register("gate", |_cx: &ActorContext| Gate)?
        .register("stubborn", move |_cx: &ActorContext| Stubborn::build(&stubborn_recorder))?
        .register_intercepted("parent", greeter)?
        .register("plain-parent", greeter)?
        .register_fn("broken", |_cx: &ActorContext| -> anyhow::Result<Gate> {
            Err(anyhow::anyhow!("missing dependency"))
        })?
        .register("panicky", |_cx: &ActorContext| -> Gate { panic!("factory exploded") })?;
    Ok(builder)
}
