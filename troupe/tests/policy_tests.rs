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

//! Execution policies applied at spawn time: dispatchers, mailboxes and tags.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use troupe::prelude::*;

use crate::setup::actors::{registry, Recorder};
use crate::setup::messages::{GetCount, Hold, Increment, WhichThread};
use crate::setup::{initialize_tracing, launch, test_config};

mod setup;

async fn launch_with(config: TroupeConfig, recorder: &Recorder) -> anyhow::Result<ActorSystem> {
    initialize_tracing();
    Ok(TroupeApp::builder(registry(recorder)?.freeze())
        .with_config(config)
        .launch()
        .await?)
}

async fn thread_of(handle: &ActorHandle) -> anyhow::Result<String> {
    Ok(handle
        .ask(|reply| WhichThread { reply }, Duration::from_secs(1))
        .await?)
}

#[tokio::test]
async fn test_blocking_io_dispatcher_runs_on_its_own_pool() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;

    let worker = system
        .actor("greeter", "io")
        .with_policy(ExecutionPolicy::default().with_dispatcher(Dispatcher::BlockingIo))
        .get_or_spawn(SupervisionStrategy::None)
        .await?;

    assert_eq!(worker.actor_ref().dispatcher_label(), "blocking-io");
    assert_eq!(thread_of(&worker).await?, "troupe-blocking-io");

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_named_dispatcher_uses_configured_thread_name() -> anyhow::Result<()> {
    let mut config = test_config();
    config.dispatchers.insert(
        "ledger".to_string(),
        DispatcherConfig {
            worker_threads: 1,
            thread_name: Some("ledger-worker".to_string()),
        },
    );
    let recorder = Recorder::default();
    let system = launch_with(config, &recorder).await?;

    let ledger = system
        .actor("greeter", "ledger")
        .with_policy(ExecutionPolicy::default().with_dispatcher(Dispatcher::named("ledger")))
        .get_or_spawn(SupervisionStrategy::None)
        .await?;
    assert_eq!(thread_of(&ledger).await?, "ledger-worker");

    let err = system
        .actor("greeter", "lost")
        .with_policy(ExecutionPolicy::default().with_dispatcher(Dispatcher::named("nope")))
        .get_or_spawn(SupervisionStrategy::None)
        .await
        .unwrap_err();
    assert_eq!(err, ActorError::UnknownDispatcher("nope".to_string()));
    assert!(!system.actor("greeter", "lost").exists().await?);
    assert!(system.is_running());

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_same_as_parent_inherits_the_parent_pool() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;
    let parent = system
        .actor("parent", "io-parent")
        .with_policy(ExecutionPolicy::default().with_dispatcher(Dispatcher::BlockingIo))
        .get_or_spawn(SupervisionStrategy::None)
        .await?;

    let inherited = parent
        .child("greeter", "inherits")
        .with_policy(ExecutionPolicy::default().with_dispatcher(Dispatcher::SameAsParent))
        .get_or_spawn(SupervisionStrategy::None)
        .await?;
    let default = parent
        .child("greeter", "default")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;

    assert_eq!(inherited.actor_ref().dispatcher_label(), "blocking-io");
    assert_eq!(thread_of(&inherited).await?, "troupe-blocking-io");
    assert_eq!(default.actor_ref().dispatcher_label(), "default");

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_bounded_mailbox_reports_backpressure() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;
    let gate = system
        .actor("gate", "g-1")
        .with_policy(ExecutionPolicy::default().with_mailbox(Mailbox::Bounded(1)))
        .get_or_spawn(SupervisionStrategy::None)
        .await?;
    assert_eq!(gate.actor_ref().mailbox_capacity(), Some(1));

    let release = Arc::new(Notify::new());
    gate.ask(
        |started| Hold {
            started,
            release: Arc::clone(&release),
        },
        Duration::from_secs(1),
    )
    .await?;

    gate.try_tell(Increment)?;
    assert_eq!(
        gate.try_tell(Increment),
        Err(ActorError::MailboxFull(gate.path().clone()))
    );
    gate.tell(Increment);
    assert!(gate.is_alive(), "a full mailbox never blocks or stops the actor");

    release.notify_one();
    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_named_mailbox_comes_from_configuration() -> anyhow::Result<()> {
    let mut config = test_config();
    config.mailboxes.insert(
        "audit".to_string(),
        MailboxConfig {
            bounded: true,
            capacity: Some(8),
        },
    );
    config.mailboxes.insert(
        "bulk".to_string(),
        MailboxConfig {
            bounded: true,
            capacity: None,
        },
    );
    let recorder = Recorder::default();
    let system = launch_with(config, &recorder).await?;

    let audit = system
        .actor("counter", "audit")
        .with_policy(ExecutionPolicy::default().with_mailbox(Mailbox::named("audit")))
        .get_or_spawn(SupervisionStrategy::None)
        .await?;
    assert_eq!(audit.actor_ref().mailbox_capacity(), Some(8));

    let bulk = system
        .actor("counter", "bulk")
        .with_policy(ExecutionPolicy::default().with_mailbox(Mailbox::named("bulk")))
        .get_or_spawn(SupervisionStrategy::None)
        .await?;
    assert_eq!(bulk.actor_ref().mailbox_capacity(), Some(1_024));

    let err = system
        .actor("counter", "missing")
        .with_policy(ExecutionPolicy::default().with_mailbox(Mailbox::named("missing")))
        .get_or_spawn(SupervisionStrategy::None)
        .await
        .unwrap_err();
    assert_eq!(err, ActorError::UnknownMailbox("missing".to_string()));
    assert_eq!(recorder.built(), 2, "policy errors are reported before the factory runs");

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_zero_capacity_mailbox_is_rejected() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;

    let err = system
        .actor("counter", "zero")
        .with_policy(ExecutionPolicy::default().with_mailbox(Mailbox::Bounded(0)))
        .get_or_spawn(SupervisionStrategy::None)
        .await
        .unwrap_err();
    assert!(matches!(err, ActorError::InvalidConfiguration(_)), "{err:?}");

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_composed_policy_is_applied_whatever_the_order() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;

    let base = ExecutionPolicy::default().with_tag("billing");
    let overlay = ExecutionPolicy::default()
        .with_mailbox(Mailbox::Bounded(16))
        .with_tag("eu");
    let counter = system
        .actor("counter", "tagged")
        .with_policy(base.and(overlay))
        .get_or_spawn(SupervisionStrategy::None)
        .await?;

    assert!(counter.tags().contains("billing"));
    assert!(counter.tags().contains("eu"));
    assert_eq!(counter.actor_ref().mailbox_capacity(), Some(16));

    counter.tell(Increment);
    assert_eq!(counter.ask(|reply| GetCount { reply }, Duration::from_secs(1)).await?, 1);

    system.shutdown().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_virtual_dispatcher_on_a_multi_thread_runtime() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;

    let policy = ExecutionPolicy::default().with_dispatcher(Dispatcher::virtual_threads()?);
    let counter = system
        .actor("counter", "light")
        .with_policy(policy)
        .get_or_spawn(SupervisionStrategy::None)
        .await?;
    assert_eq!(counter.actor_ref().dispatcher_label(), "virtual");

    for _ in 0..10 {
        counter.tell(Increment);
    }
    assert_eq!(counter.ask(|reply| GetCount { reply }, Duration::from_secs(1)).await?, 10);

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_virtual_dispatcher_is_refused_on_a_current_thread_runtime() {
    let err = Dispatcher::virtual_threads().unwrap_err();
    assert!(matches!(err, ActorError::UnsupportedExecutionModel(_)), "{err:?}");
}
