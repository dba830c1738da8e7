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

//! The child-command protocol answered by intercepted parents.

use std::time::Duration;

use troupe::prelude::*;

use crate::setup::actors::{registry, Recorder, Salutation};
use crate::setup::messages::{GetCount, Increment, Ping};
use crate::setup::launch;

mod setup;

#[tokio::test]
async fn test_child_names_are_scoped_to_their_parent() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;
    let first_parent = system
        .actor("parent", "p-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;
    let second_parent = system
        .actor("parent", "p-2")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;

    let first = first_parent
        .child("counter", "worker-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;
    let second = second_parent
        .child("counter", "worker-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;

    assert_ne!(first, second);
    assert_eq!(first.path().as_str(), "/user/parent#p-1/counter#worker-1");
    assert_eq!(second.path().as_str(), "/user/parent#p-2/counter#worker-1");
    assert_eq!(recorder.built(), 2);

    first.tell(Increment);
    assert_eq!(first.ask(|reply| GetCount { reply }, Duration::from_secs(1)).await?, 1);
    assert_eq!(second.ask(|reply| GetCount { reply }, Duration::from_secs(1)).await?, 0);

    assert!(
        !system.actor("counter", "worker-1").exists().await?,
        "children are not top-level actors"
    );

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_child_scope_get_exists_and_spawn() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;
    let parent = system
        .actor("parent", "p-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;
    let scope = parent.child("counter", "worker-1");

    assert!(!scope.exists().await?);
    assert!(scope.get().await?.is_none());

    let spawned = scope.spawn(SupervisionStrategy::None).await?;
    assert!(scope.exists().await?);
    assert_eq!(scope.get().await?, Some(spawned.clone()));
    assert_eq!(scope.get_or_spawn(SupervisionStrategy::None).await?, spawned);
    assert_eq!(
        scope.spawn(SupervisionStrategy::None).await.unwrap_err(),
        ActorError::AddressInUse(ActorAddress::try_new("counter", "worker-1")?)
    );
    assert_eq!(recorder.built(), 1);

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_stop_child_through_the_parent() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;
    let parent = system
        .actor("parent", "p-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;
    let scope = parent.child("counter", "worker-1");
    let child = scope.get_or_spawn(SupervisionStrategy::None).await?;

    assert_eq!(scope.stop().await?, StopOutcome::Stopped);
    assert!(!scope.exists().await?);
    tokio::time::timeout(Duration::from_secs(1), child.terminated()).await?;
    assert_eq!(recorder.stop_reasons(), vec![TerminationReason::Stopped]);
    assert_eq!(scope.stop().await?, StopOutcome::NotFound);

    assert!(parent.is_alive(), "stopping a child leaves the parent running");

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_child_spawn_failures_are_replied_not_raised() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;
    let parent = system
        .actor("parent", "p-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;

    let err = parent
        .child("ghost", "g")
        .get_or_spawn(SupervisionStrategy::None)
        .await
        .unwrap_err();
    assert_eq!(err, ActorError::UnknownType(ActorTypeId::new("ghost")?));

    let err = parent
        .child("panicky", "p")
        .get_or_spawn(SupervisionStrategy::None)
        .await
        .unwrap_err();
    assert!(matches!(err, ActorError::SpawnFailed { .. }), "{err:?}");

    let greeting = parent.ask(|reply| Ping { reply }, Duration::from_secs(1)).await?;
    assert_eq!(greeting, "hello from p-1", "parent keeps serving its own messages");

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_parent_without_interception_does_not_answer() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;
    let plain = system
        .actor("plain-parent", "pp")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;

    let err = plain
        .child("counter", "worker-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await
        .unwrap_err();
    assert_eq!(err, ActorError::NoReply(plain.path().clone()));
    assert_eq!(recorder.built(), 0);

    let greeting = plain.ask(|reply| Ping { reply }, Duration::from_secs(1)).await?;
    assert_eq!(greeting, "hello from pp");

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_children_nest_and_receive_context() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;
    let root = system
        .actor("parent", "p-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;

    let nested = root
        .child("parent", "nested")
        .with_extension(Salutation("hi"))
        .get_or_spawn(SupervisionStrategy::None)
        .await?;
    let greeting = nested.ask(|reply| Ping { reply }, Duration::from_secs(1)).await?;
    assert_eq!(greeting, "hi from nested");

    let leaf = nested
        .child("counter", "leaf")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;
    assert_eq!(leaf.path().as_str(), "/user/parent#p-1/parent#nested/counter#leaf");
    assert_eq!(leaf.path().depth(), 3);

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_stopping_a_parent_stops_its_children() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;
    let parent = system
        .actor("parent", "p-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;
    let first = parent
        .child("counter", "worker-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;
    let second = parent
        .child("counter", "worker-2")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;

    parent.stop();
    tokio::time::timeout(Duration::from_secs(1), parent.terminated()).await?;

    assert!(!first.is_alive());
    assert!(!second.is_alive());
    assert_eq!(
        recorder.stop_reasons(),
        vec![TerminationReason::ParentShutdown, TerminationReason::ParentShutdown]
    );
    assert!(!system.actor("parent", "p-1").exists().await?);

    system.shutdown().await?;
    Ok(())
}
