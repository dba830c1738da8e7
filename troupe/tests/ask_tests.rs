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

//! Request/response through `ActorHandle`: replies, deadlines, fallbacks and late replies.

use std::time::{Duration, Instant};

use troupe::prelude::*;

use crate::setup::actors::{registry, Recorder};
use crate::setup::messages::{GetCount, Increment, Ping, SlowPing};
use crate::setup::launch;

mod setup;

#[tokio::test]
async fn test_ask_returns_the_reply() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;
    let greeter = system
        .actor("greeter", "g-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;

    let greeting = greeter.ask(|reply| Ping { reply }, Duration::from_millis(500)).await?;
    assert_eq!(greeting, "hello from g-1");

    let greeting = greeter.ask_default(|reply| Ping { reply }).await?;
    assert_eq!(greeting, "hello from g-1");

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_ask_times_out_when_the_target_never_replies() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;
    let hoarder = system
        .actor("hoarder", "h-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;

    let timeout = Duration::from_millis(50);
    let started = Instant::now();
    let err = hoarder.ask(|reply| Ping { reply }, timeout).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_timeout(), "{err:?}");
    assert_eq!(
        err,
        ActorError::AskTimeout {
            target: hoarder.path().clone(),
            timeout,
        }
    );
    assert!(elapsed >= timeout, "resolved early after {elapsed:?}");
    assert!(elapsed < Duration::from_millis(500), "resolved late after {elapsed:?}");
    assert!(hoarder.is_alive(), "a timeout does not affect the target");

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_ask_or_degrades_to_the_fallback() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;
    let hoarder = system
        .actor("hoarder", "h-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;
    let greeter = system
        .actor("greeter", "g-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;
    let timeout = Duration::from_millis(50);

    let answer = hoarder
        .ask_or(|reply| Ping { reply }, timeout, "fallback".to_string())
        .await;
    assert_eq!(answer, "fallback");

    let answer = greeter
        .ask_or(|reply| Ping { reply }, Duration::from_secs(1), "fallback".to_string())
        .await;
    assert_eq!(answer, "hello from g-1", "a reply wins over the fallback");

    let answer = hoarder
        .ask_or_else(|reply| Ping { reply }, timeout, |e| format!("timed out: {}", e.is_timeout()))
        .await;
    assert_eq!(answer, "timed out: true");

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_late_reply_is_discarded() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;
    let sleeper = system
        .actor("sleeper", "s-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;

    let err = sleeper
        .ask(
            |reply| SlowPing {
                delay: Duration::from_millis(150),
                reply,
            },
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(recorder.discarded_replies(), 1);

    let answer = sleeper
        .ask(
            |reply| SlowPing {
                delay: Duration::from_millis(10),
                reply,
            },
            Duration::from_secs(1),
        )
        .await?;
    assert_eq!(answer, "late");
    assert_eq!(recorder.discarded_replies(), 1);

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_unhandled_request_reports_no_reply() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;
    let counter = system
        .actor("counter", "c-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;

    let err = counter
        .ask(|reply| Ping { reply }, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert_eq!(err, ActorError::NoReply(counter.path().clone()));

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_stopped_actor_rejects_messages() -> anyhow::Result<()> {
    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;
    let counter = system
        .actor("counter", "c-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;

    counter.stop();
    tokio::time::timeout(Duration::from_secs(1), counter.terminated()).await?;

    counter.tell(Increment);
    assert_eq!(
        counter.try_tell(Increment),
        Err(ActorError::MailboxClosed(counter.path().clone()))
    );
    let err = counter
        .ask(|reply| GetCount { reply }, Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, ActorError::MailboxClosed(_)), "{err:?}");

    system.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_existence_check_timeout_is_shorter_than_ask_timeout() -> anyhow::Result<()> {
    let defaults = TroupeConfig::default();
    assert!(defaults.exists_timeout() < defaults.ask_timeout());

    let recorder = Recorder::default();
    let system = launch(registry(&recorder)?.freeze()).await?;
    let greeter = system
        .actor("greeter", "g-1")
        .get_or_spawn(SupervisionStrategy::None)
        .await?;

    assert_eq!(greeter.ask_timeout(), system.config().ask_timeout());
    assert!(system.config().exists_timeout() < greeter.ask_timeout());

    let impatient = greeter.clone().with_ask_timeout(Duration::from_millis(20));
    assert_eq!(impatient.ask_timeout(), Duration::from_millis(20));
    assert_eq!(impatient, greeter, "timeout is not part of identity");

    system.shutdown().await?;
    Ok(())
}
