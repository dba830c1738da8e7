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
use std::sync::Once;

use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use troupe::prelude::*;

pub mod actors;
pub mod messages;

// Ensures tracing initialization happens only once across all tests.
static INIT: Once = Once::new();

/// Initializes the global tracing subscriber for tests.
///
/// Output goes to `logs/troupe_tests.txt`. `RUST_LOG` overrides the default filter.
pub fn initialize_tracing() {
    INIT.call_once(|| {
        std::fs::create_dir_all("logs").expect("could not create logs dir");

        let file_appender = RollingFileAppender::new(Rotation::NEVER, "logs", "troupe_tests.txt");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // Leak the guard so the non-blocking writer outlives every test
        Box::leak(Box::new(guard));

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info")
                .add_directive("troupe::common=trace".parse().unwrap())
                .add_directive("troupe::actor=debug".parse().unwrap())
                .add_directive("troupe::message=debug".parse().unwrap())
        });

        let subscriber = FmtSubscriber::builder()
            .with_span_events(FmtSpan::NONE)
            .with_max_level(Level::TRACE)
            .compact()
            .with_line_number(true)
            .without_time()
            .with_target(true)
            .with_env_filter(filter)
            .with_writer(non_blocking)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("setting default subscriber failed");
    });
}

/// Configuration with short timeouts so failing tests fail fast.
pub fn test_config() -> TroupeConfig {
    let mut config = TroupeConfig::default();
    config.timeouts.ask_timeout_ms = 1_000;
    config.timeouts.exists_timeout_ms = 200;
    config.timeouts.spawn_timeout_ms = 1_000;
    config.timeouts.actor_shutdown_timeout_ms = 1_000;
    config.timeouts.system_shutdown_timeout_ms = 3_000;
    config.blocking_io.worker_threads = 2;
    config
}

/// Launches a system over `registry` with [`test_config`].
pub async fn launch(registry: std::sync::Arc<ActorTypeRegistry>) -> ActorResult<ActorSystem> {
    initialize_tracing();
    TroupeApp::builder(registry)
        .with_config(test_config())
        .launch()
        .await
}
