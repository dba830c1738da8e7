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

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use troupe::prelude::*;

/// Asks an actor to introduce itself.
#[troupe_message]
pub struct Ping {
    pub reply: ReplyTo<String>,
}

#[troupe_message(clone)]
pub struct Increment;

#[troupe_message]
pub struct GetCount {
    pub reply: ReplyTo<usize>,
}

/// Makes the handler return an error.
#[troupe_message]
pub struct Fail;

/// Makes the handler panic.
#[troupe_message]
pub struct Explode;

/// Makes the handler return `Next::Stop`.
#[troupe_message]
pub struct Retire;

/// Replies after sleeping for `delay`.
#[troupe_message]
pub struct SlowPing {
    pub delay: Duration,
    pub reply: ReplyTo<&'static str>,
}

/// Reports the name of the worker thread running the actor.
#[troupe_message]
pub struct WhichThread {
    pub reply: ReplyTo<String>,
}

/// Acknowledges, then parks the actor until `release` is notified.
#[troupe_message]
pub struct Hold {
    pub started: ReplyTo<()>,
    pub release: Arc<Notify>,
}
