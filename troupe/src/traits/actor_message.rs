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

use std::any::Any;
use std::fmt::Debug;

/// A marker trait for types that can be delivered to an actor mailbox.
///
/// Messages travel as `Box<dyn Any + Send>` inside an [`Envelope`](crate::message::Envelope)
/// and are recovered by type on the receiving side, so the only requirements are that the
/// type is `Send`, `Debug` and `'static`. Unlike broadcast-style frameworks there is no
/// `Clone` bound: a message is moved into exactly one mailbox, which lets it carry a
/// one-shot [`ReplyTo`](crate::message::ReplyTo).
///
/// A blanket implementation is provided. The [`troupe_message`](troupe_macro::troupe_message)
/// attribute derives `Debug` and asserts the bounds at compile time.
pub trait ActorMessage: Any + Send + Debug {
    /// Returns the Rust type name of the message, used for tracing.
    fn message_type(&self) -> &'static str;
}

impl<T> ActorMessage for T
where
    T: Any + Send + Debug,
{
    #[inline]
    fn message_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}
