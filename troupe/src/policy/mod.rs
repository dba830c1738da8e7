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

//! Execution policy: where an actor runs, how it queues, and how it is labelled.
//!
//! An [`ExecutionPolicy`] is an immutable value built from three independent axes:
//!
//! *   [`Dispatcher`]: which worker pool runs the actor's mailbox loop.
//! *   [`Mailbox`]: unbounded, bounded, or a named mailbox from configuration.
//! *   [`Tags`]: free-form labels attached to the actor's tracing span.
//!
//! The axes are combined by [`compose`] into opaque [`SpawnProps`]. Composition never
//! depends on the order in which the axes were set.

use std::collections::BTreeSet;
use std::fmt;

use tokio::runtime::{Handle, RuntimeFlavor};

use crate::common::{ActorError, ActorResult};

pub(crate) use dispatchers::{Dispatchers, ResolvedDispatcher};

mod dispatchers;

/// Selects the worker pool an actor's mailbox loop runs on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Dispatcher {
    /// The runtime the system was launched on.
    #[default]
    Default,
    /// A dedicated pool for actors that block or do heavy IO.
    BlockingIo,
    /// A pool declared under `[dispatchers.<name>]` in the configuration.
    Named(String),
    /// Whatever the parent actor runs on. Only resolvable at spawn time.
    SameAsParent,
    /// Lightweight tasks on the host's multi-thread scheduler. See [`Dispatcher::virtual_threads`].
    Virtual(VirtualThreads),
}

/// Proof that the host runtime supports lightweight scheduling.
///
/// Only [`Dispatcher::virtual_threads`] can produce one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualThreads {
    _private: (),
}

impl Dispatcher {
    /// A named dispatcher.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Selects lightweight scheduling on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::UnsupportedExecutionModel`] when called outside a Tokio
    /// runtime or on a current-thread runtime, which cannot interleave actors
    /// preemptively across workers.
    pub fn virtual_threads() -> ActorResult<Self> {
        let handle = Handle::try_current().map_err(|_| {
            ActorError::UnsupportedExecutionModel(
                "virtual dispatcher needs a running Tokio runtime".into(),
            )
        })?;
        match handle.runtime_flavor() {
            RuntimeFlavor::MultiThread => Ok(Self::Virtual(VirtualThreads { _private: () })),
            flavor => Err(ActorError::UnsupportedExecutionModel(format!(
                "virtual dispatcher needs a multi-thread runtime, found {flavor:?}"
            ))),
        }
    }

    /// Returns `true` if this selection needs the full spawn-parameter path.
    #[must_use]
    pub const fn requires_parameters(&self) -> bool {
        !matches!(self, Self::Default)
    }
}

impl fmt::Display for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::BlockingIo => write!(f, "blocking-io"),
            Self::Named(name) => write!(f, "named:{name}"),
            Self::SameAsParent => write!(f, "same-as-parent"),
            Self::Virtual(_) => write!(f, "virtual"),
        }
    }
}

/// Selects the queue in front of an actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Mailbox {
    /// Unbounded FIFO queue.
    #[default]
    Unbounded,
    /// FIFO queue holding at most this many messages. Must be non-zero.
    Bounded(usize),
    /// A mailbox declared under `[mailboxes.<name>]` in the configuration.
    Named(String),
}

impl Mailbox {
    /// A named mailbox.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

/// Diagnostic labels carried by an actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Tags(BTreeSet<String>);

impl Tags {
    /// Empty tag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag.
    pub fn insert(&mut self, tag: impl Into<String>) {
        self.0.insert(tag.into());
    }

    /// Union of both sets.
    #[must_use]
    pub fn union(mut self, other: &Self) -> Self {
        self.0.extend(other.0.iter().cloned());
        self
    }

    /// Whether the tag is present.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    /// Iterates the tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{tag}")?;
        }
        write!(f, "]")
    }
}

/// How an actor should be scheduled and queued.
///
/// Each axis is optional; unset axes fall back to the defaults at composition time.
///
/// ```rust
/// use troupe::prelude::*;
///
/// let a = ExecutionPolicy::default()
///     .with_dispatcher(Dispatcher::BlockingIo)
///     .with_mailbox(Mailbox::Bounded(100))
///     .with_tag("x");
/// let b = ExecutionPolicy::default()
///     .with_tag("x")
///     .with_mailbox(Mailbox::Bounded(100))
///     .with_dispatcher(Dispatcher::BlockingIo);
/// assert_eq!(a.compose(), b.compose());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPolicy {
    dispatcher: Option<Dispatcher>,
    mailbox: Option<Mailbox>,
    tags: Tags,
}

impl ExecutionPolicy {
    /// Sets the dispatcher axis.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Sets the mailbox axis.
    #[must_use]
    pub fn with_mailbox(mut self, mailbox: Mailbox) -> Self {
        self.mailbox = Some(mailbox);
        self
    }

    /// Adds one tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Adds several tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            self.tags.insert(tag);
        }
        self
    }

    /// Overlays `other` on top of `self`: axes set in `other` win, tags are merged.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self {
            dispatcher: other.dispatcher.or(self.dispatcher),
            mailbox: other.mailbox.or(self.mailbox),
            tags: self.tags.union(&other.tags),
        }
    }

    /// The dispatcher axis, if set.
    #[must_use]
    pub const fn dispatcher(&self) -> Option<&Dispatcher> {
        self.dispatcher.as_ref()
    }

    /// The mailbox axis, if set.
    #[must_use]
    pub const fn mailbox(&self) -> Option<&Mailbox> {
        self.mailbox.as_ref()
    }

    /// The tag set.
    #[must_use]
    pub const fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Folds the three axes into spawn parameters.
    #[must_use]
    pub fn compose(&self) -> SpawnProps {
        compose(self.dispatcher.clone(), self.mailbox.clone(), self.tags.clone())
    }
}

/// Opaque runtime spawn parameters produced by [`compose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnProps(Props);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Props {
    /// Default dispatcher: only the mailbox needs selecting.
    MailboxOnly { mailbox: Mailbox, tags: Tags },
    /// Any other dispatcher: everything travels in one parameter object.
    Parameters {
        dispatcher: Dispatcher,
        mailbox: Mailbox,
        tags: Tags,
    },
}

static DEFAULT_DISPATCHER: Dispatcher = Dispatcher::Default;

/// Combines dispatcher, mailbox and tags into [`SpawnProps`].
///
/// With the default dispatcher only a mailbox selection is recorded and the tags are
/// attached afterwards. Every other dispatcher carries mailbox and tags inside the same
/// parameter object.
#[must_use]
pub fn compose(dispatcher: Option<Dispatcher>, mailbox: Option<Mailbox>, tags: Tags) -> SpawnProps {
    let mailbox = mailbox.unwrap_or_default();
    let props = match dispatcher {
        Some(dispatcher) if dispatcher.requires_parameters() => Props::Parameters {
            dispatcher,
            mailbox,
            tags,
        },
        _ => {
            let props = Props::MailboxOnly {
                mailbox,
                tags: Tags::new(),
            };
            props.with_tags(tags)
        }
    };
    SpawnProps(props)
}

impl Props {
    fn with_tags(self, extra: Tags) -> Self {
        match self {
            Self::MailboxOnly { mailbox, tags } => Self::MailboxOnly {
                mailbox,
                tags: tags.union(&extra),
            },
            Self::Parameters {
                dispatcher,
                mailbox,
                tags,
            } => Self::Parameters {
                dispatcher,
                mailbox,
                tags: tags.union(&extra),
            },
        }
    }
}

impl SpawnProps {
    /// The selected dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        match &self.0 {
            Props::MailboxOnly { .. } => &DEFAULT_DISPATCHER,
            Props::Parameters { dispatcher, .. } => dispatcher,
        }
    }

    /// The selected mailbox.
    #[must_use]
    pub fn mailbox(&self) -> &Mailbox {
        match &self.0 {
            Props::MailboxOnly { mailbox, .. } | Props::Parameters { mailbox, .. } => mailbox,
        }
    }

    /// The diagnostic tags.
    #[must_use]
    pub fn tags(&self) -> &Tags {
        match &self.0 {
            Props::MailboxOnly { tags, .. } | Props::Parameters { tags, .. } => tags,
        }
    }

    /// Returns `true` when the full parameter object is in use.
    #[must_use]
    pub const fn requires_parameters(&self) -> bool {
        matches!(self.0, Props::Parameters { .. })
    }
}
