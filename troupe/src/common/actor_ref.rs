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

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::trace;

use crate::common::{ActorAddress, ActorPath, ActorResult};
use crate::message::{Envelope, MailboxSender};
use crate::policy::{ResolvedDispatcher, Tags};

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// A schedulable reference to one live actor incarnation.
///
/// This is the runtime-level reference behind an [`ActorHandle`](crate::common::ActorHandle).
/// It owns the mailbox sender, the actor's native child table, its cancellation token and
/// the tracker of its mailbox loop. Two references are equal only if they point at the
/// same incarnation, even when a later actor reuses the same name.
#[derive(Clone)]
pub struct ActorRef {
    inner: Arc<ActorRefInner>,
}

struct ActorRefInner {
    uid: u64,
    address: ActorAddress,
    path: ActorPath,
    sender: MailboxSender,
    children: DashMap<String, ChildEntry>,
    token: CancellationToken,
    tracker: TaskTracker,
    dispatcher: ResolvedDispatcher,
    tags: Tags,
}

impl ActorRef {
    pub(crate) fn new(
        address: ActorAddress,
        path: ActorPath,
        sender: MailboxSender,
        token: CancellationToken,
        dispatcher: ResolvedDispatcher,
        tags: Tags,
    ) -> Self {
        Self {
            inner: Arc::new(ActorRefInner {
                uid: NEXT_UID.fetch_add(1, Ordering::Relaxed),
                address,
                path,
                sender,
                children: DashMap::new(),
                token,
                tracker: TaskTracker::new(),
                dispatcher,
                tags,
            }),
        }
    }

    /// The actor's logical address.
    #[must_use]
    pub fn address(&self) -> &ActorAddress {
        &self.inner.address
    }

    /// The actor's hierarchical path.
    #[must_use]
    pub fn path(&self) -> &ActorPath {
        &self.inner.path
    }

    /// Diagnostic tags from the actor's execution policy.
    #[must_use]
    pub fn tags(&self) -> &Tags {
        &self.inner.tags
    }

    /// Name of the dispatcher the actor runs on.
    #[must_use]
    pub fn dispatcher_label(&self) -> &str {
        &self.inner.dispatcher.label
    }

    /// Mailbox capacity, `None` when unbounded.
    #[must_use]
    pub fn mailbox_capacity(&self) -> Option<usize> {
        self.inner.sender.capacity()
    }

    /// `true` until a stop has been requested or the mailbox loop has ended.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.inner.token.is_cancelled()
            && !self.inner.tracker.is_empty()
            && !self.inner.sender.is_closed()
    }

    /// Requests termination. Returns immediately.
    pub fn stop(&self) {
        trace!(path = %self.inner.path, "Stop requested");
        self.inner.token.cancel();
    }

    /// Resolves once the mailbox loop, including child shutdown and `PostStop`, has finished.
    pub async fn terminated(&self) {
        self.inner.tracker.wait().await;
    }

    pub(crate) fn deliver(&self, envelope: Envelope) -> ActorResult<()> {
        self.inner.sender.deliver(envelope, &self.inner.path)
    }

    pub(crate) fn uid(&self) -> u64 {
        self.inner.uid
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.inner.token
    }

    pub(crate) fn tracker(&self) -> &TaskTracker {
        &self.inner.tracker
    }

    pub(crate) fn dispatcher(&self) -> &ResolvedDispatcher {
        &self.inner.dispatcher
    }

    /// Looks up a live child by unique name.
    pub(crate) fn child(&self, name: &str) -> Option<Self> {
        self.child_entry(name).map(ChildEntry::into_actor)
    }

    /// Looks up a live entry by unique name, pruning a dead one.
    pub(crate) fn child_entry(&self, name: &str) -> Option<ChildEntry> {
        let entry = self.inner.children.get(name).map(|entry| entry.value().clone())?;
        if entry.actor().is_alive() {
            Some(entry)
        } else {
            let uid = entry.actor().uid();
            self.inner
                .children
                .remove_if(name, |_, stale| stale.actor().uid() == uid);
            None
        }
    }

    pub(crate) fn insert_child(&self, name: String, entry: ChildEntry) {
        self.inner.children.insert(name, entry);
    }

    pub(crate) fn remove_child(&self, name: &str) -> Option<ChildEntry> {
        self.inner.children.remove(name).map(|(_, entry)| entry)
    }

    /// Removes the entry only if it still points at the given incarnation.
    pub(crate) fn forget_child(&self, name: &str, uid: u64) {
        self.inner
            .children
            .remove_if(name, |_, entry| entry.actor().uid() == uid);
    }

    /// The children this actor hosts. Borrowed singletons are not included.
    pub(crate) fn children(&self) -> Vec<Self> {
        self.inner
            .children
            .iter()
            .filter_map(|entry| match entry.value() {
                ChildEntry::Hosted(child) => Some(child.clone()),
                ChildEntry::Borrowed(_) => None,
            })
            .collect()
    }

    pub(crate) fn child_count(&self) -> usize {
        self.inner.children.len()
    }
}

/// One name in an actor's child table.
#[derive(Debug, Clone)]
pub(crate) enum ChildEntry {
    /// Runs under this actor and stops with it.
    Hosted(ActorRef),
    /// A singleton hosted by another actor, reachable under this actor's name.
    Borrowed(ActorRef),
}

impl ChildEntry {
    pub(crate) const fn actor(&self) -> &ActorRef {
        match self {
            Self::Hosted(actor) | Self::Borrowed(actor) => actor,
        }
    }

    pub(crate) fn into_actor(self) -> ActorRef {
        match self {
            Self::Hosted(actor) | Self::Borrowed(actor) => actor,
        }
    }
}

impl PartialEq for ActorRef {
    fn eq(&self, other: &Self) -> bool {
        self.inner.uid == other.inner.uid
    }
}

impl Eq for ActorRef {}

impl Hash for ActorRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.uid.hash(state);
    }
}

impl fmt::Debug for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRef")
            .field("path", &self.inner.path)
            .field("uid", &self.inner.uid)
            .finish_non_exhaustive()
    }
}
