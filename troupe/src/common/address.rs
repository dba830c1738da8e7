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

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use crate::common::{ActorError, ActorResult};

/// Separator between type id and instance id in an actor's unique name.
pub const ADDRESS_SEPARATOR: char = '#';

/// Identifies a registered actor type.
///
/// Cheap to clone. Must be non-empty and must not contain [`ADDRESS_SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorTypeId(Arc<str>);

impl ActorTypeId {
    /// Validates and wraps a type id.
    ///
    /// # Errors
    ///
    /// [`ActorError::InvalidTypeId`] for an empty id or one containing `#`.
    pub fn new(id: impl AsRef<str>) -> ActorResult<Self> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(ActorError::InvalidTypeId {
                id: id.to_string(),
                reason: "type id must not be empty",
            });
        }
        if id.contains(ADDRESS_SEPARATOR) {
            return Err(ActorError::InvalidTypeId {
                id: id.to_string(),
                reason: "type id must not contain `#`",
            });
        }
        Ok(Self(Arc::from(id)))
    }

    /// Uses the Rust type name of `T` as the id.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self(Arc::from(type_name::<T>()))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ActorTypeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The `(type, instance)` identity of an actor.
///
/// Rendered to a unique name as `type#instance`. Because type ids cannot contain `#`,
/// splitting at the first `#` recovers both parts even when the instance id contains one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorAddress {
    type_id: ActorTypeId,
    instance_id: Arc<str>,
}

impl ActorAddress {
    /// Builds an address.
    #[must_use]
    pub fn new(type_id: ActorTypeId, instance_id: impl AsRef<str>) -> Self {
        Self {
            type_id,
            instance_id: Arc::from(instance_id.as_ref()),
        }
    }

    /// Validates the type id and builds an address.
    ///
    /// # Errors
    ///
    /// [`ActorError::InvalidTypeId`] if the type id is rejected.
    pub fn try_new(type_id: impl AsRef<str>, instance_id: impl AsRef<str>) -> ActorResult<Self> {
        Ok(Self::new(ActorTypeId::new(type_id)?, instance_id))
    }

    /// The actor type.
    #[must_use]
    pub const fn type_id(&self) -> &ActorTypeId {
        &self.type_id
    }

    /// The instance id.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// The unique name, `type#instance`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}{ADDRESS_SEPARATOR}{}", self.type_id, self.instance_id)
    }

    /// Recovers an address from a name produced by [`ActorAddress::name`].
    ///
    /// # Errors
    ///
    /// [`ActorError::InvalidTypeId`] when the name has no separator or an empty type part.
    pub fn parse(name: &str) -> ActorResult<Self> {
        let (type_part, instance_part) =
            name.split_once(ADDRESS_SEPARATOR)
                .ok_or_else(|| ActorError::InvalidTypeId {
                    id: name.to_string(),
                    reason: "actor name has no `#` separator",
                })?;
        Self::try_new(type_part, instance_part)
    }
}

impl fmt::Display for ActorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{ADDRESS_SEPARATOR}{}", self.type_id, self.instance_id)
    }
}

/// Hierarchical location of a live actor, e.g. `/user/order#1/worker#7`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorPath(Arc<str>);

impl ActorPath {
    /// The path of the root guardian.
    #[must_use]
    pub fn root() -> Self {
        Self(Arc::from("/user"))
    }

    /// The path of a child named `name` under this path.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self(Arc::from(format!("{}/{name}", self.0)))
    }

    /// Number of segments below the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.matches('/').count().saturating_sub(1)
    }

    /// The path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
