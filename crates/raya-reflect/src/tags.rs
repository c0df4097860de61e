//! Tag storage for classes, properties and functions
//!
//! A tag is a piece of metadata identified by a [`TagId`]. Its value is a
//! [`Getter<Value>`], so it can be fixed at declaration time or computed from
//! the instance it is read against.

use std::any::Any;
use std::fmt;

use crate::config::TagPolicy;
use crate::error::{ReflectError, ReflectResult};
use crate::getter::Getter;
use crate::table::NameTable;
use crate::value::Value;

/// Identifier of a tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagId {
    /// Named tag, e.g. `"serializable"`
    Name(String),
    /// Numbered tag
    Index(i64),
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagId::Name(name) => write!(f, "'{}'", name),
            TagId::Index(index) => write!(f, "#{}", index),
        }
    }
}

impl From<&str> for TagId {
    fn from(name: &str) -> Self {
        TagId::Name(name.to_string())
    }
}

impl From<String> for TagId {
    fn from(name: String) -> Self {
        TagId::Name(name)
    }
}

impl From<i64> for TagId {
    fn from(index: i64) -> Self {
        TagId::Index(index)
    }
}

impl From<i32> for TagId {
    fn from(index: i32) -> Self {
        TagId::Index(index as i64)
    }
}

/// Tags attached to one describable entity
#[derive(Debug, Clone, Default)]
pub struct TagHolder {
    tags: NameTable<TagId, Getter<Value>>,
}

impl TagHolder {
    /// Create an empty holder
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` is attached
    pub fn has_tag(&self, id: &TagId) -> bool {
        self.tags.contains(id)
    }

    /// Raw tag value
    pub fn tag(&self, id: &TagId) -> Option<&Getter<Value>> {
        self.tags.get(id)
    }

    /// Attach a tag according to `policy`
    pub fn set_tag(
        &mut self,
        id: TagId,
        value: Getter<Value>,
        policy: TagPolicy,
    ) -> ReflectResult<()> {
        if self.tags.contains(&id) {
            match policy {
                TagPolicy::Reject => return Err(ReflectError::DuplicateTag(id)),
                TagPolicy::Override => tracing::trace!(tag = %id, "overriding tag"),
            }
        }
        self.tags.insert(id, value);
        Ok(())
    }

    /// Resolve the tag `id` against `instance`
    pub fn get_tag(&self, id: &TagId, instance: &dyn Any) -> ReflectResult<Value> {
        self.tags
            .get(id)
            .ok_or_else(|| ReflectError::TagNotFound(id.clone()))?
            .get(instance)
    }

    /// Tag identifiers in declaration order
    pub fn tag_ids(&self) -> impl Iterator<Item = &TagId> + '_ {
        self.tags.keys()
    }

    /// Number of tags
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }
}
