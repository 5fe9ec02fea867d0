//! Item values produced by loot generation.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an item kind, e.g. `"gold_ingot"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A counted stack of one item kind.
///
/// Generation produces batches of stacks; modifiers may rewrite counts or
/// drop stacks entirely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub id: ItemId,
    pub count: u32,
}

impl ItemStack {
    pub fn new(id: impl Into<ItemId>, count: u32) -> Self {
        Self {
            id: id.into(),
            count,
        }
    }

    /// A stack of one.
    pub fn of(id: impl Into<ItemId>) -> Self {
        Self::new(id, 1)
    }

    /// Returns a copy of this stack with a different count.
    pub fn with_count(&self, count: u32) -> Self {
        Self {
            id: self.id.clone(),
            count,
        }
    }
}

/// Named groups of item ids, resolved by tag-expansion entries.
///
/// The host registers its tag catalogue into the generation context under
/// [`crate::keys::ITEM_TAGS`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TagSet {
    tags: HashMap<String, Vec<ItemId>>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the members of a tag, replacing any previous members.
    pub fn insert(&mut self, name: impl Into<String>, members: Vec<ItemId>) {
        self.tags.insert(name.into(), members);
    }

    /// The members of the named tag, or an empty slice for unknown tags.
    pub fn members(&self, name: &str) -> &[ItemId] {
        self.tags.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }
}
