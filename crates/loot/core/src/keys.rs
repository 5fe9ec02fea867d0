//! Well-known context keys read by the core engine.
//!
//! Hosts define additional keys for their own conditions and modifiers; these
//! are only the slots the built-in combinators and generation loop consult.

use std::sync::Arc;

use crate::context::ContextKey;
use crate::item::TagSet;
use crate::table::TableIndex;

/// Scales choice quality and pool bonus rolls. Absent means zero.
pub const LUCK: ContextKey<f64> = ContextKey::new("luck");

/// The tag catalogue consulted by tag-expansion entries.
pub const ITEM_TAGS: ContextKey<TagSet> = ContextKey::new("item_tags");

/// Tables addressable by key, for entries that reference other tables.
pub const TABLES: ContextKey<Arc<TableIndex>> = ContextKey::new("tables");
