//! Core engine for declarative loot tables.
//!
//! `loot-core` turns tree-shaped configuration documents into executable
//! generation logic and back. The two load-bearing pieces are the
//! [`convert`] module — a polymorphic conversion registry dispatching an
//! open set of runtime types by discriminator string and exact type — and
//! the generation engine ([`entry`], [`pool`], [`table`]), which evaluates a
//! composite tree of weighted, condition-gated choices against a
//! [`context::LootContext`].
//!
//! This crate knows nothing about any concrete game: item entries,
//! conditions, modifiers, and number distributions are registered by a
//! content crate or by the host application.

pub mod condition;
pub mod context;
pub mod convert;
pub mod entry;
pub mod error;
pub mod item;
pub mod keys;
pub mod modifier;
pub mod number;
pub mod pool;
pub mod table;

#[cfg(test)]
pub(crate) mod testing;

pub use condition::LootCondition;
pub use context::{ContextBuilder, ContextKey, LootContext};
pub use convert::{
    AnyRef, ConditionalConverter, ConversionContext, ConversionRegistry, FnConverter,
    RegistryBuilder, RegistrySet, TypedConverter,
};
pub use entry::{
    AlternativeEntry, GroupEntry, LootChoice, LootEntry, SequenceEntry, TagEntry,
};
pub use error::{ConvertError, GenerateError, NodePath, RegistryError};
pub use item::{ItemId, ItemStack, TagSet};
pub use modifier::LootModifier;
pub use number::{LootNumber, LootNumberRange};
pub use pool::{LootPool, LootPoolBuilder};
pub use table::{ContextShape, LootTable, LootTableBuilder, TableIndex};
