//! Built-in loot content: leaf types, default registries, and file loaders.
//!
//! `loot-content` supplies the concrete catalogue the `loot-core` engine is
//! generic over — item and table entries, the stock conditions and
//! modifiers, the standard number distributions — wires them into a default
//! [`loot_core::convert::RegistrySet`], and loads table directories and tag
//! catalogues from disk.

pub mod condition;
pub mod entry;
pub mod keys;
pub mod loader;
pub mod modifier;
pub mod number;
pub mod registries;

pub use condition::{
    AllOfCondition, AnyOfCondition, AtLeastCondition, InvertedCondition, LuckCheckCondition,
    RandomChanceCondition, ValueCheckCondition,
};
pub use entry::{EmptyEntry, ItemEntry, TableEntry};
pub use loader::{LoadResult, TableRegistry, load_tables, load_tags};
pub use modifier::{ExplosionDecayModifier, LimitCountModifier, SetCountModifier};
pub use number::{BinomialNumber, ConstantNumber, ScalarShorthand, UniformNumber};
pub use registries::{
    condition_registry, entry_registry, modifier_registry, number_registry, registries,
};
