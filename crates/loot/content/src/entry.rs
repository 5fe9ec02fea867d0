//! Built-in leaf entries: empty, item, and table references.

use serde_json::{Map, Value};

use loot_core::convert::{ConversionContext, FnConverter, field};
use loot_core::entry::{self, standard_weight};
use loot_core::error::{ConvertError, GenerateError};
use loot_core::modifier;
use loot_core::{
    ItemId, ItemStack, LootChoice, LootCondition, LootContext, LootEntry, LootModifier, keys,
};

/// A weighted slot that yields nothing.
///
/// Useful to give a pool a chance of producing no loot at all.
pub struct EmptyEntry {
    conditions: Vec<Box<dyn LootCondition>>,
    weight: i64,
    quality: i64,
}

impl EmptyEntry {
    pub const KEY: &'static str = "empty";

    pub fn new(weight: i64, quality: i64) -> Self {
        Self {
            conditions: Vec::new(),
            weight,
            quality,
        }
    }

    pub fn with_conditions(mut self, conditions: Vec<Box<dyn LootCondition>>) -> Self {
        self.conditions = conditions;
        self
    }

    fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            conditions: field::conditions(node, "conditions", context)?,
            weight: field::i64_or(node, "weight", 1, context)?,
            quality: field::i64_or(node, "quality", 0, context)?,
        })
    }

    fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_conditions(node, "conditions", &self.conditions, context)?;
        node.insert("weight".into(), Value::from(self.weight));
        node.insert("quality".into(), Value::from(self.quality));
        Ok(())
    }

    pub(crate) fn converter() -> FnConverter<Self, dyn LootEntry> {
        FnConverter::new(Self::to_node, Self::from_node, |entry| Box::new(entry))
    }
}

impl LootChoice for EmptyEntry {
    fn weight(&self, context: &mut LootContext) -> Result<u64, GenerateError> {
        Ok(standard_weight(self.weight, self.quality, context))
    }

    fn generate(&self, _context: &mut LootContext) -> Result<Vec<ItemStack>, GenerateError> {
        Ok(Vec::new())
    }
}

impl LootEntry for EmptyEntry {
    fn request_choices<'a>(
        &'a self,
        context: &mut LootContext,
    ) -> Result<Vec<Box<dyn LootChoice + 'a>>, GenerateError> {
        entry::single_choice(self, &self.conditions, context)
    }
}

/// A single item stack, run through this entry's modifiers.
pub struct ItemEntry {
    conditions: Vec<Box<dyn LootCondition>>,
    modifiers: Vec<Box<dyn LootModifier>>,
    weight: i64,
    quality: i64,
    item: ItemId,
}

impl ItemEntry {
    pub const KEY: &'static str = "item";

    pub fn new(item: impl Into<ItemId>) -> Self {
        Self {
            conditions: Vec::new(),
            modifiers: Vec::new(),
            weight: 1,
            quality: 0,
            item: item.into(),
        }
    }

    pub fn with_weight(mut self, weight: i64, quality: i64) -> Self {
        self.weight = weight;
        self.quality = quality;
        self
    }

    pub fn with_conditions(mut self, conditions: Vec<Box<dyn LootCondition>>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Vec<Box<dyn LootModifier>>) -> Self {
        self.modifiers = modifiers;
        self
    }

    fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            conditions: field::conditions(node, "conditions", context)?,
            modifiers: field::modifiers(node, "functions", context)?,
            weight: field::i64_or(node, "weight", 1, context)?,
            quality: field::i64_or(node, "quality", 0, context)?,
            item: ItemId::new(field::require_str(node, "name", context)?),
        })
    }

    fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_conditions(node, "conditions", &self.conditions, context)?;
        field::put_modifiers(node, "functions", &self.modifiers, context)?;
        node.insert("weight".into(), Value::from(self.weight));
        node.insert("quality".into(), Value::from(self.quality));
        node.insert("name".into(), Value::String(self.item.as_str().to_string()));
        Ok(())
    }

    pub(crate) fn converter() -> FnConverter<Self, dyn LootEntry> {
        FnConverter::new(Self::to_node, Self::from_node, |entry| Box::new(entry))
    }
}

impl LootChoice for ItemEntry {
    fn weight(&self, context: &mut LootContext) -> Result<u64, GenerateError> {
        Ok(standard_weight(self.weight, self.quality, context))
    }

    fn generate(&self, context: &mut LootContext) -> Result<Vec<ItemStack>, GenerateError> {
        modifier::apply_all(
            &self.modifiers,
            vec![ItemStack::of(self.item.clone())],
            context,
        )
    }
}

impl LootEntry for ItemEntry {
    fn request_choices<'a>(
        &'a self,
        context: &mut LootContext,
    ) -> Result<Vec<Box<dyn LootChoice + 'a>>, GenerateError> {
        entry::single_choice(self, &self.conditions, context)
    }
}

/// Delegates to another table registered in the context's table index.
///
/// The batch of the referenced table is run through this entry's modifiers.
/// An unknown key, or a context without a table index, yields nothing.
///
/// Nothing detects reference cycles: a table that reaches itself through a
/// chain of table entries recurses without bound, so keeping the table graph
/// acyclic is the caller's responsibility.
pub struct TableEntry {
    conditions: Vec<Box<dyn LootCondition>>,
    modifiers: Vec<Box<dyn LootModifier>>,
    weight: i64,
    quality: i64,
    name: String,
}

impl TableEntry {
    pub const KEY: &'static str = "loot_table";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            conditions: Vec::new(),
            modifiers: Vec::new(),
            weight: 1,
            quality: 0,
            name: name.into(),
        }
    }

    pub fn with_weight(mut self, weight: i64, quality: i64) -> Self {
        self.weight = weight;
        self.quality = quality;
        self
    }

    fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            conditions: field::conditions(node, "conditions", context)?,
            modifiers: field::modifiers(node, "functions", context)?,
            weight: field::i64_or(node, "weight", 1, context)?,
            quality: field::i64_or(node, "quality", 0, context)?,
            name: field::require_str(node, "value", context)?.to_string(),
        })
    }

    fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_conditions(node, "conditions", &self.conditions, context)?;
        field::put_modifiers(node, "functions", &self.modifiers, context)?;
        node.insert("weight".into(), Value::from(self.weight));
        node.insert("quality".into(), Value::from(self.quality));
        node.insert("value".into(), Value::String(self.name.clone()));
        Ok(())
    }

    pub(crate) fn converter() -> FnConverter<Self, dyn LootEntry> {
        FnConverter::new(Self::to_node, Self::from_node, |entry| Box::new(entry))
    }
}

impl LootChoice for TableEntry {
    fn weight(&self, context: &mut LootContext) -> Result<u64, GenerateError> {
        Ok(standard_weight(self.weight, self.quality, context))
    }

    fn generate(&self, context: &mut LootContext) -> Result<Vec<ItemStack>, GenerateError> {
        let Some(table) = context
            .get(&keys::TABLES)
            .and_then(|index| index.get(&self.name))
            .cloned()
        else {
            return Ok(Vec::new());
        };

        let items = table.generate(context)?;
        modifier::apply_all(&self.modifiers, items, context)
    }
}

impl LootEntry for TableEntry {
    fn request_choices<'a>(
        &'a self,
        context: &mut LootContext,
    ) -> Result<Vec<Box<dyn LootChoice + 'a>>, GenerateError> {
        entry::single_choice(self, &self.conditions, context)
    }
}
