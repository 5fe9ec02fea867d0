//! Built-in modifiers.

use serde_json::{Map, Value};

use loot_core::condition;
use loot_core::convert::{ConversionContext, FnConverter, field};
use loot_core::error::{ConvertError, GenerateError};
use loot_core::{
    ItemStack, LootCondition, LootContext, LootModifier, LootNumber, LootNumberRange,
};

use crate::keys;

fn clamp_count(count: i64) -> u32 {
    count.clamp(0, u32::MAX as i64) as u32
}

/// Sets or adds to each stack's count.
///
/// The count provider is evaluated per stack, so a random provider gives
/// every stack its own draw.
pub struct SetCountModifier {
    conditions: Vec<Box<dyn LootCondition>>,
    count: Box<dyn LootNumber>,
    add: bool,
}

impl SetCountModifier {
    pub const KEY: &'static str = "set_count";

    pub fn new(count: impl LootNumber + 'static, add: bool) -> Self {
        Self {
            conditions: Vec::new(),
            count: Box::new(count),
            add,
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
            count: field::number(node, "count", context)?,
            add: field::bool_or(node, "add", false, context)?,
        })
    }

    fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_conditions(node, "conditions", &self.conditions, context)?;
        field::put_number(node, "count", self.count.as_ref(), context)?;
        node.insert("add".into(), Value::Bool(self.add));
        Ok(())
    }

    pub(crate) fn converter() -> FnConverter<Self, dyn LootModifier> {
        FnConverter::new(Self::to_node, Self::from_node, |modifier| {
            Box::new(modifier)
        })
    }
}

impl LootModifier for SetCountModifier {
    fn modify(
        &self,
        items: Vec<ItemStack>,
        context: &mut LootContext,
    ) -> Result<Vec<ItemStack>, GenerateError> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            if !condition::all(&self.conditions, context)? {
                out.push(item);
                continue;
            }
            let count = self.count.get_int(context)?;
            let count = if self.add {
                item.count as i64 + count
            } else {
                count
            };
            out.push(item.with_count(clamp_count(count)));
        }
        Ok(out)
    }
}

/// Clamps each stack's count to a range.
pub struct LimitCountModifier {
    conditions: Vec<Box<dyn LootCondition>>,
    limit: LootNumberRange,
}

impl LimitCountModifier {
    pub const KEY: &'static str = "limit_count";

    pub fn new(limit: LootNumberRange) -> Self {
        Self {
            conditions: Vec::new(),
            limit,
        }
    }

    fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            conditions: field::conditions(node, "conditions", context)?,
            limit: field::number_range(node, "limit", context)?,
        })
    }

    fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_conditions(node, "conditions", &self.conditions, context)?;
        field::put_number_range(node, "limit", &self.limit, context)
    }

    pub(crate) fn converter() -> FnConverter<Self, dyn LootModifier> {
        FnConverter::new(Self::to_node, Self::from_node, |modifier| {
            Box::new(modifier)
        })
    }
}

impl LootModifier for LimitCountModifier {
    fn modify(
        &self,
        items: Vec<ItemStack>,
        context: &mut LootContext,
    ) -> Result<Vec<ItemStack>, GenerateError> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            if !condition::all(&self.conditions, context)? {
                out.push(item);
                continue;
            }
            let limited = self.limit.limit(context, item.count as i64)?;
            out.push(item.with_count(clamp_count(limited)));
        }
        Ok(out)
    }
}

/// Gives each unit of each stack a `1 / radius` chance of surviving an
/// explosion, where the radius comes from the context.
///
/// Stacks decayed to zero are dropped from the batch. Without an explosion
/// radius in the context the batch passes through untouched.
pub struct ExplosionDecayModifier {
    conditions: Vec<Box<dyn LootCondition>>,
}

impl ExplosionDecayModifier {
    pub const KEY: &'static str = "explosion_decay";

    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            conditions: field::conditions(node, "conditions", context)?,
        })
    }

    fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_conditions(node, "conditions", &self.conditions, context)
    }

    pub(crate) fn converter() -> FnConverter<Self, dyn LootModifier> {
        FnConverter::new(Self::to_node, Self::from_node, |modifier| {
            Box::new(modifier)
        })
    }
}

impl Default for ExplosionDecayModifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LootModifier for ExplosionDecayModifier {
    fn modify(
        &self,
        items: Vec<ItemStack>,
        context: &mut LootContext,
    ) -> Result<Vec<ItemStack>, GenerateError> {
        let Some(radius) = context.get(&keys::EXPLOSION_RADIUS).copied() else {
            return Ok(items);
        };
        let chance = 1.0 / radius;

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            if !condition::all(&self.conditions, context)? {
                out.push(item);
                continue;
            }
            let mut survived = 0u32;
            for _ in 0..item.count {
                if context.next_f64() <= chance {
                    survived += 1;
                }
            }
            if survived > 0 {
                out.push(item.with_count(survived));
            }
        }
        Ok(out)
    }
}
