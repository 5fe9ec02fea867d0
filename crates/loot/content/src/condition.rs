//! Built-in conditions.

use serde_json::{Map, Value};

use loot_core::condition;
use loot_core::convert::{ConversionContext, FnConverter, field};
use loot_core::error::{ConvertError, GenerateError};
use loot_core::{LootCondition, LootContext, LootNumber, LootNumberRange};

fn condition_field(
    node: &Map<String, Value>,
    field_name: &str,
    context: &ConversionContext<'_>,
) -> Result<Box<dyn LootCondition>, ConvertError> {
    let value = field::require(node, field_name, context)?;
    context
        .registries()
        .conditions()
        .deserialize(value, &context.enter(field_name))
}

fn put_condition(
    node: &mut Map<String, Value>,
    field_name: &str,
    value: &dyn LootCondition,
    context: &ConversionContext<'_>,
) -> Result<(), ConvertError> {
    let serialized = context
        .registries()
        .conditions()
        .serialize(value, &context.enter(field_name))?;
    node.insert(field_name.to_string(), serialized);
    Ok(())
}

/// Passes when every term passes; an empty term list passes.
pub struct AllOfCondition {
    terms: Vec<Box<dyn LootCondition>>,
}

impl AllOfCondition {
    pub const KEY: &'static str = "all_of";

    pub fn new(terms: Vec<Box<dyn LootCondition>>) -> Self {
        Self { terms }
    }

    fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self::new(field::conditions(node, "terms", context)?))
    }

    fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_conditions(node, "terms", &self.terms, context)
    }

    pub(crate) fn converter() -> FnConverter<Self, dyn LootCondition> {
        FnConverter::new(Self::to_node, Self::from_node, |condition| {
            Box::new(condition)
        })
    }
}

impl LootCondition for AllOfCondition {
    fn test(&self, context: &mut LootContext) -> Result<bool, GenerateError> {
        condition::all(&self.terms, context)
    }
}

/// Passes when at least one term passes; an empty term list fails.
pub struct AnyOfCondition {
    terms: Vec<Box<dyn LootCondition>>,
}

impl AnyOfCondition {
    pub const KEY: &'static str = "any_of";

    pub fn new(terms: Vec<Box<dyn LootCondition>>) -> Self {
        Self { terms }
    }

    fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self::new(field::conditions(node, "terms", context)?))
    }

    fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_conditions(node, "terms", &self.terms, context)
    }

    pub(crate) fn converter() -> FnConverter<Self, dyn LootCondition> {
        FnConverter::new(Self::to_node, Self::from_node, |condition| {
            Box::new(condition)
        })
    }
}

impl LootCondition for AnyOfCondition {
    fn test(&self, context: &mut LootContext) -> Result<bool, GenerateError> {
        condition::any(&self.terms, context)
    }
}

/// Passes at least `count` of its terms; the M-of-N combinator.
pub struct AtLeastCondition {
    count: i32,
    terms: Vec<Box<dyn LootCondition>>,
}

impl AtLeastCondition {
    pub const KEY: &'static str = "at_least";

    pub fn new(count: i32, terms: Vec<Box<dyn LootCondition>>) -> Self {
        Self { count, terms }
    }

    fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self::new(
            field::i64_or(node, "count", 1, context)? as i32,
            field::conditions(node, "terms", context)?,
        ))
    }

    fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        node.insert("count".into(), Value::from(self.count));
        field::put_conditions(node, "terms", &self.terms, context)
    }

    pub(crate) fn converter() -> FnConverter<Self, dyn LootCondition> {
        FnConverter::new(Self::to_node, Self::from_node, |condition| {
            Box::new(condition)
        })
    }
}

impl LootCondition for AtLeastCondition {
    fn test(&self, context: &mut LootContext) -> Result<bool, GenerateError> {
        condition::at_least(&self.terms, self.count, context)
    }
}

/// Inverts its term.
pub struct InvertedCondition {
    term: Box<dyn LootCondition>,
}

impl InvertedCondition {
    pub const KEY: &'static str = "inverted";

    pub fn new(term: impl LootCondition + 'static) -> Self {
        Self {
            term: Box::new(term),
        }
    }

    fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            term: condition_field(node, "term", context)?,
        })
    }

    fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        put_condition(node, "term", self.term.as_ref(), context)
    }

    pub(crate) fn converter() -> FnConverter<Self, dyn LootCondition> {
        FnConverter::new(Self::to_node, Self::from_node, |condition| {
            Box::new(condition)
        })
    }
}

impl LootCondition for InvertedCondition {
    fn test(&self, context: &mut LootContext) -> Result<bool, GenerateError> {
        Ok(!self.term.test(context)?)
    }
}

/// Passes with the given probability per evaluation.
pub struct RandomChanceCondition {
    chance: Box<dyn LootNumber>,
}

impl RandomChanceCondition {
    pub const KEY: &'static str = "random_chance";

    pub fn new(chance: impl LootNumber + 'static) -> Self {
        Self {
            chance: Box::new(chance),
        }
    }

    fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            chance: field::number(node, "chance", context)?,
        })
    }

    fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_number(node, "chance", self.chance.as_ref(), context)
    }

    pub(crate) fn converter() -> FnConverter<Self, dyn LootCondition> {
        FnConverter::new(Self::to_node, Self::from_node, |condition| {
            Box::new(condition)
        })
    }
}

impl LootCondition for RandomChanceCondition {
    fn test(&self, context: &mut LootContext) -> Result<bool, GenerateError> {
        // The draw happens before the threshold is evaluated, keeping the
        // RNG stream stable even when the chance provider itself draws.
        let draw = context.next_f64();
        Ok(draw < self.chance.get_double(context)?)
    }
}

/// Checks a provider-valued number against a range.
pub struct ValueCheckCondition {
    value: Box<dyn LootNumber>,
    range: LootNumberRange,
}

impl ValueCheckCondition {
    pub const KEY: &'static str = "value_check";

    pub fn new(value: impl LootNumber + 'static, range: LootNumberRange) -> Self {
        Self {
            value: Box::new(value),
            range,
        }
    }

    fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            value: field::number(node, "value", context)?,
            range: field::number_range(node, "range", context)?,
        })
    }

    fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_number(node, "value", self.value.as_ref(), context)?;
        field::put_number_range(node, "range", &self.range, context)
    }

    pub(crate) fn converter() -> FnConverter<Self, dyn LootCondition> {
        FnConverter::new(Self::to_node, Self::from_node, |condition| {
            Box::new(condition)
        })
    }
}

impl LootCondition for ValueCheckCondition {
    fn test(&self, context: &mut LootContext) -> Result<bool, GenerateError> {
        let value = self.value.get_int(context)?;
        self.range.check(context, value)
    }
}

/// Checks the context's luck value against a range.
pub struct LuckCheckCondition {
    range: LootNumberRange,
}

impl LuckCheckCondition {
    pub const KEY: &'static str = "luck_check";

    pub fn new(range: LootNumberRange) -> Self {
        Self { range }
    }

    fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            range: field::number_range(node, "range", context)?,
        })
    }

    fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_number_range(node, "range", &self.range, context)
    }

    pub(crate) fn converter() -> FnConverter<Self, dyn LootCondition> {
        FnConverter::new(Self::to_node, Self::from_node, |condition| {
            Box::new(condition)
        })
    }
}

impl LootCondition for LuckCheckCondition {
    fn test(&self, context: &mut LootContext) -> Result<bool, GenerateError> {
        let luck = context.luck();
        self.range.check_f64(context, luck)
    }
}
