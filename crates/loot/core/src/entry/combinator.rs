//! Combinator entry nodes: alternative, group, and sequence.
//!
//! All three gate on their own conditions first, then differ in how they
//! combine their children's choice lists:
//!
//! - [`AlternativeEntry`] returns the first child's non-empty list (OR-like)
//! - [`GroupEntry`] concatenates every child's list
//! - [`SequenceEntry`] concatenates until a child comes up empty (AND-like)

use serde_json::{Map, Value};

use crate::condition::{self, LootCondition};
use crate::context::LootContext;
use crate::convert::{ConversionContext, field};
use crate::entry::{LootChoice, LootEntry};
use crate::error::{ConvertError, GenerateError};

/// Yields the choices of its first child that yields any.
///
/// Children after the first productive one are not consulted at all, so
/// their side effects (condition evaluation, RNG draws) do not occur.
pub struct AlternativeEntry {
    conditions: Vec<Box<dyn LootCondition>>,
    children: Vec<Box<dyn LootEntry>>,
}

impl AlternativeEntry {
    pub fn new(conditions: Vec<Box<dyn LootCondition>>, children: Vec<Box<dyn LootEntry>>) -> Self {
        Self {
            conditions,
            children,
        }
    }

    pub fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self::new(
            field::conditions(node, "conditions", context)?,
            field::entries(node, "children", context)?,
        ))
    }

    pub fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_conditions(node, "conditions", &self.conditions, context)?;
        field::put_entries(node, "children", &self.children, context)
    }
}

impl LootEntry for AlternativeEntry {
    fn request_choices<'a>(
        &'a self,
        context: &mut LootContext,
    ) -> Result<Vec<Box<dyn LootChoice + 'a>>, GenerateError> {
        if !condition::all(&self.conditions, context)? {
            return Ok(Vec::new());
        }
        for child in &self.children {
            let choices = child.request_choices(context)?;
            if !choices.is_empty() {
                return Ok(choices);
            }
        }
        Ok(Vec::new())
    }
}

/// Concatenates the choices of all of its children, in order.
///
/// A child with nothing to offer contributes nothing; the others still run.
pub struct GroupEntry {
    conditions: Vec<Box<dyn LootCondition>>,
    children: Vec<Box<dyn LootEntry>>,
}

impl GroupEntry {
    pub fn new(conditions: Vec<Box<dyn LootCondition>>, children: Vec<Box<dyn LootEntry>>) -> Self {
        Self {
            conditions,
            children,
        }
    }

    pub fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self::new(
            field::conditions(node, "conditions", context)?,
            field::entries(node, "children", context)?,
        ))
    }

    pub fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_conditions(node, "conditions", &self.conditions, context)?;
        field::put_entries(node, "children", &self.children, context)
    }
}

impl LootEntry for GroupEntry {
    fn request_choices<'a>(
        &'a self,
        context: &mut LootContext,
    ) -> Result<Vec<Box<dyn LootChoice + 'a>>, GenerateError> {
        if !condition::all(&self.conditions, context)? {
            return Ok(Vec::new());
        }
        let mut choices = Vec::new();
        for child in &self.children {
            choices.extend(child.request_choices(context)?);
        }
        Ok(choices)
    }
}

/// Concatenates children's choices until a child yields an empty list, then
/// stops without consulting the remaining children.
pub struct SequenceEntry {
    conditions: Vec<Box<dyn LootCondition>>,
    children: Vec<Box<dyn LootEntry>>,
}

impl SequenceEntry {
    pub fn new(conditions: Vec<Box<dyn LootCondition>>, children: Vec<Box<dyn LootEntry>>) -> Self {
        Self {
            conditions,
            children,
        }
    }

    pub fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self::new(
            field::conditions(node, "conditions", context)?,
            field::entries(node, "children", context)?,
        ))
    }

    pub fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_conditions(node, "conditions", &self.conditions, context)?;
        field::put_entries(node, "children", &self.children, context)
    }
}

impl LootEntry for SequenceEntry {
    fn request_choices<'a>(
        &'a self,
        context: &mut LootContext,
    ) -> Result<Vec<Box<dyn LootChoice + 'a>>, GenerateError> {
        if !condition::all(&self.conditions, context)? {
            return Ok(Vec::new());
        }
        let mut choices = Vec::new();
        for child in &self.children {
            let child_choices = child.request_choices(context)?;
            if child_choices.is_empty() {
                break;
            }
            choices.extend(child_choices);
        }
        Ok(choices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemStack;
    use crate::testing::{FailCondition, ScriptRng, StubEntry};

    fn context() -> LootContext {
        LootContext::builder().rng(ScriptRng::new(vec![])).build()
    }

    fn generate_all(
        choices: Vec<Box<dyn LootChoice + '_>>,
        ctx: &mut LootContext,
    ) -> Vec<ItemStack> {
        let mut items = Vec::new();
        for choice in choices {
            items.extend(choice.generate(ctx).unwrap());
        }
        items
    }

    fn ids(items: &[ItemStack]) -> Vec<&str> {
        items.iter().map(|stack| stack.id.as_str()).collect()
    }

    #[test]
    fn alternative_returns_the_first_non_empty_child() {
        let empty = StubEntry::empty();
        let first = StubEntry::new(&["apple"]);
        let second = StubEntry::new(&["bread"]);

        let alternative = AlternativeEntry::new(
            Vec::new(),
            vec![Box::new(empty), Box::new(first), Box::new(second)],
        );

        let mut ctx = context();
        let choices = alternative.request_choices(&mut ctx).unwrap();
        let items = generate_all(choices, &mut ctx);
        assert_eq!(ids(&items), vec!["apple"]);

        // The child after the productive one was never consulted.
        let children: Vec<&StubEntry> = alternative
            .children
            .iter()
            .map(|child| {
                let any: &dyn std::any::Any = child.as_ref();
                any.downcast_ref::<StubEntry>().unwrap()
            })
            .collect();
        assert_eq!(children[0].calls(), 1);
        assert_eq!(children[1].calls(), 1);
        assert_eq!(children[2].calls(), 0);
    }

    #[test]
    fn group_concatenates_all_children() {
        let group = GroupEntry::new(
            Vec::new(),
            vec![
                Box::new(StubEntry::new(&["apple"])),
                Box::new(StubEntry::empty()),
                Box::new(StubEntry::new(&["bread", "coal"])),
            ],
        );

        let mut ctx = context();
        let choices = group.request_choices(&mut ctx).unwrap();
        let items = generate_all(choices, &mut ctx);
        assert_eq!(ids(&items), vec!["apple", "bread", "coal"]);
    }

    #[test]
    fn sequence_stops_at_the_first_empty_child() {
        let sequence = SequenceEntry::new(
            Vec::new(),
            vec![
                Box::new(StubEntry::new(&["apple"])),
                Box::new(StubEntry::empty()),
                Box::new(StubEntry::new(&["bread"])),
            ],
        );

        let mut ctx = context();
        let choices = sequence.request_choices(&mut ctx).unwrap();
        let items = generate_all(choices, &mut ctx);
        assert_eq!(ids(&items), vec!["apple"]);

        let children: Vec<&StubEntry> = sequence
            .children
            .iter()
            .map(|child| {
                let any: &dyn std::any::Any = child.as_ref();
                any.downcast_ref::<StubEntry>().unwrap()
            })
            .collect();
        assert_eq!(children[2].calls(), 0);
    }

    #[test]
    fn failed_conditions_silence_a_combinator() {
        let group = GroupEntry::new(
            vec![Box::new(FailCondition)],
            vec![Box::new(StubEntry::new(&["apple"]))],
        );

        let mut ctx = context();
        assert!(group.request_choices(&mut ctx).unwrap().is_empty());
    }
}
