//! Tag-expansion entries.

use serde_json::{Map, Value};

use crate::condition::{self, LootCondition};
use crate::context::LootContext;
use crate::convert::{ConversionContext, field};
use crate::entry::{LootChoice, LootEntry, standard_weight};
use crate::error::{ConvertError, GenerateError};
use crate::item::{ItemId, ItemStack};
use crate::keys;
use crate::modifier::{self, LootModifier};

/// An entry backed by a named item tag from the context's tag catalogue.
///
/// Without `expand`, the whole tag is one choice whose batch contains every
/// member. With `expand`, each member becomes its own single-item choice,
/// every one carrying this entry's weight. An unknown tag, or a context
/// without a tag catalogue, yields nothing.
pub struct TagEntry {
    conditions: Vec<Box<dyn LootCondition>>,
    modifiers: Vec<Box<dyn LootModifier>>,
    weight: i64,
    quality: i64,
    name: String,
    expand: bool,
}

impl TagEntry {
    pub fn new(name: impl Into<String>, expand: bool) -> Self {
        Self {
            conditions: Vec::new(),
            modifiers: Vec::new(),
            weight: 1,
            quality: 0,
            name: name.into(),
            expand,
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

    fn members(&self, context: &LootContext) -> Vec<ItemId> {
        context
            .get(&keys::ITEM_TAGS)
            .map(|tags| tags.members(&self.name).to_vec())
            .unwrap_or_default()
    }

    pub fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            conditions: field::conditions(node, "conditions", context)?,
            modifiers: field::modifiers(node, "functions", context)?,
            weight: field::i64_or(node, "weight", 1, context)?,
            quality: field::i64_or(node, "quality", 0, context)?,
            name: field::require_str(node, "name", context)?.to_string(),
            expand: field::bool_or(node, "expand", false, context)?,
        })
    }

    pub fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_conditions(node, "conditions", &self.conditions, context)?;
        field::put_modifiers(node, "functions", &self.modifiers, context)?;
        node.insert("weight".into(), Value::from(self.weight));
        node.insert("quality".into(), Value::from(self.quality));
        node.insert("name".into(), Value::String(self.name.clone()));
        node.insert("expand".into(), Value::Bool(self.expand));
        Ok(())
    }
}

impl LootChoice for TagEntry {
    fn weight(&self, context: &mut LootContext) -> Result<u64, GenerateError> {
        Ok(standard_weight(self.weight, self.quality, context))
    }

    fn generate(&self, context: &mut LootContext) -> Result<Vec<ItemStack>, GenerateError> {
        let items = self
            .members(context)
            .into_iter()
            .map(ItemStack::of)
            .collect();
        modifier::apply_all(&self.modifiers, items, context)
    }
}

impl LootEntry for TagEntry {
    fn request_choices<'a>(
        &'a self,
        context: &mut LootContext,
    ) -> Result<Vec<Box<dyn LootChoice + 'a>>, GenerateError> {
        if !condition::all(&self.conditions, context)? {
            return Ok(Vec::new());
        }
        if !self.expand {
            return Ok(vec![Box::new(self)]);
        }
        Ok(self
            .members(context)
            .into_iter()
            .map(|member| Box::new(MemberChoice {
                parent: self,
                member,
            }) as Box<dyn LootChoice + 'a>)
            .collect())
    }
}

/// One expanded tag member, sharing its parent entry's weight.
struct MemberChoice<'a> {
    parent: &'a TagEntry,
    member: ItemId,
}

impl LootChoice for MemberChoice<'_> {
    fn weight(&self, context: &mut LootContext) -> Result<u64, GenerateError> {
        Ok(standard_weight(
            self.parent.weight,
            self.parent.quality,
            context,
        ))
    }

    fn generate(&self, _context: &mut LootContext) -> Result<Vec<ItemStack>, GenerateError> {
        Ok(vec![ItemStack::of(self.member.clone())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::TagSet;
    use crate::testing::ScriptRng;

    fn context_with_tags() -> LootContext {
        let mut tags = TagSet::new();
        tags.insert(
            "gems",
            vec![ItemId::new("ruby"), ItemId::new("topaz"), ItemId::new("opal")],
        );
        LootContext::builder()
            .rng(ScriptRng::new(vec![]))
            .with(&keys::ITEM_TAGS, tags)
            .build()
    }

    #[test]
    fn whole_tag_is_one_choice_with_every_member() {
        let entry = TagEntry::new("gems", false);
        let mut ctx = context_with_tags();

        let choices = entry.request_choices(&mut ctx).unwrap();
        assert_eq!(choices.len(), 1);

        let items = choices[0].generate(&mut ctx).unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn expansion_yields_one_choice_per_member_with_parent_weight() {
        let entry = TagEntry::new("gems", true).with_weight(7, 0);
        let mut ctx = context_with_tags();

        let choices = entry.request_choices(&mut ctx).unwrap();
        assert_eq!(choices.len(), 3);

        for choice in &choices {
            assert_eq!(choice.weight(&mut ctx).unwrap(), 7);
            let items = choice.generate(&mut ctx).unwrap();
            assert_eq!(items.len(), 1);
        }
    }

    #[test]
    fn unknown_tag_yields_nothing_when_expanded() {
        let entry = TagEntry::new("metals", true);
        let mut ctx = context_with_tags();
        assert!(entry.request_choices(&mut ctx).unwrap().is_empty());
    }

    #[test]
    fn missing_catalogue_degrades_to_no_loot() {
        let entry = TagEntry::new("gems", false);
        let mut ctx = LootContext::builder().rng(ScriptRng::new(vec![])).build();

        let choices = entry.request_choices(&mut ctx).unwrap();
        assert_eq!(choices.len(), 1);
        assert!(choices[0].generate(&mut ctx).unwrap().is_empty());
    }
}
