//! Default registry wiring for the built-in catalogue.
//!
//! Hosts that only need the built-ins call [`registries`]; hosts with their
//! own leaf types start from the per-family builders, append their
//! converters, and build the set themselves.

use loot_core::convert::{ConversionRegistry, FnConverter, RegistryBuilder, RegistrySet};
use loot_core::error::RegistryError;
use loot_core::{
    AlternativeEntry, GroupEntry, LootCondition, LootEntry, LootModifier, LootNumber,
    SequenceEntry, TagEntry,
};

use crate::condition::{
    AllOfCondition, AnyOfCondition, AtLeastCondition, InvertedCondition, LuckCheckCondition,
    RandomChanceCondition, ValueCheckCondition,
};
use crate::entry::{EmptyEntry, ItemEntry, TableEntry};
use crate::modifier::{ExplosionDecayModifier, LimitCountModifier, SetCountModifier};
use crate::number::{BinomialNumber, ConstantNumber, ScalarShorthand, UniformNumber};

/// The entry registry builder with every built-in entry registered, using
/// `"type"` as the discriminator field.
pub fn entry_registry() -> RegistryBuilder<dyn LootEntry> {
    ConversionRegistry::builder("entry", "type")
        .keyed(EmptyEntry::KEY, EmptyEntry::converter())
        .keyed(ItemEntry::KEY, ItemEntry::converter())
        .keyed(TableEntry::KEY, TableEntry::converter())
        .keyed(
            "tag",
            FnConverter::<_, dyn LootEntry>::new(TagEntry::to_node, TagEntry::from_node, |entry| {
                Box::new(entry)
            }),
        )
        .keyed(
            "alternatives",
            FnConverter::<_, dyn LootEntry>::new(
                AlternativeEntry::to_node,
                AlternativeEntry::from_node,
                |entry| Box::new(entry),
            ),
        )
        .keyed(
            "group",
            FnConverter::<_, dyn LootEntry>::new(GroupEntry::to_node, GroupEntry::from_node, |entry| {
                Box::new(entry)
            }),
        )
        .keyed(
            "sequence",
            FnConverter::<_, dyn LootEntry>::new(SequenceEntry::to_node, SequenceEntry::from_node, |entry| {
                Box::new(entry)
            }),
        )
}

/// The condition registry builder with every built-in condition registered,
/// using `"condition"` as the discriminator field.
pub fn condition_registry() -> RegistryBuilder<dyn LootCondition> {
    ConversionRegistry::builder("condition", "condition")
        .keyed(AllOfCondition::KEY, AllOfCondition::converter())
        .keyed(AnyOfCondition::KEY, AnyOfCondition::converter())
        .keyed(AtLeastCondition::KEY, AtLeastCondition::converter())
        .keyed(InvertedCondition::KEY, InvertedCondition::converter())
        .keyed(RandomChanceCondition::KEY, RandomChanceCondition::converter())
        .keyed(ValueCheckCondition::KEY, ValueCheckCondition::converter())
        .keyed(LuckCheckCondition::KEY, LuckCheckCondition::converter())
}

/// The modifier registry builder with every built-in modifier registered,
/// using `"function"` as the discriminator field.
pub fn modifier_registry() -> RegistryBuilder<dyn LootModifier> {
    ConversionRegistry::builder("modifier", "function")
        .keyed(SetCountModifier::KEY, SetCountModifier::converter())
        .keyed(LimitCountModifier::KEY, LimitCountModifier::converter())
        .keyed(
            ExplosionDecayModifier::KEY,
            ExplosionDecayModifier::converter(),
        )
}

/// The number registry builder with every built-in provider registered,
/// using `"type"` as the discriminator field.
///
/// The bare-scalar shorthand is registered as a conditional converter, so a
/// lone number in a document reads as a constant and constants write back as
/// bare scalars.
pub fn number_registry() -> RegistryBuilder<dyn LootNumber> {
    ConversionRegistry::builder("number", "type")
        .conditional(ScalarShorthand)
        .keyed(ConstantNumber::KEY, ConstantNumber::converter())
        .keyed(UniformNumber::KEY, UniformNumber::converter())
        .keyed(BinomialNumber::KEY, BinomialNumber::converter())
}

/// Builds the default registry set with the complete built-in catalogue.
pub fn registries() -> Result<RegistrySet, RegistryError> {
    Ok(RegistrySet::new(
        entry_registry().build()?,
        condition_registry().build()?,
        modifier_registry().build()?,
        number_registry().build()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn the_default_set_builds() {
        registries().unwrap();
    }

    #[test]
    fn a_representative_table_round_trips() {
        let set = registries().unwrap();
        let ctx = set.conversion();

        let node = json!({
            "required_context": ["luck"],
            "pools": [{
                "rolls": {"type": "uniform", "min": 1, "max": 3},
                "bonus_rolls": 0.5,
                "entries": [
                    {"type": "item", "name": "emerald", "weight": 5, "quality": 1},
                    {"type": "empty", "weight": 10, "quality": 0},
                    {"type": "alternatives", "children": [
                        {"type": "item", "name": "diamond", "weight": 1, "quality": 0,
                         "conditions": [{"condition": "random_chance", "chance": 0.1}]},
                        {"type": "tag", "name": "gems", "expand": true,
                         "weight": 2, "quality": 0}
                    ]}
                ],
                "conditions": [{"condition": "luck_check", "range": {"min": 0}}],
                "functions": [{"function": "set_count", "count": 2, "add": false}]
            }],
            "functions": [{"function": "limit_count", "limit": {"max": 10}}]
        });

        let table = loot_core::LootTable::from_node(&node, &ctx).unwrap();
        let serialized = table.to_node(&ctx).unwrap();
        let reparsed = loot_core::LootTable::from_node(&serialized, &ctx).unwrap();
        let reserialized = reparsed.to_node(&ctx).unwrap();

        // One full cycle is enough to normalize shorthand forms; after that
        // the representation must be a fixed point.
        assert_eq!(serialized, reserialized);
    }

    #[test]
    fn every_leaf_round_trips_through_its_registry() {
        let set = registries().unwrap();
        let ctx = set.conversion();

        let entries = [
            json!({"type": "empty", "weight": 3, "quality": 0}),
            json!({"type": "item", "name": "bread", "weight": 1, "quality": 0}),
            json!({"type": "loot_table", "value": "a/b", "weight": 1, "quality": 0}),
            json!({"type": "tag", "name": "gems", "expand": false,
                   "weight": 1, "quality": 0}),
        ];
        for node in entries {
            let value = set.entries().deserialize(&node, &ctx).unwrap();
            let back = set.entries().serialize(value.as_ref(), &ctx).unwrap();
            assert_eq!(back, node, "entry did not round-trip");
        }

        let conditions = [
            json!({"condition": "random_chance", "chance": 0.25}),
            json!({"condition": "inverted",
                   "term": {"condition": "random_chance", "chance": 0.25}}),
            json!({"condition": "value_check", "value": 3.0,
                   "range": {"min": 1.0, "max": 5.0}}),
        ];
        for node in conditions {
            let value = set.conditions().deserialize(&node, &ctx).unwrap();
            let back = set.conditions().serialize(value.as_ref(), &ctx).unwrap();
            assert_eq!(back, node, "condition did not round-trip");
        }

        // The scalar shorthand wins both directions for constants.
        let constant = set.numbers().deserialize(&json!(4.0), &ctx).unwrap();
        assert_eq!(
            set.numbers().serialize(constant.as_ref(), &ctx).unwrap(),
            json!(4.0)
        );

        let uniform = set
            .numbers()
            .deserialize(&json!({"type": "uniform", "min": 1.0, "max": 6.0}), &ctx)
            .unwrap();
        assert_eq!(
            set.numbers().serialize(uniform.as_ref(), &ctx).unwrap(),
            json!({"type": "uniform", "min": 1.0, "max": 6.0})
        );
    }
}
