//! Loot pools: repeated weighted draws over an entry list.

use serde_json::{Map, Value};

use crate::condition::{self, LootCondition};
use crate::context::LootContext;
use crate::convert::{ConversionContext, field};
use crate::entry::LootEntry;
use crate::error::{ConvertError, GenerateError};
use crate::item::ItemStack;
use crate::modifier::{self, LootModifier};
use crate::number::LootNumber;

/// A unit of repeated weighted draws within a table.
///
/// Each generation computes a roll count, then per roll gathers every choice
/// its entries currently offer and picks one by weighted random selection.
/// The candidate list and all weights are recomputed for every roll, since
/// both may depend on context state and prior RNG draws.
pub struct LootPool {
    rolls: Box<dyn LootNumber>,
    bonus_rolls: Option<Box<dyn LootNumber>>,
    entries: Vec<Box<dyn LootEntry>>,
    conditions: Vec<Box<dyn LootCondition>>,
    modifiers: Vec<Box<dyn LootModifier>>,
}

impl LootPool {
    /// Starts a builder with the given roll count provider.
    pub fn builder(rolls: impl LootNumber + 'static) -> LootPoolBuilder {
        LootPoolBuilder {
            rolls: Box::new(rolls),
            bonus_rolls: None,
            entries: Vec::new(),
            conditions: Vec::new(),
            modifiers: Vec::new(),
        }
    }

    /// Generates this pool's batch for one table generation.
    ///
    /// A pool whose conditions fail, or whose entries offer no choices,
    /// produces an empty batch; neither is an error.
    pub fn generate(&self, context: &mut LootContext) -> Result<Vec<ItemStack>, GenerateError> {
        if !condition::all(&self.conditions, context)? {
            return Ok(Vec::new());
        }

        let mut rolls = self.rolls.get_int(context)?;
        if let Some(bonus) = &self.bonus_rolls {
            let luck = context.luck();
            rolls += (bonus.get_double(context)? * luck).floor() as i64;
        }

        let mut items = Vec::new();
        for _ in 0..rolls {
            self.roll_once(context, &mut items)?;
        }

        modifier::apply_all(&self.modifiers, items, context)
    }

    /// Performs one weighted draw, appending the selected choice's batch.
    fn roll_once(
        &self,
        context: &mut LootContext,
        items: &mut Vec<ItemStack>,
    ) -> Result<(), GenerateError> {
        let mut choices = Vec::new();
        for entry in &self.entries {
            choices.extend(entry.request_choices(context)?);
        }
        if choices.is_empty() {
            // A roll with nothing to offer is skipped, not an error.
            return Ok(());
        }

        // Exclusive prefix sums: milestones[i] is the total weight of all
        // choices before i.
        let mut total = 0u64;
        let mut milestones = Vec::with_capacity(choices.len());
        for choice in &choices {
            milestones.push(total);
            total += choice.weight(context)?.max(1);
        }

        let value = context.next_bounded(total);

        // The drawn value selects the last choice whose milestone does not
        // exceed it; ties on a milestone boundary resolve to that bucket.
        // Falls back to the last choice if nothing qualifies.
        let mut selected = choices.len() - 1;
        for index in (0..choices.len()).rev() {
            if milestones[index] <= value {
                selected = index;
                break;
            }
        }

        items.extend(choices[selected].generate(context)?);
        Ok(())
    }

    pub fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        field::require(node, "entries", context)?;
        Ok(Self {
            rolls: field::number(node, "rolls", context)?,
            bonus_rolls: field::opt_number(node, "bonus_rolls", context)?,
            entries: field::entries(node, "entries", context)?,
            conditions: field::conditions(node, "conditions", context)?,
            modifiers: field::modifiers(node, "functions", context)?,
        })
    }

    pub fn to_node(&self, context: &ConversionContext<'_>) -> Result<Value, ConvertError> {
        let mut node = Map::new();
        field::put_number(&mut node, "rolls", self.rolls.as_ref(), context)?;
        if let Some(bonus) = &self.bonus_rolls {
            field::put_number(&mut node, "bonus_rolls", bonus.as_ref(), context)?;
        }
        // Entries are always written, even when empty: they are a required
        // field on the way back in.
        let entries_context = context.enter("entries");
        let entries = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                entries_context
                    .registries()
                    .entries()
                    .serialize(entry.as_ref(), &entries_context.enter_index(index))
            })
            .collect::<Result<Vec<_>, _>>()?;
        node.insert("entries".into(), Value::Array(entries));
        field::put_conditions(&mut node, "conditions", &self.conditions, context)?;
        field::put_modifiers(&mut node, "functions", &self.modifiers, context)?;
        Ok(Value::Object(node))
    }
}

/// Accumulates pool parts, then freezes a [`LootPool`].
pub struct LootPoolBuilder {
    rolls: Box<dyn LootNumber>,
    bonus_rolls: Option<Box<dyn LootNumber>>,
    entries: Vec<Box<dyn LootEntry>>,
    conditions: Vec<Box<dyn LootCondition>>,
    modifiers: Vec<Box<dyn LootModifier>>,
}

impl LootPoolBuilder {
    pub fn bonus_rolls(mut self, bonus: impl LootNumber + 'static) -> Self {
        self.bonus_rolls = Some(Box::new(bonus));
        self
    }

    pub fn entry(mut self, entry: impl LootEntry + 'static) -> Self {
        self.entries.push(Box::new(entry));
        self
    }

    pub fn condition(mut self, condition: impl LootCondition + 'static) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }

    pub fn modifier(mut self, modifier: impl LootModifier + 'static) -> Self {
        self.modifiers.push(Box::new(modifier));
        self
    }

    pub fn build(self) -> LootPool {
        LootPool {
            rolls: self.rolls,
            bonus_rolls: self.bonus_rolls,
            entries: self.entries,
            conditions: self.conditions,
            modifiers: self.modifiers,
        }
    }
}
