//! Modifiers: transformations applied to generated item batches.

use std::any::Any;

use crate::context::LootContext;
use crate::error::GenerateError;
use crate::item::ItemStack;

/// Transforms a generated batch of items.
///
/// A modifier may rewrite the whole batch or work element-wise at its own
/// discretion; what the engine guarantees is that modifiers in a list are
/// applied in list order, each seeing the previous one's output.
pub trait LootModifier: Any + Send + Sync {
    /// Applies this modifier to the batch.
    fn modify(
        &self,
        items: Vec<ItemStack>,
        context: &mut LootContext,
    ) -> Result<Vec<ItemStack>, GenerateError>;

    /// Name of the concrete modifier type, for error reporting.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Applies every modifier to the batch, in list order.
pub fn apply_all(
    modifiers: &[Box<dyn LootModifier>],
    items: Vec<ItemStack>,
    context: &mut LootContext,
) -> Result<Vec<ItemStack>, GenerateError> {
    let mut items = items;
    for modifier in modifiers {
        items = modifier.modify(items, context)?;
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptRng;

    /// Appends its marker item to the batch, recording application order.
    struct Append(&'static str);

    impl LootModifier for Append {
        fn modify(
            &self,
            mut items: Vec<ItemStack>,
            _context: &mut LootContext,
        ) -> Result<Vec<ItemStack>, GenerateError> {
            items.push(ItemStack::of(self.0));
            Ok(items)
        }
    }

    #[test]
    fn modifiers_apply_in_list_order() {
        let mut ctx = LootContext::builder().rng(ScriptRng::new(vec![])).build();
        let modifiers: Vec<Box<dyn LootModifier>> =
            vec![Box::new(Append("first")), Box::new(Append("second"))];

        let result = apply_all(&modifiers, vec![ItemStack::of("seed")], &mut ctx).unwrap();
        let ids: Vec<&str> = result.iter().map(|stack| stack.id.as_str()).collect();
        assert_eq!(ids, vec!["seed", "first", "second"]);
    }

    #[test]
    fn empty_modifier_list_is_identity() {
        let mut ctx = LootContext::builder().rng(ScriptRng::new(vec![])).build();
        let items = vec![ItemStack::new("coal", 3)];
        let result = apply_all(&[], items.clone(), &mut ctx).unwrap();
        assert_eq!(result, items);
    }
}
