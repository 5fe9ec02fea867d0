//! The entry/choice tree: composite nodes that produce weighted choices.
//!
//! An entry, handed a context, yields an ordered list of [`LootChoice`]s. The
//! list is recomputed on every request: weights and even which choices exist
//! may depend on context state and randomness, so nothing here is cached.
//! Combinator nodes ([`AlternativeEntry`], [`GroupEntry`], [`SequenceEntry`],
//! [`TagEntry`]) compose child entries; leaf entries yield themselves as
//! their only choice when their conditions pass.

mod combinator;
mod tag;

pub use combinator::{AlternativeEntry, GroupEntry, SequenceEntry};
pub use tag::TagEntry;

use std::any::Any;

use crate::condition::{self, LootCondition};
use crate::context::LootContext;
use crate::error::GenerateError;
use crate::item::ItemStack;

/// A weighted, independently generatable unit produced by an entry for one
/// roll.
pub trait LootChoice: Send + Sync {
    /// The weight of this choice for the current draw.
    ///
    /// Never below one. Implementations may legitimately return different
    /// values for repeated calls with the same context, so callers must
    /// re-evaluate per draw rather than caching.
    fn weight(&self, context: &mut LootContext) -> Result<u64, GenerateError>;

    /// Generates this choice's batch of items.
    fn generate(&self, context: &mut LootContext) -> Result<Vec<ItemStack>, GenerateError>;
}

impl<T: LootChoice + ?Sized> LootChoice for &T {
    fn weight(&self, context: &mut LootContext) -> Result<u64, GenerateError> {
        (**self).weight(context)
    }

    fn generate(&self, context: &mut LootContext) -> Result<Vec<ItemStack>, GenerateError> {
        (**self).generate(context)
    }
}

/// A node of the entry tree.
pub trait LootEntry: Any + Send + Sync {
    /// Produces the choices this entry currently offers.
    ///
    /// The result is recomputed on every call and may be empty, which is a
    /// normal outcome rather than an error.
    fn request_choices<'a>(
        &'a self,
        context: &mut LootContext,
    ) -> Result<Vec<Box<dyn LootChoice + 'a>>, GenerateError>;

    /// Name of the concrete entry type, for error reporting.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// The standard weight formula: `max(1, floor(weight + quality * luck))`,
/// with luck defaulting to zero when absent from the context.
///
/// Quality scales with luck on every evaluation, so weights must be
/// recomputed per draw.
pub fn standard_weight(weight: i64, quality: i64, context: &LootContext) -> u64 {
    let scaled = (weight as f64 + quality as f64 * context.luck()).floor() as i64;
    scaled.max(1) as u64
}

/// The request-choices behavior shared by single-choice leaf entries: yields
/// the entry itself as its only choice when all conditions pass, and nothing
/// otherwise.
pub fn single_choice<'a, C: LootChoice>(
    choice: &'a C,
    conditions: &[Box<dyn LootCondition>],
    context: &mut LootContext,
) -> Result<Vec<Box<dyn LootChoice + 'a>>, GenerateError> {
    if condition::all(conditions, context)? {
        Ok(vec![Box::new(choice)])
    } else {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use crate::testing::ScriptRng;

    #[test]
    fn standard_weight_floors_at_one() {
        let ctx = LootContext::builder().rng(ScriptRng::new(vec![])).build();
        assert_eq!(standard_weight(5, 0, &ctx), 5);
        assert_eq!(standard_weight(0, 0, &ctx), 1);
        assert_eq!(standard_weight(-7, 0, &ctx), 1);
    }

    #[test]
    fn quality_scales_with_luck() {
        let ctx = LootContext::builder()
            .rng(ScriptRng::new(vec![]))
            .with(&keys::LUCK, 1.5)
            .build();
        // floor(2 + 3 * 1.5) = 6
        assert_eq!(standard_weight(2, 3, &ctx), 6);
        // Negative quality can drag the weight down, but never below one.
        assert_eq!(standard_weight(2, -4, &ctx), 1);
    }
}
