//! Number providers: context-dependent integer and real values.

use std::any::Any;

use crate::context::LootContext;
use crate::error::GenerateError;

/// Produces an integer or real value from a context.
///
/// Providers are stateless value objects: any randomness is drawn from the
/// context's RNG, never from provider-local state, so a provider never caches
/// results across contexts. The interface enforces no bounds; range checking
/// is the caller's concern (see [`LootNumberRange`]).
pub trait LootNumber: Any + Send + Sync {
    /// Evaluates this provider as an integer.
    fn get_int(&self, context: &mut LootContext) -> Result<i64, GenerateError>;

    /// Evaluates this provider as a real number.
    fn get_double(&self, context: &mut LootContext) -> Result<f64, GenerateError>;

    /// Name of the concrete provider type, for error reporting.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// An inclusive number range with optional bounds.
///
/// An absent bound never constrains: `check` treats it as passing and `limit`
/// leaves the corresponding side unclamped.
#[derive(Default)]
pub struct LootNumberRange {
    min: Option<Box<dyn LootNumber>>,
    max: Option<Box<dyn LootNumber>>,
}

impl LootNumberRange {
    pub fn new(min: Option<Box<dyn LootNumber>>, max: Option<Box<dyn LootNumber>>) -> Self {
        Self { min, max }
    }

    /// A range with no bounds; every value passes and nothing is clamped.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn min(&self) -> Option<&dyn LootNumber> {
        self.min.as_deref()
    }

    pub fn max(&self) -> Option<&dyn LootNumber> {
        self.max.as_deref()
    }

    /// Returns whether the value lies within both present bounds, inclusively.
    pub fn check(&self, context: &mut LootContext, value: i64) -> Result<bool, GenerateError> {
        if let Some(min) = &self.min
            && min.get_int(context)? > value
        {
            return Ok(false);
        }
        if let Some(max) = &self.max
            && max.get_int(context)? < value
        {
            return Ok(false);
        }
        Ok(true)
    }

    /// Real-valued variant of [`check`](Self::check).
    pub fn check_f64(&self, context: &mut LootContext, value: f64) -> Result<bool, GenerateError> {
        if let Some(min) = &self.min
            && min.get_double(context)? > value
        {
            return Ok(false);
        }
        if let Some(max) = &self.max
            && max.get_double(context)? < value
        {
            return Ok(false);
        }
        Ok(true)
    }

    /// Clamps the value to the present bounds.
    ///
    /// The minimum is applied first, so if the evaluated minimum exceeds the
    /// evaluated maximum the result equals the maximum. This asymmetric
    /// tie-break is part of the contract, not an error case.
    pub fn limit(&self, context: &mut LootContext, value: i64) -> Result<i64, GenerateError> {
        let mut value = value;
        if let Some(min) = &self.min {
            value = value.max(min.get_int(context)?);
        }
        if let Some(max) = &self.max {
            value = value.min(max.get_int(context)?);
        }
        Ok(value)
    }

    /// Real-valued variant of [`limit`](Self::limit).
    pub fn limit_f64(&self, context: &mut LootContext, value: f64) -> Result<f64, GenerateError> {
        let mut value = value;
        if let Some(min) = &self.min {
            value = value.max(min.get_double(context)?);
        }
        if let Some(max) = &self.max {
            value = value.min(max.get_double(context)?);
        }
        Ok(value)
    }
}

impl std::fmt::Debug for LootNumberRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LootNumberRange")
            .field("min", &self.min.as_ref().map(|n| n.type_name()))
            .field("max", &self.max.as_ref().map(|n| n.type_name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedNumber, ScriptRng};

    fn context() -> LootContext {
        LootContext::builder().rng(ScriptRng::new(vec![])).build()
    }

    fn range(min: Option<i64>, max: Option<i64>) -> LootNumberRange {
        LootNumberRange::new(
            min.map(|v| Box::new(FixedNumber(v)) as Box<dyn LootNumber>),
            max.map(|v| Box::new(FixedNumber(v)) as Box<dyn LootNumber>),
        )
    }

    #[test]
    fn absent_bounds_always_pass() {
        let mut ctx = context();
        assert!(range(None, None).check(&mut ctx, i64::MIN).unwrap());
        assert!(range(None, Some(5)).check(&mut ctx, -100).unwrap());
        assert!(range(Some(5), None).check(&mut ctx, 100).unwrap());
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut ctx = context();
        let bounded = range(Some(2), Some(4));
        assert!(!bounded.check(&mut ctx, 1).unwrap());
        assert!(bounded.check(&mut ctx, 2).unwrap());
        assert!(bounded.check(&mut ctx, 4).unwrap());
        assert!(!bounded.check(&mut ctx, 5).unwrap());
    }

    #[test]
    fn limit_clamps_both_sides() {
        let mut ctx = context();
        let bounded = range(Some(2), Some(4));
        assert_eq!(bounded.limit(&mut ctx, 1).unwrap(), 2);
        assert_eq!(bounded.limit(&mut ctx, 3).unwrap(), 3);
        assert_eq!(bounded.limit(&mut ctx, 9).unwrap(), 4);
    }

    #[test]
    fn inverted_bounds_resolve_to_the_maximum() {
        let mut ctx = context();
        let inverted = range(Some(10), Some(5));
        for input in [-3, 0, 7, 100] {
            assert_eq!(inverted.limit(&mut ctx, input).unwrap(), 5);
        }
    }
}
