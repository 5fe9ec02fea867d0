//! Boolean predicates over a generation context, with short-circuit
//! combinators.

use std::any::Any;

use crate::context::LootContext;
use crate::error::GenerateError;

/// A stateless predicate over a generation context.
pub trait LootCondition: Any + Send + Sync {
    /// Tests the context against this condition.
    ///
    /// Conditions may draw from the context RNG; a failed test is a normal
    /// outcome, while an error means a required context value was absent.
    fn test(&self, context: &mut LootContext) -> Result<bool, GenerateError>;

    /// Name of the concrete condition type, for error reporting.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Returns whether every condition passes. An empty list passes.
///
/// Evaluation stops at the first failing condition. Callers must not rely on
/// any particular subset of the conditions being evaluated, only on the
/// boolean result.
pub fn all(
    conditions: &[Box<dyn LootCondition>],
    context: &mut LootContext,
) -> Result<bool, GenerateError> {
    for condition in conditions {
        if !condition.test(context)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Returns whether at least one condition passes. An empty list fails.
///
/// Evaluation stops at the first passing condition.
pub fn any(
    conditions: &[Box<dyn LootCondition>],
    context: &mut LootContext,
) -> Result<bool, GenerateError> {
    for condition in conditions {
        if condition.test(context)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Returns whether at least `required` conditions pass.
///
/// `required <= 0` always passes and `required` above the list length always
/// fails, without evaluating anything. Evaluation stops as soon as enough
/// conditions have passed, or as soon as the conditions not yet evaluated
/// cannot bring the passed count up to `required`.
pub fn at_least(
    conditions: &[Box<dyn LootCondition>],
    required: i32,
    context: &mut LootContext,
) -> Result<bool, GenerateError> {
    if required <= 0 {
        return Ok(true);
    }
    let required = required as usize;
    if required > conditions.len() {
        return Ok(false);
    }
    if required == 1 {
        return any(conditions, context);
    }
    if required == conditions.len() {
        return all(conditions, context);
    }

    let mut passed = 0;
    let mut remaining = conditions.len();
    for condition in conditions {
        // Consumed before its result is known, so the pruning check below
        // counts only conditions not yet evaluated.
        remaining -= 1;
        if condition.test(context)? {
            passed += 1;
        }
        if passed >= required {
            return Ok(true);
        }
        if passed + remaining < required {
            return Ok(false);
        }
    }
    // Unreachable while the early exits above are intact.
    Ok(true)
}
