//! Built-in number providers: constant, uniform, and binomial.

use serde_json::{Map, Value};

use loot_core::convert::{AnyRef, ConditionalConverter, ConversionContext, FnConverter, field};
use loot_core::error::{ConvertError, GenerateError};
use loot_core::{LootContext, LootNumber};

/// A value that always evaluates to the same number.
///
/// Rounds when asked for an integer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantNumber(pub f64);

impl ConstantNumber {
    pub const KEY: &'static str = "constant";

    fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self(field::require_f64(node, "value", context)?))
    }

    fn to_node(
        &self,
        node: &mut Map<String, Value>,
        _context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        node.insert("value".into(), Value::from(self.0));
        Ok(())
    }

    pub(crate) fn converter() -> FnConverter<Self, dyn LootNumber> {
        FnConverter::new(Self::to_node, Self::from_node, |number| Box::new(number))
    }
}

impl LootNumber for ConstantNumber {
    fn get_int(&self, _context: &mut LootContext) -> Result<i64, GenerateError> {
        Ok(self.0.round() as i64)
    }

    fn get_double(&self, _context: &mut LootContext) -> Result<f64, GenerateError> {
        Ok(self.0)
    }
}

/// The bare-scalar shorthand: a lone number in a document deserializes as a
/// [`ConstantNumber`], and constants serialize back to a bare scalar.
///
/// Registered as a conditional converter ahead of the keyed table, so the
/// explicit `{"type": "constant", ...}` form still round-trips through the
/// keyed converter when this shorthand is absent.
pub struct ScalarShorthand;

impl ConditionalConverter<dyn LootNumber> for ScalarShorthand {
    fn can_serialize(&self, value: &dyn LootNumber, _context: &ConversionContext<'_>) -> bool {
        value.as_any().downcast_ref::<ConstantNumber>().is_some()
    }

    fn serialize(
        &self,
        value: &dyn LootNumber,
        _context: &ConversionContext<'_>,
    ) -> Result<Value, ConvertError> {
        let constant = value
            .as_any()
            .downcast_ref::<ConstantNumber>()
            .ok_or(ConvertError::UnknownType {
                family: "number",
                type_name: value.type_name(),
            })?;
        Ok(Value::from(constant.0))
    }

    fn can_deserialize(&self, node: &Value, _context: &ConversionContext<'_>) -> bool {
        node.is_number()
    }

    fn deserialize(
        &self,
        node: &Value,
        context: &ConversionContext<'_>,
    ) -> Result<Box<dyn LootNumber>, ConvertError> {
        let value = node.as_f64().ok_or(ConvertError::Expected {
            path: context.path().clone(),
            expected: "a number",
        })?;
        Ok(Box::new(ConstantNumber(value)))
    }
}

/// A uniformly distributed value between two provider-valued bounds.
///
/// Integer evaluation is inclusive of both bounds; real evaluation draws
/// from the half-open interval.
pub struct UniformNumber {
    min: Box<dyn LootNumber>,
    max: Box<dyn LootNumber>,
}

impl UniformNumber {
    pub const KEY: &'static str = "uniform";

    pub fn new(min: impl LootNumber + 'static, max: impl LootNumber + 'static) -> Self {
        Self {
            min: Box::new(min),
            max: Box::new(max),
        }
    }

    fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            min: field::number(node, "min", context)?,
            max: field::number(node, "max", context)?,
        })
    }

    fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_number(node, "min", self.min.as_ref(), context)?;
        field::put_number(node, "max", self.max.as_ref(), context)
    }

    pub(crate) fn converter() -> FnConverter<Self, dyn LootNumber> {
        FnConverter::new(Self::to_node, Self::from_node, |number| Box::new(number))
    }
}

impl LootNumber for UniformNumber {
    fn get_int(&self, context: &mut LootContext) -> Result<i64, GenerateError> {
        let min = self.min.get_int(context)?;
        let max = self.max.get_int(context)?;
        Ok(context.next_i64_inclusive(min, max))
    }

    fn get_double(&self, context: &mut LootContext) -> Result<f64, GenerateError> {
        let min = self.min.get_double(context)?;
        let max = self.max.get_double(context)?;
        Ok(context.next_f64_range(min, max))
    }
}

/// A binomially distributed value: the number of successes over `n` trials
/// with per-trial probability `p`.
pub struct BinomialNumber {
    trials: Box<dyn LootNumber>,
    probability: Box<dyn LootNumber>,
}

impl BinomialNumber {
    pub const KEY: &'static str = "binomial";

    pub fn new(
        trials: impl LootNumber + 'static,
        probability: impl LootNumber + 'static,
    ) -> Self {
        Self {
            trials: Box::new(trials),
            probability: Box::new(probability),
        }
    }

    fn from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            trials: field::number(node, "n", context)?,
            probability: field::number(node, "p", context)?,
        })
    }

    fn to_node(
        &self,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        field::put_number(node, "n", self.trials.as_ref(), context)?;
        field::put_number(node, "p", self.probability.as_ref(), context)
    }

    pub(crate) fn converter() -> FnConverter<Self, dyn LootNumber> {
        FnConverter::new(Self::to_node, Self::from_node, |number| Box::new(number))
    }
}

impl LootNumber for BinomialNumber {
    fn get_int(&self, context: &mut LootContext) -> Result<i64, GenerateError> {
        let trials = self.trials.get_int(context)?;
        let probability = self.probability.get_double(context)?;

        let mut successes = 0;
        for _ in 0..trials {
            if context.next_f64() < probability {
                successes += 1;
            }
        }
        Ok(successes)
    }

    fn get_double(&self, context: &mut LootContext) -> Result<f64, GenerateError> {
        Ok(self.get_int(context)? as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn context() -> LootContext {
        LootContext::builder()
            .rng(ChaCha12Rng::seed_from_u64(11))
            .build()
    }

    #[test]
    fn constant_rounds_for_integers() {
        let mut ctx = context();
        assert_eq!(ConstantNumber(2.6).get_int(&mut ctx).unwrap(), 3);
        assert_eq!(ConstantNumber(2.6).get_double(&mut ctx).unwrap(), 2.6);
    }

    #[test]
    fn uniform_stays_inside_inclusive_bounds() {
        let mut ctx = context();
        let uniform = UniformNumber::new(ConstantNumber(2.0), ConstantNumber(5.0));
        for _ in 0..200 {
            let value = uniform.get_int(&mut ctx).unwrap();
            assert!((2..=5).contains(&value), "out of range: {value}");
        }
    }

    #[test]
    fn binomial_degenerate_probabilities() {
        let mut ctx = context();
        let never = BinomialNumber::new(ConstantNumber(10.0), ConstantNumber(0.0));
        assert_eq!(never.get_int(&mut ctx).unwrap(), 0);

        let always = BinomialNumber::new(ConstantNumber(10.0), ConstantNumber(1.0));
        assert_eq!(always.get_int(&mut ctx).unwrap(), 10);
    }
}
