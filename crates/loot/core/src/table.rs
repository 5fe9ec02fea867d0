//! Loot tables: pools plus table-level modifiers behind a context shape.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::context::LootContext;
use crate::convert::{ConversionContext, field};
use crate::error::{ConvertError, GenerateError};
use crate::item::ItemStack;
use crate::modifier::{self, LootModifier};
use crate::pool::LootPool;

/// Tables addressable by key, as stored in a generation context under
/// [`crate::keys::TABLES`] for table-reference entries to resolve.
pub type TableIndex = HashMap<String, Arc<LootTable>>;

/// The set of context keys a table requires before it will generate.
///
/// Shapes are declared by key name; a violation is a caller error and aborts
/// generation rather than degrading to empty loot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextShape {
    required: Vec<String>,
}

impl ContextShape {
    /// A shape with no requirements.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(required: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Verifies the context carries every required key.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::ShapeViolation`] listing every missing key,
    /// not just the first.
    pub fn verify(&self, context: &LootContext) -> Result<(), GenerateError> {
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|name| !context.has_name(name))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(GenerateError::ShapeViolation { missing })
        }
    }
}

/// Aggregates pools and applies table-level modifiers to their concatenated
/// output.
pub struct LootTable {
    shape: ContextShape,
    pools: Vec<LootPool>,
    modifiers: Vec<Box<dyn LootModifier>>,
}

impl LootTable {
    /// Starts a builder for a table with no shape requirements.
    pub fn builder() -> LootTableBuilder {
        LootTableBuilder {
            shape: ContextShape::empty(),
            pools: Vec::new(),
            modifiers: Vec::new(),
        }
    }

    /// A table that never generates anything.
    pub fn empty() -> Self {
        Self {
            shape: ContextShape::empty(),
            pools: Vec::new(),
            modifiers: Vec::new(),
        }
    }

    pub fn shape(&self) -> &ContextShape {
        &self.shape
    }

    /// Generates this table's batch.
    ///
    /// Pools contribute in declaration order and each pool's internal order
    /// is preserved; table-level modifiers then run over the concatenation.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::ShapeViolation`] if the context does not
    /// satisfy this table's shape, or propagates the first generation error
    /// from below.
    pub fn generate(&self, context: &mut LootContext) -> Result<Vec<ItemStack>, GenerateError> {
        self.shape.verify(context)?;

        if self.pools.is_empty() {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        for pool in &self.pools {
            items.extend(pool.generate(context)?);
        }

        modifier::apply_all(&self.modifiers, items, context)
    }

    pub fn from_node(
        node: &Value,
        context: &ConversionContext<'_>,
    ) -> Result<Self, ConvertError> {
        let object = node.as_object().ok_or(ConvertError::Expected {
            path: context.path().clone(),
            expected: "a table object",
        })?;

        let shape = ContextShape::new(field::str_list_or_empty(
            object,
            "required_context",
            context,
        )?);

        let mut pools = Vec::new();
        if let Some(value) = object.get("pools") {
            let pool_context = context.enter("pools");
            let list = value.as_array().ok_or(ConvertError::Expected {
                path: pool_context.path().clone(),
                expected: "a list",
            })?;
            for (index, pool_node) in list.iter().enumerate() {
                let pool_context = pool_context.enter_index(index);
                let pool_object = pool_node.as_object().ok_or(ConvertError::Expected {
                    path: pool_context.path().clone(),
                    expected: "a pool object",
                })?;
                pools.push(LootPool::from_node(pool_object, &pool_context)?);
            }
        }

        Ok(Self {
            shape,
            pools,
            modifiers: field::modifiers(object, "functions", context)?,
        })
    }

    pub fn to_node(&self, context: &ConversionContext<'_>) -> Result<Value, ConvertError> {
        let mut node = Map::new();

        if !self.shape.required().is_empty() {
            let required: Vec<Value> = self
                .shape
                .required()
                .iter()
                .map(|name| Value::String(name.clone()))
                .collect();
            node.insert("required_context".into(), Value::Array(required));
        }

        if !self.pools.is_empty() {
            let pool_context = context.enter("pools");
            let pools = self
                .pools
                .iter()
                .enumerate()
                .map(|(index, pool)| pool.to_node(&pool_context.enter_index(index)))
                .collect::<Result<Vec<_>, _>>()?;
            node.insert("pools".into(), Value::Array(pools));
        }

        field::put_modifiers(&mut node, "functions", &self.modifiers, context)?;
        Ok(Value::Object(node))
    }
}

/// Accumulates table parts, then freezes a [`LootTable`].
pub struct LootTableBuilder {
    shape: ContextShape,
    pools: Vec<LootPool>,
    modifiers: Vec<Box<dyn LootModifier>>,
}

impl LootTableBuilder {
    pub fn shape(mut self, shape: ContextShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn pool(mut self, pool: LootPool) -> Self {
        self.pools.push(pool);
        self
    }

    pub fn modifier(mut self, modifier: impl LootModifier + 'static) -> Self {
        self.modifiers.push(Box::new(modifier));
        self
    }

    pub fn build(self) -> LootTable {
        LootTable {
            shape: self.shape,
            pools: self.pools,
            modifiers: self.modifiers,
        }
    }
}
