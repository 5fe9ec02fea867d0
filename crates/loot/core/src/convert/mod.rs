//! Conversion between runtime values and generic document trees.
//!
//! Each open family of types (entries, conditions, modifiers, number
//! providers) gets one [`ConversionRegistry`]: a two-phase dispatcher that
//! turns any registered runtime value into a [`serde_json::Value`] and back.
//! Resolution order is fixed: the ordered list of conditional converters is
//! consulted first (first match wins), then the keyed table, which maps a
//! discriminator string stored at the registry's `key_location` field to a
//! converter, and a value's exact runtime type to the same converter for the
//! serialize direction.
//!
//! Registries are built once through [`RegistryBuilder`], which validates the
//! no-duplicate-discriminator and no-duplicate-type invariants at build time
//! and rejects the whole registry on conflict. A built registry is immutable
//! and can be shared freely across threads.

pub mod field;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;

use serde_json::{Map, Value};

use crate::condition::LootCondition;
use crate::entry::LootEntry;
use crate::error::{ConvertError, NodePath, RegistryError};
use crate::modifier::LootModifier;
use crate::number::LootNumber;

/// Upcast access to [`Any`] for a conversion family's trait object, so
/// registries can key converters by exact runtime type.
///
/// Implemented once per family, on the `dyn` trait object itself.
pub trait AnyRef: Any {
    /// The value as [`Any`], typed by its concrete implementation.
    fn as_any(&self) -> &dyn Any;

    /// Name of the concrete implementation type.
    fn type_name(&self) -> &'static str;
}

impl AnyRef for dyn LootEntry {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        LootEntry::type_name(self)
    }
}

impl AnyRef for dyn LootCondition {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        LootCondition::type_name(self)
    }
}

impl AnyRef for dyn LootModifier {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        LootModifier::type_name(self)
    }
}

impl AnyRef for dyn LootNumber {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        LootNumber::type_name(self)
    }
}

/// A converter for one concrete member type of the family `V`.
///
/// Keyed converters read and write the body of a document node; the registry
/// owns the discriminator field.
pub trait TypedConverter<V: ?Sized>: Send + Sync {
    /// Identity of the concrete type this converter handles.
    fn target_type(&self) -> TypeId;

    /// Name of the concrete type this converter handles.
    fn target_name(&self) -> &'static str;

    /// Writes the value's fields into the given node body.
    fn serialize(
        &self,
        value: &V,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError>;

    /// Rebuilds a value from the given node body.
    fn deserialize(
        &self,
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Box<V>, ConvertError>;
}

/// Adapts a pair of plain functions over a concrete type `T` into a
/// [`TypedConverter`] for the family `V`.
pub struct FnConverter<T, V: ?Sized> {
    serialize: fn(&T, &mut Map<String, Value>, &ConversionContext<'_>) -> Result<(), ConvertError>,
    deserialize: fn(&Map<String, Value>, &ConversionContext<'_>) -> Result<T, ConvertError>,
    boxed: fn(T) -> Box<V>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync, V: AnyRef + ?Sized> FnConverter<T, V> {
    pub fn new(
        serialize: fn(
            &T,
            &mut Map<String, Value>,
            &ConversionContext<'_>,
        ) -> Result<(), ConvertError>,
        deserialize: fn(&Map<String, Value>, &ConversionContext<'_>) -> Result<T, ConvertError>,
        boxed: fn(T) -> Box<V>,
    ) -> Self {
        Self {
            serialize,
            deserialize,
            boxed,
            _marker: PhantomData,
        }
    }
}

impl<T: Any + Send + Sync, V: AnyRef + ?Sized> TypedConverter<V> for FnConverter<T, V> {
    fn target_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn target_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn serialize(
        &self,
        value: &V,
        node: &mut Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        match value.as_any().downcast_ref::<T>() {
            Some(concrete) => (self.serialize)(concrete, node, context),
            // Registries look converters up by exact type id, so this only
            // fires if a converter was registered against the wrong type.
            None => Err(ConvertError::UnknownType {
                family: std::any::type_name::<V>(),
                type_name: value.type_name(),
            }),
        }
    }

    fn deserialize(
        &self,
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Box<V>, ConvertError> {
        Ok((self.boxed)((self.deserialize)(node, context)?))
    }
}

/// A converter selected by a runtime predicate rather than a discriminator.
///
/// Conditional converters are consulted before the keyed table, in
/// registration order, and the first acceptance wins. They are the hook for
/// shorthand forms, e.g. a bare scalar standing in for a constant-valued
/// number provider. Unlike keyed converters they own the whole output node,
/// which is what allows them to produce non-object forms.
pub trait ConditionalConverter<V: ?Sized>: Send + Sync {
    fn can_serialize(&self, value: &V, context: &ConversionContext<'_>) -> bool;

    fn serialize(
        &self,
        value: &V,
        context: &ConversionContext<'_>,
    ) -> Result<Value, ConvertError>;

    fn can_deserialize(&self, node: &Value, context: &ConversionContext<'_>) -> bool;

    fn deserialize(
        &self,
        node: &Value,
        context: &ConversionContext<'_>,
    ) -> Result<Box<V>, ConvertError>;
}

/// Two-phase converter dispatcher for one family of types.
pub struct ConversionRegistry<V: AnyRef + ?Sized> {
    family: &'static str,
    key_location: &'static str,
    conditionals: Vec<Box<dyn ConditionalConverter<V>>>,
    keyed: Vec<(String, Box<dyn TypedConverter<V>>)>,
    by_key: HashMap<String, usize>,
    by_type: HashMap<TypeId, usize>,
}

impl<V: AnyRef + ?Sized> ConversionRegistry<V> {
    /// Starts a builder for a registry with the given family label (used in
    /// error messages) and discriminator field name.
    pub fn builder(family: &'static str, key_location: &'static str) -> RegistryBuilder<V> {
        RegistryBuilder {
            family,
            key_location,
            conditionals: Vec::new(),
            keyed: Vec::new(),
        }
    }

    /// The discriminator field name this registry reads and writes.
    pub fn key_location(&self) -> &'static str {
        self.key_location
    }

    /// The discriminator registered for the value's runtime type, if any.
    pub fn key_for(&self, value: &V) -> Option<&str> {
        self.by_type
            .get(&value.as_any().type_id())
            .map(|&index| self.keyed[index].0.as_str())
    }

    /// Serializes a runtime value into a document node.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::UnknownType`] when no conditional converter
    /// accepts the value and its exact runtime type has no keyed converter.
    pub fn serialize(
        &self,
        value: &V,
        context: &ConversionContext<'_>,
    ) -> Result<Value, ConvertError> {
        for conditional in &self.conditionals {
            if conditional.can_serialize(value, context) {
                return conditional.serialize(value, context);
            }
        }

        let Some(&index) = self.by_type.get(&value.as_any().type_id()) else {
            return Err(ConvertError::UnknownType {
                family: self.family,
                type_name: value.type_name(),
            });
        };
        let (key, converter) = &self.keyed[index];

        let mut node = Map::new();
        node.insert(
            self.key_location.to_string(),
            Value::String(key.clone()),
        );
        converter.serialize(value, &mut node, context)?;
        Ok(Value::Object(node))
    }

    /// Deserializes a document node into a runtime value.
    ///
    /// # Errors
    ///
    /// When no conditional converter accepts the node, returns
    /// [`ConvertError::MalformedDiscriminator`] if the node has no string at
    /// the key location, or [`ConvertError::UnknownDiscriminator`] if the
    /// string is not registered.
    pub fn deserialize(
        &self,
        node: &Value,
        context: &ConversionContext<'_>,
    ) -> Result<Box<V>, ConvertError> {
        for conditional in &self.conditionals {
            if conditional.can_deserialize(node, context) {
                return conditional.deserialize(node, context);
            }
        }

        let object = node.as_object().ok_or_else(|| {
            ConvertError::MalformedDiscriminator {
                path: context.path().clone(),
                key_location: self.key_location,
            }
        })?;
        let Some(Value::String(key)) = object.get(self.key_location) else {
            return Err(ConvertError::MalformedDiscriminator {
                path: context.path().clone(),
                key_location: self.key_location,
            });
        };
        let Some(&index) = self.by_key.get(key.as_str()) else {
            return Err(ConvertError::UnknownDiscriminator {
                path: context.path().clone(),
                family: self.family,
                key: key.clone(),
            });
        };
        self.keyed[index].1.deserialize(object, context)
    }
}

/// Accumulates converters, then validates and freezes a
/// [`ConversionRegistry`].
pub struct RegistryBuilder<V: AnyRef + ?Sized> {
    family: &'static str,
    key_location: &'static str,
    conditionals: Vec<Box<dyn ConditionalConverter<V>>>,
    keyed: Vec<(String, Box<dyn TypedConverter<V>>)>,
}

impl<V: AnyRef + ?Sized> RegistryBuilder<V> {
    /// Registers a keyed converter under the given discriminator.
    ///
    /// Conflicts are reported by [`build`](Self::build), not here, so
    /// registration order carries no significance for keyed converters.
    pub fn keyed(
        mut self,
        key: impl Into<String>,
        converter: impl TypedConverter<V> + 'static,
    ) -> Self {
        self.keyed.push((key.into(), Box::new(converter)));
        self
    }

    /// Appends a conditional converter.
    ///
    /// Conditional converters are tried before the keyed table, in the order
    /// they were appended; the first acceptance wins and later ones are not
    /// consulted.
    pub fn conditional(mut self, converter: impl ConditionalConverter<V> + 'static) -> Self {
        self.conditionals.push(Box::new(converter));
        self
    }

    /// Validates the registry invariants and freezes the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateKey`] if two keyed converters share
    /// a discriminator, or [`RegistryError::DuplicateType`] if two declare
    /// the same concrete type. Either conflict rejects the whole registry.
    pub fn build(self) -> Result<ConversionRegistry<V>, RegistryError> {
        let mut by_key = HashMap::new();
        let mut by_type = HashMap::new();

        for (index, (key, converter)) in self.keyed.iter().enumerate() {
            if by_key.insert(key.clone(), index).is_some() {
                return Err(RegistryError::DuplicateKey {
                    family: self.family,
                    key: key.clone(),
                });
            }
            if let Some(&existing) = by_type.get(&converter.target_type()) {
                let existing: usize = existing;
                return Err(RegistryError::DuplicateType {
                    family: self.family,
                    type_name: converter.target_name(),
                    existing: self.keyed[existing].0.clone(),
                });
            }
            by_type.insert(converter.target_type(), index);
        }

        Ok(ConversionRegistry {
            family: self.family,
            key_location: self.key_location,
            conditionals: self.conditionals,
            keyed: self.keyed,
            by_key,
            by_type,
        })
    }
}

/// One registry per family, bundled for explicit dependency injection.
///
/// The host builds a set once and threads it through conversion via
/// [`ConversionContext`]; there are no process-wide default registries.
pub struct RegistrySet {
    entries: ConversionRegistry<dyn LootEntry>,
    conditions: ConversionRegistry<dyn LootCondition>,
    modifiers: ConversionRegistry<dyn LootModifier>,
    numbers: ConversionRegistry<dyn LootNumber>,
}

impl RegistrySet {
    pub fn new(
        entries: ConversionRegistry<dyn LootEntry>,
        conditions: ConversionRegistry<dyn LootCondition>,
        modifiers: ConversionRegistry<dyn LootModifier>,
        numbers: ConversionRegistry<dyn LootNumber>,
    ) -> Self {
        Self {
            entries,
            conditions,
            modifiers,
            numbers,
        }
    }

    /// A set of four empty registries with the conventional discriminator
    /// field names. Useful as a starting point in tests and tools.
    pub fn empty() -> Self {
        fn empty_registry<V: AnyRef + ?Sized>(
            family: &'static str,
            key_location: &'static str,
        ) -> ConversionRegistry<V> {
            ConversionRegistry {
                family,
                key_location,
                conditionals: Vec::new(),
                keyed: Vec::new(),
                by_key: HashMap::new(),
                by_type: HashMap::new(),
            }
        }

        Self {
            entries: empty_registry("entry", "type"),
            conditions: empty_registry("condition", "condition"),
            modifiers: empty_registry("modifier", "function"),
            numbers: empty_registry("number", "type"),
        }
    }

    pub fn entries(&self) -> &ConversionRegistry<dyn LootEntry> {
        &self.entries
    }

    pub fn conditions(&self) -> &ConversionRegistry<dyn LootCondition> {
        &self.conditions
    }

    pub fn modifiers(&self) -> &ConversionRegistry<dyn LootModifier> {
        &self.modifiers
    }

    pub fn numbers(&self) -> &ConversionRegistry<dyn LootNumber> {
        &self.numbers
    }

    /// A conversion context rooted at `$`.
    pub fn conversion(&self) -> ConversionContext<'_> {
        ConversionContext {
            registries: self,
            path: NodePath::root(),
        }
    }
}

/// Ambient state for one conversion call: the active registry set and the
/// path of the node currently being converted.
///
/// Unlike the generation context this carries no RNG; conversion is
/// deterministic.
#[derive(Clone)]
pub struct ConversionContext<'a> {
    registries: &'a RegistrySet,
    path: NodePath,
}

impl<'a> ConversionContext<'a> {
    pub fn registries(&self) -> &'a RegistrySet {
        self.registries
    }

    /// The path of the node this context refers to.
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// A context for the named child of the current node.
    pub fn enter(&self, field: impl Into<String>) -> Self {
        Self {
            registries: self.registries,
            path: self.path.child(field),
        }
    }

    /// A context for a list element of the current node.
    pub fn enter_index(&self, index: usize) -> Self {
        Self {
            registries: self.registries,
            path: self.path.index(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // A miniature conversion family, independent of the loot families, to
    // exercise the registry in isolation.
    trait Figure: Any + Send + Sync {
        fn type_name(&self) -> &'static str {
            std::any::type_name::<Self>()
        }
    }

    impl AnyRef for dyn Figure {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn type_name(&self) -> &'static str {
            Figure::type_name(self)
        }
    }

    impl std::fmt::Debug for dyn Figure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(Figure::type_name(self))
        }
    }

    #[derive(Debug, PartialEq)]
    struct Circle {
        radius: f64,
    }

    #[derive(Debug, PartialEq)]
    struct Square {
        side: f64,
    }

    struct Triangle;

    impl Figure for Circle {}
    impl Figure for Square {}
    impl Figure for Triangle {}

    fn circle_to_node(
        circle: &Circle,
        node: &mut Map<String, Value>,
        _context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        node.insert("radius".into(), json!(circle.radius));
        Ok(())
    }

    fn circle_from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Circle, ConvertError> {
        Ok(Circle {
            radius: field::require_f64(node, "radius", context)?,
        })
    }

    fn square_to_node(
        square: &Square,
        node: &mut Map<String, Value>,
        _context: &ConversionContext<'_>,
    ) -> Result<(), ConvertError> {
        node.insert("side".into(), json!(square.side));
        Ok(())
    }

    fn square_from_node(
        node: &Map<String, Value>,
        context: &ConversionContext<'_>,
    ) -> Result<Square, ConvertError> {
        Ok(Square {
            side: field::require_f64(node, "side", context)?,
        })
    }

    fn circle_converter() -> FnConverter<Circle, dyn Figure> {
        FnConverter::new(circle_to_node, circle_from_node, |circle| Box::new(circle))
    }

    fn square_converter() -> FnConverter<Square, dyn Figure> {
        FnConverter::new(square_to_node, square_from_node, |square| Box::new(square))
    }

    /// Deserializes the string `"dot"` as a zero-radius circle, and
    /// serializes zero-radius circles back to it.
    struct DotShorthand;

    impl ConditionalConverter<dyn Figure> for DotShorthand {
        fn can_serialize(&self, value: &dyn Figure, _context: &ConversionContext<'_>) -> bool {
            matches!(value.as_any().downcast_ref::<Circle>(), Some(c) if c.radius == 0.0)
        }

        fn serialize(
            &self,
            _value: &dyn Figure,
            _context: &ConversionContext<'_>,
        ) -> Result<Value, ConvertError> {
            Ok(json!("dot"))
        }

        fn can_deserialize(&self, node: &Value, _context: &ConversionContext<'_>) -> bool {
            node.as_str() == Some("dot")
        }

        fn deserialize(
            &self,
            _node: &Value,
            _context: &ConversionContext<'_>,
        ) -> Result<Box<dyn Figure>, ConvertError> {
            Ok(Box::new(Circle { radius: 0.0 }))
        }
    }

    /// A second shorthand that also claims `"dot"`, used to prove that the
    /// first registered conditional wins.
    struct GreedyDot;

    impl ConditionalConverter<dyn Figure> for GreedyDot {
        fn can_serialize(&self, _value: &dyn Figure, _context: &ConversionContext<'_>) -> bool {
            false
        }

        fn serialize(
            &self,
            _value: &dyn Figure,
            _context: &ConversionContext<'_>,
        ) -> Result<Value, ConvertError> {
            unreachable!("can_serialize is always false")
        }

        fn can_deserialize(&self, node: &Value, _context: &ConversionContext<'_>) -> bool {
            node.as_str() == Some("dot")
        }

        fn deserialize(
            &self,
            _node: &Value,
            _context: &ConversionContext<'_>,
        ) -> Result<Box<dyn Figure>, ConvertError> {
            Ok(Box::new(Circle { radius: 999.0 }))
        }
    }

    fn registry() -> ConversionRegistry<dyn Figure> {
        ConversionRegistry::builder("figure", "kind")
            .keyed("circle", circle_converter())
            .keyed("square", square_converter())
            .build()
            .unwrap()
    }

    #[test]
    fn distinct_keys_and_types_build() {
        registry();
    }

    #[test]
    fn duplicate_discriminator_rejects_the_registry() {
        let result = ConversionRegistry::<dyn Figure>::builder("figure", "kind")
            .keyed("circle", circle_converter())
            .keyed("circle", square_converter())
            .build();
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateKey { key, .. }) if key == "circle"
        ));
    }

    #[test]
    fn duplicate_type_rejects_the_registry() {
        let result = ConversionRegistry::<dyn Figure>::builder("figure", "kind")
            .keyed("circle", circle_converter())
            .keyed("round", circle_converter())
            .build();
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateType { existing, .. }) if existing == "circle"
        ));
    }

    #[test]
    fn round_trip_through_the_keyed_table() {
        let set = RegistrySet::empty();
        let ctx = set.conversion();
        let registry = registry();

        let node = registry.serialize(&Square { side: 3.5 }, &ctx).unwrap();
        assert_eq!(node, json!({"kind": "square", "side": 3.5}));

        let value = registry.deserialize(&node, &ctx).unwrap();
        let square = value.as_any().downcast_ref::<Square>().unwrap();
        assert_eq!(square, &Square { side: 3.5 });
    }

    #[test]
    fn serialize_unknown_type_fails() {
        let set = RegistrySet::empty();
        let ctx = set.conversion();
        let err = registry().serialize(&Triangle, &ctx).unwrap_err();
        assert!(matches!(err, ConvertError::UnknownType { family, .. } if family == "figure"));
    }

    #[test]
    fn deserialize_without_discriminator_fails() {
        let set = RegistrySet::empty();
        let ctx = set.conversion();
        let registry = registry();

        for node in [json!({"radius": 1.0}), json!({"kind": 7}), json!(false)] {
            let err = registry.deserialize(&node, &ctx).unwrap_err();
            assert!(matches!(
                err,
                ConvertError::MalformedDiscriminator { key_location, .. } if key_location == "kind"
            ));
        }
    }

    #[test]
    fn deserialize_unknown_discriminator_fails() {
        let set = RegistrySet::empty();
        let ctx = set.conversion();
        let err = registry()
            .deserialize(&json!({"kind": "hexagon"}), &ctx)
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::UnknownDiscriminator { key, .. } if key == "hexagon"
        ));
    }

    #[test]
    fn conditionals_run_before_the_keyed_table_in_order() {
        let set = RegistrySet::empty();
        let ctx = set.conversion();
        let registry = ConversionRegistry::<dyn Figure>::builder("figure", "kind")
            .conditional(DotShorthand)
            .conditional(GreedyDot)
            .keyed("circle", circle_converter())
            .build()
            .unwrap();

        // First registered conditional wins; GreedyDot's 999 radius never
        // appears.
        let value = registry.deserialize(&json!("dot"), &ctx).unwrap();
        let circle = value.as_any().downcast_ref::<Circle>().unwrap();
        assert_eq!(circle.radius, 0.0);

        // The shorthand also owns the serialize direction for its values.
        let node = registry.serialize(&Circle { radius: 0.0 }, &ctx).unwrap();
        assert_eq!(node, json!("dot"));

        // Other circles fall through to the keyed table.
        let node = registry.serialize(&Circle { radius: 2.0 }, &ctx).unwrap();
        assert_eq!(node, json!({"kind": "circle", "radius": 2.0}));
    }

    #[test]
    fn key_for_reports_the_registered_discriminator() {
        let registry = registry();
        assert_eq!(registry.key_for(&Circle { radius: 1.0 }), Some("circle"));
        assert_eq!(registry.key_for(&Triangle), None);
    }
}
