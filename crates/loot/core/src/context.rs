//! Generation context: an immutable bag of typed values plus an RNG handle.
//!
//! A [`LootContext`] carries all ambient state a single generation call needs:
//! typed slots addressed through [`ContextKey`]s, and the random number source
//! every weighted decision draws from. Contexts are built once through
//! [`ContextBuilder`] and never mutated afterward, except for the RNG, which
//! advances as values are drawn.
//!
//! # Determinism
//!
//! Every random decision in the engine flows through the draw helpers on this
//! type, in a fixed order. Seeding the context with a deterministic RNG (for
//! example `rand_chacha`) therefore reproduces an entire generation run.

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;

use rand::RngCore;

use crate::error::GenerateError;
use crate::keys;

/// Addresses one slot of a [`LootContext`] with a compile-time value type.
///
/// Equality of slots is by name, but the stored value is also checked against
/// `T` at read time: two keys may share a name while disagreeing on type, and
/// a read through the wrong-typed key behaves as if the slot were absent.
pub struct ContextKey<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    /// Creates a key with the given name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }

    /// The name values are stored under.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextKey<T> {}

impl<T> std::fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ContextKey").field(&self.name).finish()
    }
}

/// Ambient state for one generation call.
pub struct LootContext {
    rng: Box<dyn RngCore + Send>,
    slots: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl LootContext {
    /// Creates a new builder with no slots and no RNG.
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    /// Returns whether a value of the key's type is stored under the key.
    pub fn has<T: Any>(&self, key: &ContextKey<T>) -> bool {
        self.get(key).is_some()
    }

    /// Returns whether any value is stored under the name, regardless of type.
    ///
    /// Table shapes are declared by name only, so shape verification uses this
    /// rather than the typed accessors.
    pub fn has_name(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Returns the value stored under the key, if present and of the key's type.
    pub fn get<T: Any>(&self, key: &ContextKey<T>) -> Option<&T> {
        self.slots
            .get(key.name)
            .and_then(|slot| slot.as_ref().downcast_ref::<T>())
    }

    /// Returns the value stored under the key, or the given default.
    pub fn get_or<'a, T: Any>(&'a self, key: &ContextKey<T>, default: &'a T) -> &'a T {
        self.get(key).unwrap_or(default)
    }

    /// Returns the value stored under the key, failing if absent.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::MissingContextValue`] if the slot is absent or
    /// holds a value of a different type.
    pub fn assure<T: Any>(&self, key: &ContextKey<T>) -> Result<&T, GenerateError> {
        self.get(key).ok_or(GenerateError::MissingContextValue {
            key: key.name,
            type_name: std::any::type_name::<T>(),
        })
    }

    /// The context's luck value, defaulting to zero when absent.
    ///
    /// Luck scales choice quality and pool bonus rolls.
    pub fn luck(&self) -> f64 {
        self.get(&keys::LUCK).copied().unwrap_or(0.0)
    }

    /// Direct access to the RNG handle.
    pub fn rng(&mut self) -> &mut (dyn RngCore + Send) {
        &mut *self.rng
    }

    /// Draws a value uniformly from `[0, bound)`, or zero when `bound` is zero.
    pub fn next_bounded(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.rng.next_u64() % bound
    }

    /// Draws a value in `[0, 1)` with 53 bits of precision.
    pub fn next_f64(&mut self) -> f64 {
        (self.rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draws an integer from `[min, max]` inclusive.
    ///
    /// Returns `min` without drawing when the bounds are degenerate
    /// (`min >= max`).
    pub fn next_i64_inclusive(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        let span = (max - min + 1) as u64;
        min + self.next_bounded(span) as i64
    }

    /// Draws a value from `[min, max)`.
    ///
    /// Returns `min` without drawing when the bounds are degenerate.
    pub fn next_f64_range(&mut self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        min + self.next_f64() * (max - min)
    }
}

impl std::fmt::Debug for LootContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.slots.keys().collect();
        names.sort();
        f.debug_struct("LootContext").field("slots", &names).finish()
    }
}

/// Accumulates slots and an RNG, then freezes into a [`LootContext`].
pub struct ContextBuilder {
    rng: Option<Box<dyn RngCore + Send>>,
    slots: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl ContextBuilder {
    fn new() -> Self {
        Self {
            rng: None,
            slots: HashMap::new(),
        }
    }

    /// Stores a value under the given key.
    ///
    /// Storing twice under the same name replaces the earlier value.
    pub fn with<T: Any + Send + Sync>(mut self, key: &ContextKey<T>, value: T) -> Self {
        self.slots.insert(key.name(), Box::new(value));
        self
    }

    /// Sets the random number source for the built context.
    pub fn rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    /// Freezes this builder into an immutable context.
    ///
    /// # Panics
    ///
    /// Panics if no RNG was provided. A generation context without a random
    /// source is meaningless and indicates a programming error.
    pub fn build(self) -> LootContext {
        let rng = self
            .rng
            .expect("LootContext cannot be built without a random number source");
        LootContext {
            rng,
            slots: self.slots,
        }
    }
}
