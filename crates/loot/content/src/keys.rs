//! Context keys read by the built-in leaf catalogue.

use loot_core::ContextKey;

/// Radius of the explosion that triggered generation, consumed by
/// [`crate::modifier::ExplosionDecayModifier`].
pub const EXPLOSION_RADIUS: ContextKey<f64> = ContextKey::new("explosion_radius");
