//! Error types for registry construction, conversion, and generation.
//!
//! The three enums mirror the three phases a loot table moves through:
//! [`RegistryError`] covers registry build time (programmer errors, fatal),
//! [`ConvertError`] covers reading and writing document trees (reported with
//! the offending node's path), and [`GenerateError`] covers the rare failures
//! that can interrupt generation itself.

use std::fmt;

/// Path to a node inside a document tree, used to localize conversion errors.
///
/// Paths render in the familiar `$.pools[0].entries[2]` form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodePath {
    segments: Vec<PathSegment>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum PathSegment {
    Field(String),
    Index(usize),
}

impl NodePath {
    /// The root path, `$`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path descending into the named child.
    pub fn child(&self, field: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Field(field.into()));
        Self { segments }
    }

    /// Returns a new path descending into a list element.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Errors raised while building a conversion registry.
///
/// These indicate a mistake in registration code, not in any document, so a
/// single conflict rejects the whole registry instead of silently dropping
/// one of the two entries.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Two keyed converters were registered under the same discriminator.
    #[error("discriminator '{key}' is registered twice in the {family} registry")]
    DuplicateKey { family: &'static str, key: String },

    /// Two keyed converters declared the same concrete type.
    #[error(
        "type '{type_name}' is already registered under discriminator '{existing}' \
         in the {family} registry"
    )]
    DuplicateType {
        family: &'static str,
        type_name: &'static str,
        existing: String,
    },
}

/// Errors raised while converting between runtime values and document trees.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Serialization found no keyed converter for the value's runtime type.
    #[error("no converter registered for runtime type '{type_name}' in the {family} registry")]
    UnknownType {
        family: &'static str,
        type_name: &'static str,
    },

    /// The discriminator field was missing or not a string.
    #[error("{path}: expected a string discriminator at '{key_location}'")]
    MalformedDiscriminator {
        path: NodePath,
        key_location: &'static str,
    },

    /// The discriminator value has no registered converter.
    #[error("{path}: unknown discriminator '{key}' in the {family} registry")]
    UnknownDiscriminator {
        path: NodePath,
        family: &'static str,
        key: String,
    },

    /// A required field was absent.
    #[error("{path}: missing required field '{field}'")]
    MissingField { path: NodePath, field: String },

    /// A node did not have the expected shape.
    #[error("{path}: expected {expected}")]
    Expected {
        path: NodePath,
        expected: &'static str,
    },

    /// A node was structurally valid but carried an unusable value.
    #[error("{path}: {message}")]
    Invalid { path: NodePath, message: String },
}

/// Errors raised while generating loot from a context.
///
/// Generation failures are rare by design: an entry or pool with nothing to
/// offer degrades to "no loot". Only a missing required context value or an
/// unsatisfied table shape aborts generation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// An assured context read found no value under the key.
    #[error("no value for required context key '{key}' of type '{type_name}'")]
    MissingContextValue {
        key: &'static str,
        type_name: &'static str,
    },

    /// The context does not carry every key a table's shape requires.
    #[error("context is missing required keys: {}", missing.join(", "))]
    ShapeViolation { missing: Vec<String> },
}
