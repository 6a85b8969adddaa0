//! Property definitions, values, and value records.

use std::fmt;

use nucleus_core::{ContractError, ErrorCode, Time};

/// The value category of a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// Boolean values, stored bit-packed.
    Bool,
    /// Signed integer values (`i64`).
    Int,
    /// Single-precision floating point values.
    Float,
    /// Double-precision floating point values.
    Double,
    /// Compile-time-typed object values (see [`ObjectStore`](crate::ObjectStore)).
    Object,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::Object => write!(f, "object"),
        }
    }
}

/// A dynamically-typed property value of one of the primitive kinds.
///
/// Object-kind properties have no dynamic value representation; they are
/// typed at compile time through [`ObjectStore`](crate::ObjectStore).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PropertyValue {
    /// A boolean value.
    Bool(bool),
    /// An integer value.
    Int(i64),
    /// A single-precision value.
    Float(f32),
    /// A double-precision value.
    Double(f64),
}

impl PropertyValue {
    /// The kind of this value.
    pub fn kind(self) -> PropertyKind {
        match self {
            Self::Bool(_) => PropertyKind::Bool,
            Self::Int(_) => PropertyKind::Int,
            Self::Float(_) => PropertyKind::Float,
            Self::Double(_) => PropertyKind::Double,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

/// Declares the kind, default, and mutability of a property.
///
/// If no default is given, every existing id must receive an explicit
/// value at definition time; containers built from such a definition use
/// the kind's zero value as the backing fill but the
/// [`PropertyManager`](crate::PropertyManager) guarantees it is never
/// observable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropertyDefinition {
    kind: PropertyKind,
    default: Option<PropertyValue>,
    mutable: bool,
}

impl PropertyDefinition {
    /// Define a property of `kind` with an optional default.
    ///
    /// # Errors
    ///
    /// `INCOMPATIBLE_VALUE` if the default's kind does not match `kind`,
    /// or if a default is supplied for an object-kind definition.
    pub fn new(
        kind: PropertyKind,
        default: Option<PropertyValue>,
        mutable: bool,
    ) -> Result<Self, ContractError> {
        if let Some(value) = default {
            if value.kind() != kind {
                return Err(ContractError::with_detail(
                    ErrorCode::IncompatibleValue,
                    format!("default is {} but the definition is {kind}", value.kind()),
                ));
            }
        }
        Ok(Self {
            kind,
            default,
            mutable,
        })
    }

    /// A mutable boolean definition with a default.
    pub fn bool_with_default(default: bool) -> Self {
        Self {
            kind: PropertyKind::Bool,
            default: Some(PropertyValue::Bool(default)),
            mutable: true,
        }
    }

    /// A mutable integer definition with a default.
    pub fn int_with_default(default: i64) -> Self {
        Self {
            kind: PropertyKind::Int,
            default: Some(PropertyValue::Int(default)),
            mutable: true,
        }
    }

    /// A mutable single-precision definition with a default.
    pub fn float_with_default(default: f32) -> Self {
        Self {
            kind: PropertyKind::Float,
            default: Some(PropertyValue::Float(default)),
            mutable: true,
        }
    }

    /// A mutable double-precision definition with a default.
    pub fn double_with_default(default: f64) -> Self {
        Self {
            kind: PropertyKind::Double,
            default: Some(PropertyValue::Double(default)),
            mutable: true,
        }
    }

    /// An object-kind definition. Defaults for object properties are
    /// supplied to [`ObjectStore`](crate::ObjectStore) directly.
    pub fn object(mutable: bool) -> Self {
        Self {
            kind: PropertyKind::Object,
            default: None,
            mutable,
        }
    }

    /// Return this definition with mutability disabled.
    pub fn immutable(mut self) -> Self {
        self.mutable = false;
        self
    }

    /// The value kind.
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// The declared default, if any.
    pub fn default(&self) -> Option<PropertyValue> {
        self.default
    }

    /// Whether values may be reassigned after their initial assignment.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }
}

/// A property value together with the simulation time it was assigned.
///
/// The time reflects the clock at write time, never wall-clock time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropertyValueRecord {
    /// The current value.
    pub value: PropertyValue,
    /// Simulation time of the last assignment.
    pub time: Time,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_kind_must_match() {
        let err = PropertyDefinition::new(
            PropertyKind::Bool,
            Some(PropertyValue::Int(3)),
            true,
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::IncompatibleValue);
    }

    #[test]
    fn matching_default_is_accepted() {
        let def =
            PropertyDefinition::new(PropertyKind::Int, Some(PropertyValue::Int(3)), true).unwrap();
        assert_eq!(def.default(), Some(PropertyValue::Int(3)));
        assert!(def.is_mutable());
    }

    #[test]
    fn immutable_builder() {
        let def = PropertyDefinition::bool_with_default(false).immutable();
        assert!(!def.is_mutable());
    }

    #[test]
    fn value_kinds() {
        assert_eq!(PropertyValue::Bool(true).kind(), PropertyKind::Bool);
        assert_eq!(PropertyValue::Double(1.0).kind(), PropertyKind::Double);
    }
}
