use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error(
        "invalid enum constant name `{name}`: names match [A-Za-z][A-Za-z0-9_]* and must not start with `_` or a digit"
    )]
    InvalidIdentifier { name: String },

    #[error(
        "unsupported value {value} for enum constant `{name}`: only booleans, integers and integer-valued reals are accepted"
    )]
    UnsupportedValueType { name: String, value: String },

    #[error("duplicate enum constant name `{name}`")]
    DuplicateName { name: String },
}

/// Source value for an enum constant before canonicalization.
///
/// Booleans coerce to 0/1 and reals with an exact integer representation
/// coerce to that integer; anything else is rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue {
    Bool(bool),
    Int(i64),
    Real(f64),
}

impl RawValue {
    fn canonical(self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(i64::from(b)),
            Self::Int(i) => Some(i),
            Self::Real(r) => {
                let exact = r.is_finite()
                    && r.fract() == 0.0
                    && r >= i64::MIN as f64
                    && r <= i64::MAX as f64;
                exact.then_some(r as i64)
            }
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
        }
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

/// An ordered set of named integer constants an op dispatches over.
///
/// Declared order drives code generation (one `case` per name, in order);
/// identity is the canonical name-to-integer mapping alone. Two descriptors
/// built from differently-typed but numerically-equal values are equal and
/// hash identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDescriptor {
    entries: Vec<(String, i64)>,
    canonical: BTreeMap<String, i64>,
}

impl EnumDescriptor {
    pub fn new<N, V, I>(entries: I) -> Result<Self, ParamError>
    where
        N: Into<String>,
        V: Into<RawValue>,
        I: IntoIterator<Item = (N, V)>,
    {
        let mut declared = Vec::new();
        let mut canonical = BTreeMap::new();
        for (name, value) in entries {
            let name = name.into();
            validate_identifier(&name)?;
            let raw = value.into();
            let coerced = raw
                .canonical()
                .ok_or_else(|| ParamError::UnsupportedValueType {
                    name: name.clone(),
                    value: raw.to_string(),
                })?;
            if canonical.insert(name.clone(), coerced).is_some() {
                return Err(ParamError::DuplicateName { name });
            }
            declared.push((name, coerced));
        }
        Ok(Self {
            entries: declared,
            canonical,
        })
    }

    /// Build a descriptor assigning `0..n` to the given names in order.
    pub fn sequence<N, I>(names: I) -> Result<Self, ParamError>
    where
        N: Into<String>,
        I: IntoIterator<Item = N>,
    {
        Self::new(
            names
                .into_iter()
                .enumerate()
                .map(|(index, name)| (name, index as i64)),
        )
    }

    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.canonical.get(name).copied()
    }

    /// First declared name carrying the given value.
    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| name.as_str())
    }

    pub fn contains_value(&self, value: i64) -> bool {
        self.entries.iter().any(|(_, v)| *v == value)
    }

    /// Entries in declared order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// The canonical mapping: sorted by name, identity of the descriptor.
    pub fn canonical(&self) -> &BTreeMap<String, i64> {
        &self.canonical
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for EnumDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for EnumDescriptor {}

impl Hash for EnumDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

fn validate_identifier(name: &str) -> Result<(), ParamError> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|first| {
        first.is_ascii_alphabetic() && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    });
    if valid {
        Ok(())
    } else {
        Err(ParamError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}
