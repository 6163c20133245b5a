//! Discriminator scalars and the literal declarations variants make.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar kind a hierarchy expects in its discriminator field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscriminatorKind {
	#[default]
	String,
	Integer,
	Boolean,
}

impl DiscriminatorKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::String => "string",
			Self::Integer => "integer",
			Self::Boolean => "boolean",
		}
	}
}

impl fmt::Display for DiscriminatorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A literal value identifying one variant within its hierarchy.
///
/// Ordering is total so known-value lists come out deterministic. Within one
/// hierarchy all values share a [`DiscriminatorKind`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiscriminatorValue {
	Bool(bool),
	Int(i64),
	Str(Box<str>),
}

impl DiscriminatorValue {
	pub fn kind(&self) -> DiscriminatorKind {
		match self {
			Self::Bool(_) => DiscriminatorKind::Boolean,
			Self::Int(_) => DiscriminatorKind::Integer,
			Self::Str(_) => DiscriminatorKind::String,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(s) => Some(s),
			_ => None,
		}
	}

	/// Reads a discriminator of `kind` out of a JSON scalar.
	///
	/// Returns `None` when the value is not a scalar of that kind. Integral
	/// floats are not accepted for [`DiscriminatorKind::Integer`].
	pub fn from_json(value: &Value, kind: DiscriminatorKind) -> Option<Self> {
		match (kind, value) {
			(DiscriminatorKind::String, Value::String(s)) => Some(Self::Str(s.as_str().into())),
			(DiscriminatorKind::Integer, Value::Number(n)) => n.as_i64().map(Self::Int),
			(DiscriminatorKind::Boolean, Value::Bool(b)) => Some(Self::Bool(*b)),
			_ => None,
		}
	}
}

impl fmt::Display for DiscriminatorValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bool(b) => write!(f, "{b}"),
			Self::Int(i) => write!(f, "{i}"),
			Self::Str(s) => write!(f, "{s:?}"),
		}
	}
}

impl From<&str> for DiscriminatorValue {
	fn from(value: &str) -> Self {
		Self::Str(value.into())
	}
}

impl From<String> for DiscriminatorValue {
	fn from(value: String) -> Self {
		Self::Str(value.into_boxed_str())
	}
}

impl From<i64> for DiscriminatorValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<i32> for DiscriminatorValue {
	fn from(value: i32) -> Self {
		Self::Int(value.into())
	}
}

impl From<u8> for DiscriminatorValue {
	fn from(value: u8) -> Self {
		Self::Int(value.into())
	}
}

impl From<bool> for DiscriminatorValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

/// Short JSON type name used in diagnostics.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

/// Formats a value list as `a, b, c` for error messages.
pub(crate) fn join_values(values: &[DiscriminatorValue]) -> String {
	let mut out = String::new();
	for (i, value) in values.iter().enumerate() {
		if i > 0 {
			out.push_str(", ");
		}
		out.push_str(&value.to_string());
	}
	out
}

/// What a variant declares for its hierarchy's discriminator field.
///
/// Only [`Discriminator::Literal`] can be registered; an open declaration
/// cannot select a variant and is rejected at registration time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Discriminator {
	Literal(Vec<DiscriminatorValue>),
	Open { type_name: &'static str },
}

impl Discriminator {
	pub fn literal(value: impl Into<DiscriminatorValue>) -> Self {
		Self::Literal(vec![value.into()])
	}

	/// A finite set of literals: the first is the canonical value, the rest are aliases.
	pub fn one_of<I, V>(values: I) -> Self
	where
		I: IntoIterator<Item = V>,
		V: Into<DiscriminatorValue>,
	{
		Self::Literal(values.into_iter().map(Into::into).collect())
	}

	/// Declares the field with an open type `T` (e.g. any string).
	pub fn open<T: ?Sized>() -> Self {
		Self::Open {
			type_name: std::any::type_name::<T>(),
		}
	}
}
