//! Seam to the field-level schema engine.
//!
//! The registry never inspects a variant's fields. It hands the raw payload to
//! the variant's [`FieldSchema`] and gets back either the typed instance, already
//! boxed as the hierarchy's base `B`, or the engine's own diagnostics.

use std::error::Error as StdError;
use std::marker::PhantomData;

use serde_json::Value;

use crate::hook::Variant;

/// Validates a raw payload against one variant's declared fields.
pub trait FieldSchema<B: ?Sized>: Send + Sync {
	fn validate(&self, payload: &Value) -> Result<Box<B>, SchemaError>;
}

/// Diagnostics produced by a schema engine, carried unchanged.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct SchemaError(Box<dyn StdError + Send + Sync>);

impl SchemaError {
	pub fn new(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
		Self(error.into())
	}

	/// The underlying engine error, for callers that know its concrete type.
	pub fn engine_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
		&*self.0
	}
}

impl From<serde_json::Error> for SchemaError {
	fn from(error: serde_json::Error) -> Self {
		Self::new(error)
	}
}

/// Schema engine backed by serde: the variant's `Deserialize` impl is its field schema.
///
/// Defaults, optional fields and coercions are whatever the derive declares.
pub struct SerdeSchema<T>(PhantomData<fn() -> T>);

impl<T> SerdeSchema<T> {
	pub fn new() -> Self {
		Self(PhantomData)
	}
}

impl<T> Default for SerdeSchema<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<B, T> FieldSchema<B> for SerdeSchema<T>
where
	B: ?Sized,
	T: Variant<B>,
{
	fn validate(&self, payload: &Value) -> Result<Box<B>, SchemaError> {
		let variant = T::deserialize(payload)?;
		Ok(variant.into_base())
	}
}

/// Adapts a closure into a [`FieldSchema`], for engines other than serde.
pub struct FnSchema<F>(pub F);

impl<B, F> FieldSchema<B> for FnSchema<F>
where
	B: ?Sized,
	F: Fn(&Value) -> Result<Box<B>, SchemaError> + Send + Sync,
{
	fn validate(&self, payload: &Value) -> Result<Box<B>, SchemaError> {
		(self.0)(payload)
	}
}
