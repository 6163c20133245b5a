//! Registration and validation error taxonomy.
//!
//! Every error is a deterministic function of registry state and input, so
//! nothing here is retried. Each variant carries enough context to act on
//! without re-reading the registry.

use thiserror::Error;

use crate::dispatch::Stage;
use crate::hierarchy::{FamilyId, HierarchyId};
use crate::schema::SchemaError;
use crate::value::{DiscriminatorKind, DiscriminatorValue, join_values};

/// Rejections raised to the code performing a declaration or registration.
#[derive(Debug, Error)]
pub enum RegistrationError {
	/// Another variant already owns one of the values in this hierarchy.
	#[error(
		"discriminator {value} in `{hierarchy}` is already claimed by `{existing}`; cannot register `{new}`"
	)]
	DuplicateDiscriminator {
		hierarchy: String,
		value: DiscriminatorValue,
		existing: &'static str,
		new: &'static str,
	},

	/// The variant's discriminator is not a usable literal.
	#[error("`{variant}` does not declare a literal discriminator for `{field}`: {reason}")]
	NonLiteralDiscriminator {
		variant: &'static str,
		field: String,
		reason: String,
	},

	/// The variant type is already registered here under a different declaration.
	#[error("`{variant}` is already registered in `{hierarchy}` with a different declaration")]
	VariantRedeclared {
		hierarchy: String,
		variant: &'static str,
	},

	#[error("`{hierarchy}` is sealed; cannot register `{variant}`")]
	Sealed {
		hierarchy: String,
		variant: &'static str,
	},

	#[error("hierarchy `{name}` is already declared")]
	DuplicateHierarchy { name: String },

	#[error("family `{family}` already exists in `{hierarchy}`")]
	DuplicateFamily { hierarchy: String, family: String },

	#[error("unknown {0}")]
	UnknownHierarchy(HierarchyId),

	#[error("unknown {0}")]
	UnknownFamily(FamilyId),

	/// The hierarchy was declared over a different base type.
	#[error("`{hierarchy}` dispatches to `{found}`, not `{expected}`")]
	BaseMismatch {
		hierarchy: String,
		expected: &'static str,
		found: &'static str,
	},
}

/// Failures of a single validate call. Exactly one is returned per failed call.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// Nothing is registered under the target; a setup or ordering bug.
	#[error("`{hierarchy}` has no registered variants")]
	EmptyHierarchy { hierarchy: String },

	/// The payload lacks the discriminator field, or it is not a scalar of the expected kind.
	#[error(
		"payload for `{hierarchy}` has no {expected} discriminator `{field}` (found {})",
		.found.unwrap_or("nothing")
	)]
	MissingDiscriminatorField {
		hierarchy: String,
		field: String,
		expected: DiscriminatorKind,
		found: Option<&'static str>,
	},

	#[error(
		"unknown discriminator {value} for `{field}` in `{hierarchy}`; known values: [{}]",
		join_values(.known)
	)]
	UnknownDiscriminatorValue {
		hierarchy: String,
		field: String,
		value: DiscriminatorValue,
		/// Sorted.
		known: Vec<DiscriminatorValue>,
	},

	/// The resolved variant's schema rejected the payload.
	#[error("payload rejected by `{variant}` (selected by {value} in `{hierarchy}`): {source}")]
	FieldValidation {
		hierarchy: String,
		variant: &'static str,
		value: DiscriminatorValue,
		#[source]
		source: SchemaError,
	},

	/// The hierarchy was unregistered while a handle to it was still in use.
	#[error("unknown {id}")]
	UnknownHierarchy { id: HierarchyId },
}

impl ValidationError {
	/// The dispatch stage that produced this error.
	pub fn stage(&self) -> Stage {
		match self {
			Self::MissingDiscriminatorField { .. } => Stage::Extracting,
			Self::EmptyHierarchy { .. }
			| Self::UnknownDiscriminatorValue { .. }
			| Self::UnknownHierarchy { .. } => Stage::Resolving,
			Self::FieldValidation { .. } => Stage::Delegating,
		}
	}

	/// The variant whose schema was attempted, if resolution got that far.
	pub fn attempted_variant(&self) -> Option<&'static str> {
		match self {
			Self::FieldValidation { variant, .. } => Some(*variant),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn unknown_value_message_lists_known_values() {
		let err = ValidationError::UnknownDiscriminatorValue {
			hierarchy: "modes".into(),
			field: "mode".into(),
			value: "bytes".into(),
			known: vec!["number".into(), "text".into()],
		};
		assert_eq!(
			err.to_string(),
			r#"unknown discriminator "bytes" for `mode` in `modes`; known values: ["number", "text"]"#
		);
		assert_eq!(err.stage(), Stage::Resolving);
	}

	#[test]
	fn missing_field_message_names_found_kind() {
		let err = ValidationError::MissingDiscriminatorField {
			hierarchy: "modes".into(),
			field: "mode".into(),
			expected: DiscriminatorKind::String,
			found: Some("integer"),
		};
		assert_eq!(
			err.to_string(),
			"payload for `modes` has no string discriminator `mode` (found integer)"
		);
		assert_eq!(err.stage(), Stage::Extracting);
	}
}
