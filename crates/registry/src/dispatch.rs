//! Validation dispatcher: the one call consumers make at runtime.
//!
//! A call walks `Extracting → Resolving → Delegating` and ends in `Succeeded`
//! or `Failed`; no stage is revisited. The outcome is a pure function of the
//! registry state it loads and the payload, so nothing is retried.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde_json::Value;

use crate::descriptor::TypeDescriptor;
use crate::error::ValidationError;
use crate::registry::Registry;
use crate::resolver::Candidates;
use crate::selection::Selection;
use crate::value::DiscriminatorValue;

/// Progress of a single validate call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
	Extracting,
	Resolving,
	Delegating,
	Succeeded,
	Failed,
}

/// Per-call state. Dropped when the call returns.
struct ValidationContext<B: ?Sized> {
	stage: Stage,
	value: Option<DiscriminatorValue>,
	descriptor: Option<Arc<TypeDescriptor<B>>>,
}

impl<B: ?Sized> ValidationContext<B> {
	fn new() -> Self {
		Self {
			stage: Stage::Extracting,
			value: None,
			descriptor: None,
		}
	}

	fn advance(&mut self, next: Stage) {
		debug_assert!(next > self.stage, "{:?} -> {:?}", self.stage, next);
		self.stage = next;
	}

	fn fail(&mut self, err: ValidationError) -> ValidationError {
		tracing::trace!(
			stage = ?self.stage,
			value = ?self.value,
			variant = self.descriptor.as_ref().map(|d| d.type_name()),
			%err,
			"validation failed"
		);
		self.advance(Stage::Failed);
		err
	}
}

/// A validated payload: the variant instance boxed as its base, plus the
/// descriptor that produced it.
///
/// The boxed value's concrete type is exactly the resolved variant.
pub struct Validated<B: ?Sized> {
	value: Box<B>,
	descriptor: Arc<TypeDescriptor<B>>,
	discriminator: DiscriminatorValue,
}

impl<B: ?Sized> Validated<B> {
	pub fn descriptor(&self) -> &Arc<TypeDescriptor<B>> {
		&self.descriptor
	}

	/// The value read from the payload (may be an alias of the canonical value).
	pub fn discriminator(&self) -> &DiscriminatorValue {
		&self.discriminator
	}

	pub fn is<T: ?Sized + 'static>(&self) -> bool {
		self.descriptor.is::<T>()
	}

	pub fn into_inner(self) -> Box<B> {
		self.value
	}

	pub fn into_parts(self) -> (Box<B>, Arc<TypeDescriptor<B>>) {
		(self.value, self.descriptor)
	}
}

impl<B: ?Sized> Deref for Validated<B> {
	type Target = B;

	fn deref(&self) -> &B {
		&self.value
	}
}

impl<B: ?Sized> DerefMut for Validated<B> {
	fn deref_mut(&mut self) -> &mut B {
		&mut self.value
	}
}

impl<B: ?Sized + fmt::Debug> fmt::Debug for Validated<B> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Validated")
			.field("variant", &self.descriptor.type_name())
			.field("discriminator", &self.discriminator)
			.field("value", &&*self.value)
			.finish()
	}
}

impl Registry {
	/// Validates `payload` against a hierarchy, family or selection of base `B`.
	///
	/// Reads the discriminator, resolves it against the current snapshot and
	/// hands the payload to the resolved variant's schema.
	pub fn validate<B: ?Sized + 'static>(
		&self,
		selection: impl Into<Selection<B>>,
		payload: &Value,
	) -> Result<Validated<B>, ValidationError> {
		let selection = selection.into();
		let state = self.load();
		let mut ctx = ValidationContext::<B>::new();

		let candidates = Candidates::<B>::collect(&state, selection.node()).map_err(|e| ctx.fail(e))?;
		let picks = candidates.extract(payload).map_err(|e| ctx.fail(e))?;
		ctx.advance(Stage::Resolving);

		if candidates.is_empty() {
			return Err(ctx.fail(ValidationError::EmptyHierarchy {
				hierarchy: candidates.label().to_owned(),
			}));
		}
		for table in candidates.tables().filter(|t| !t.by_value.is_empty()) {
			if table.meta.seal_after_first_validation && self.seal_meta(&table.meta) {
				tracing::debug!(hierarchy = %table.meta.name, "sealed after first validation");
			}
		}

		let resolution = candidates.resolve(picks).map_err(|e| ctx.fail(e))?;
		ctx.value = Some(resolution.value.clone());
		ctx.descriptor = Some(resolution.descriptor.clone());
		ctx.advance(Stage::Delegating);

		let descriptor = resolution.descriptor;
		match descriptor.schema.validate(payload) {
			Ok(value) => {
				ctx.advance(Stage::Succeeded);
				tracing::trace!(
					hierarchy = resolution.group.name(),
					variant = descriptor.type_name(),
					value = %resolution.value,
					"resolved payload"
				);
				Ok(Validated {
					value,
					descriptor,
					discriminator: resolution.value,
				})
			}
			Err(source) => Err(ctx.fail(ValidationError::FieldValidation {
				hierarchy: resolution.group.name().to_owned(),
				variant: descriptor.type_name(),
				value: resolution.value,
				source,
			})),
		}
	}
}
