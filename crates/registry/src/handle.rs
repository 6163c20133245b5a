//! Typed handles over registry ids.

use std::fmt;
use std::marker::PhantomData;

use serde_json::Value;

use crate::descriptor::{VariantSpec, VariantSummary};
use crate::dispatch::Validated;
use crate::error::{RegistrationError, ValidationError};
use crate::hierarchy::{FamilyId, HierarchyId, Snapshot, Target};
use crate::hook::Variant;
use crate::registry::{InsertAction, Registry};
use crate::selection::Selection;
use crate::value::DiscriminatorValue;

/// Handle to a hierarchy whose variants all box into `B`.
pub struct Hierarchy<B: ?Sized> {
	registry: Registry,
	id: HierarchyId,
	_base: PhantomData<fn() -> Box<B>>,
}

impl<B: ?Sized> Clone for Hierarchy<B> {
	fn clone(&self) -> Self {
		Self {
			registry: self.registry.clone(),
			id: self.id,
			_base: PhantomData,
		}
	}
}

impl<B: ?Sized> fmt::Debug for Hierarchy<B> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Hierarchy").field("id", &self.id).finish()
	}
}

impl<B: ?Sized + 'static> Hierarchy<B> {
	pub(crate) fn new(registry: Registry, id: HierarchyId) -> Self {
		Self {
			registry,
			id,
			_base: PhantomData,
		}
	}

	pub fn id(&self) -> HierarchyId {
		self.id
	}

	pub fn registry(&self) -> &Registry {
		&self.registry
	}

	pub fn register<T: Variant<B>>(&self) -> Result<InsertAction, RegistrationError> {
		self.registry.register_variant::<B, T>(self.id)
	}

	/// Registers a hand-built spec. Its schema must produce `spec.variant`'s type.
	pub fn register_spec(&self, spec: VariantSpec<B>) -> Result<InsertAction, RegistrationError> {
		self.registry.register(self.id, spec)
	}

	/// Declares a family directly under this hierarchy.
	pub fn family(&self, name: &str) -> Result<Family<B>, RegistrationError> {
		let id = self.registry.declare_family::<B>(self.id, name)?;
		Ok(Family::new(self.registry.clone(), id))
	}

	/// Looks up an already declared family by name.
	pub fn find_family(&self, name: &str) -> Option<Family<B>> {
		let id = self.registry.family(self.id, name)?;
		Some(Family::new(self.registry.clone(), id))
	}

	pub fn validate(&self, payload: &Value) -> Result<Validated<B>, ValidationError> {
		self.registry.validate::<B>(self.id, payload)
	}

	pub fn snapshot(&self) -> Option<Snapshot<B>> {
		self.registry.snapshot::<B>(self.id)
	}

	pub fn known_values(&self) -> Vec<DiscriminatorValue> {
		self.registry.known_values(self.id).unwrap_or_default()
	}

	pub fn variants(&self) -> Vec<VariantSummary> {
		self.registry.variants(self.id).unwrap_or_default()
	}

	pub fn seal(&self) -> bool {
		self.registry.seal(self.id)
	}

	pub fn selection(&self) -> Selection<B> {
		Selection::target(self.id)
	}
}

/// Handle to a family: a subset of one hierarchy's variants.
pub struct Family<B: ?Sized> {
	registry: Registry,
	id: FamilyId,
	_base: PhantomData<fn() -> Box<B>>,
}

impl<B: ?Sized> Clone for Family<B> {
	fn clone(&self) -> Self {
		Self {
			registry: self.registry.clone(),
			id: self.id,
			_base: PhantomData,
		}
	}
}

impl<B: ?Sized> fmt::Debug for Family<B> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Family").field("id", &self.id).finish()
	}
}

impl<B: ?Sized + 'static> Family<B> {
	pub(crate) fn new(registry: Registry, id: FamilyId) -> Self {
		Self {
			registry,
			id,
			_base: PhantomData,
		}
	}

	pub fn id(&self) -> FamilyId {
		self.id
	}

	pub fn hierarchy(&self) -> Hierarchy<B> {
		Hierarchy::new(self.registry.clone(), self.id.hierarchy())
	}

	pub fn register<T: Variant<B>>(&self) -> Result<InsertAction, RegistrationError> {
		self.registry.register_variant::<B, T>(self.id)
	}

	/// Declares a family nested under this one.
	pub fn family(&self, name: &str) -> Result<Family<B>, RegistrationError> {
		let id = self.registry.declare_family::<B>(self.id, name)?;
		Ok(Family::new(self.registry.clone(), id))
	}

	/// Validates against this family's variants only.
	pub fn validate(&self, payload: &Value) -> Result<Validated<B>, ValidationError> {
		self.registry.validate::<B>(Target::Family(self.id), payload)
	}

	pub fn selection(&self) -> Selection<B> {
		Selection::target(self.id)
	}
}
