//! Type descriptors: the immutable record the registry keeps per variant.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::hierarchy::{FamilyId, HierarchyId};
use crate::schema::FieldSchema;
use crate::value::{Discriminator, DiscriminatorValue};

/// Identity of a variant's Rust type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VariantMeta {
	pub type_id: TypeId,
	pub type_name: &'static str,
}

impl VariantMeta {
	pub fn of<T: ?Sized + 'static>() -> Self {
		Self {
			type_id: TypeId::of::<T>(),
			type_name: std::any::type_name::<T>(),
		}
	}
}

/// Registration input: everything a descriptor needs except its placement.
///
/// The registry stamps hierarchy and family onto it when it is accepted.
pub struct VariantSpec<B: ?Sized> {
	pub variant: VariantMeta,
	pub discriminator: Discriminator,
	pub schema: Arc<dyn FieldSchema<B>>,
}

impl<B: ?Sized> VariantSpec<B> {
	pub fn new(
		variant: VariantMeta,
		discriminator: Discriminator,
		schema: Arc<dyn FieldSchema<B>>,
	) -> Self {
		Self {
			variant,
			discriminator,
			schema,
		}
	}
}

/// Immutable record binding a variant's discriminator values to its field schema.
///
/// Created once when the registry accepts a [`VariantSpec`]; shared by `Arc`
/// from every value it claims.
pub struct TypeDescriptor<B: ?Sized> {
	pub(crate) values: Box<[DiscriminatorValue]>,
	pub(crate) hierarchy: HierarchyId,
	pub(crate) family: Option<FamilyId>,
	pub(crate) variant: VariantMeta,
	pub(crate) schema: Arc<dyn FieldSchema<B>>,
}

impl<B: ?Sized> TypeDescriptor<B> {
	/// Canonical value first, then aliases, in declaration order.
	pub fn values(&self) -> &[DiscriminatorValue] {
		&self.values
	}

	pub fn canonical_value(&self) -> &DiscriminatorValue {
		&self.values[0]
	}

	pub fn hierarchy(&self) -> HierarchyId {
		self.hierarchy
	}

	pub fn family(&self) -> Option<FamilyId> {
		self.family
	}

	pub fn variant(&self) -> VariantMeta {
		self.variant
	}

	pub fn type_name(&self) -> &'static str {
		self.variant.type_name
	}

	/// Whether the declared variant type is `T`.
	pub fn is<T: ?Sized + 'static>(&self) -> bool {
		self.variant.type_id == TypeId::of::<T>()
	}

	pub fn schema(&self) -> &Arc<dyn FieldSchema<B>> {
		&self.schema
	}

	/// Same variant, same values, same placement: re-registering it is a no-op.
	pub(crate) fn declares_same(
		&self,
		variant: &VariantMeta,
		values: &[DiscriminatorValue],
		family: Option<FamilyId>,
	) -> bool {
		self.variant == *variant && *self.values == *values && self.family == family
	}
}

impl<B: ?Sized> fmt::Debug for TypeDescriptor<B> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TypeDescriptor")
			.field("variant", &self.variant.type_name)
			.field("values", &self.values)
			.field("hierarchy", &self.hierarchy)
			.field("family", &self.family)
			.finish_non_exhaustive()
	}
}

/// Serializable description of a registered variant, for tooling and docs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VariantSummary {
	pub variant: &'static str,
	pub values: Vec<DiscriminatorValue>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub family: Option<String>,
}
