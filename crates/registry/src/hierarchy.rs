//! Hierarchy identities, options and the per-hierarchy value table.
//!
//! # Invariants
//!
//! * Within one [`HierarchyTable`], each discriminator value maps to at most one descriptor.
//! * A table is never mutated after it is published; writers clone and republish.
//! * Families never move between hierarchies; a [`FamilyId`] carries its root.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use serde::Serialize;

use crate::config::RegistryConfig;
use crate::descriptor::{TypeDescriptor, VariantSummary};
use crate::error::ValidationError;
use crate::value::{DiscriminatorKind, DiscriminatorValue};

static NEXT_HIERARCHY: AtomicU32 = AtomicU32::new(1);

/// Stable identity of a hierarchy. Unique across every registry in the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct HierarchyId(u32);

impl HierarchyId {
	pub(crate) fn next() -> Self {
		Self(NEXT_HIERARCHY.fetch_add(1, Ordering::Relaxed))
	}
}

impl fmt::Display for HierarchyId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "hierarchy#{}", self.0)
	}
}

/// A named subset of one hierarchy's variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FamilyId {
	hierarchy: HierarchyId,
	index: u32,
}

impl FamilyId {
	pub fn hierarchy(self) -> HierarchyId {
		self.hierarchy
	}
}

impl fmt::Display for FamilyId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.family#{}", self.hierarchy, self.index)
	}
}

/// Where a variant registers, or what a validation resolves against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
	Hierarchy(HierarchyId),
	Family(FamilyId),
}

impl Target {
	/// The hierarchy that owns dispatch for this target.
	pub fn hierarchy(self) -> HierarchyId {
		match self {
			Self::Hierarchy(id) => id,
			Self::Family(family) => family.hierarchy,
		}
	}

	pub fn family(self) -> Option<FamilyId> {
		match self {
			Self::Hierarchy(_) => None,
			Self::Family(family) => Some(family),
		}
	}
}

impl From<HierarchyId> for Target {
	fn from(id: HierarchyId) -> Self {
		Self::Hierarchy(id)
	}
}

impl From<FamilyId> for Target {
	fn from(id: FamilyId) -> Self {
		Self::Family(id)
	}
}

/// Per-hierarchy settings. Unset fields fall back to the registry's [`RegistryConfig`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HierarchyOptions {
	field: Option<String>,
	kind: Option<DiscriminatorKind>,
	seal_after_first_validation: Option<bool>,
}

impl HierarchyOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Name of the payload field carrying the discriminator.
	pub fn field(mut self, field: impl Into<String>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn kind(mut self, kind: DiscriminatorKind) -> Self {
		self.kind = Some(kind);
		self
	}

	/// Refuse new variants once the hierarchy has served a validation.
	pub fn seal_after_first_validation(mut self, seal: bool) -> Self {
		self.seal_after_first_validation = Some(seal);
		self
	}

	pub(crate) fn resolve(self, config: &RegistryConfig) -> ResolvedOptions {
		ResolvedOptions {
			field: self
				.field
				.unwrap_or_else(|| config.default_discriminator_field.clone()),
			kind: self.kind.unwrap_or(config.default_kind),
			seal_after_first_validation: self
				.seal_after_first_validation
				.unwrap_or(config.seal_after_first_validation),
		}
	}
}

pub(crate) struct ResolvedOptions {
	pub field: String,
	pub kind: DiscriminatorKind,
	pub seal_after_first_validation: bool,
}

/// Immutable facts about a hierarchy, plus its seal flag.
///
/// Shared by every published table of the hierarchy, so sealing is visible to
/// writers working from any snapshot.
#[derive(Debug)]
pub(crate) struct HierarchyMeta {
	pub id: HierarchyId,
	pub name: Box<str>,
	pub field: Box<str>,
	pub kind: DiscriminatorKind,
	pub base: &'static str,
	pub seal_after_first_validation: bool,
	sealed: AtomicBool,
}

impl HierarchyMeta {
	pub fn new(id: HierarchyId, name: &str, base: &'static str, options: ResolvedOptions) -> Self {
		Self {
			id,
			name: name.into(),
			field: options.field.into_boxed_str(),
			kind: options.kind,
			base,
			seal_after_first_validation: options.seal_after_first_validation,
			sealed: AtomicBool::new(false),
		}
	}

	pub fn is_sealed(&self) -> bool {
		self.sealed.load(Ordering::Acquire)
	}

	/// Returns `true` if this call sealed it.
	pub fn seal(&self) -> bool {
		!self.sealed.swap(true, Ordering::AcqRel)
	}
}

#[derive(Clone, Debug)]
pub(crate) struct FamilyNode {
	pub name: Box<str>,
	pub parent: Option<u32>,
}

/// Published state of one hierarchy.
pub(crate) struct HierarchyTable<B: ?Sized> {
	pub(crate) meta: Arc<HierarchyMeta>,
	pub(crate) by_value: BTreeMap<DiscriminatorValue, Arc<TypeDescriptor<B>>>,
	/// Registration order.
	pub(crate) variants: Vec<Arc<TypeDescriptor<B>>>,
	pub(crate) families: Vec<FamilyNode>,
}

impl<B: ?Sized> Clone for HierarchyTable<B> {
	fn clone(&self) -> Self {
		Self {
			meta: self.meta.clone(),
			by_value: self.by_value.clone(),
			variants: self.variants.clone(),
			families: self.families.clone(),
		}
	}
}

impl<B: ?Sized> HierarchyTable<B> {
	pub(crate) fn new(meta: Arc<HierarchyMeta>) -> Self {
		Self {
			meta,
			by_value: BTreeMap::new(),
			variants: Vec::new(),
			families: Vec::new(),
		}
	}

	pub(crate) fn family_id(&self, index: usize) -> FamilyId {
		FamilyId {
			hierarchy: self.meta.id,
			index: index as u32,
		}
	}

	pub(crate) fn family_index(&self, family: FamilyId) -> Option<u32> {
		(family.hierarchy == self.meta.id && (family.index as usize) < self.families.len())
			.then_some(family.index)
	}

	pub(crate) fn find_family(&self, name: &str) -> Option<FamilyId> {
		self.families
			.iter()
			.position(|f| &*f.name == name)
			.map(|index| self.family_id(index))
	}

	pub(crate) fn family_name(&self, family: FamilyId) -> Option<&str> {
		let index = self.family_index(family)?;
		Some(&*self.families[index as usize].name)
	}

	/// Whether `descriptor` sits in `family` or any family nested under it.
	pub(crate) fn in_family(&self, descriptor: &TypeDescriptor<B>, family: FamilyId) -> bool {
		let mut cursor = descriptor.family.and_then(|f| self.family_index(f));
		while let Some(index) = cursor {
			if index == family.index {
				return true;
			}
			cursor = self.families[index as usize].parent;
		}
		false
	}
}

/// Type-erased view of a [`HierarchyTable`] so one registry can hold many bases.
pub(crate) trait ErasedTable: Send + Sync {
	fn meta(&self) -> &Arc<HierarchyMeta>;
	fn known_values(&self) -> Vec<DiscriminatorValue>;
	fn variant_count(&self) -> usize;
	fn summaries(&self) -> Vec<VariantSummary>;
	fn find_family(&self, name: &str) -> Option<FamilyId>;
	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<B: ?Sized + 'static> ErasedTable for HierarchyTable<B> {
	fn meta(&self) -> &Arc<HierarchyMeta> {
		&self.meta
	}

	fn known_values(&self) -> Vec<DiscriminatorValue> {
		self.by_value.keys().cloned().collect()
	}

	fn variant_count(&self) -> usize {
		self.variants.len()
	}

	fn summaries(&self) -> Vec<VariantSummary> {
		self.variants
			.iter()
			.map(|d| VariantSummary {
				variant: d.type_name(),
				values: d.values().to_vec(),
				family: d
					.family
					.and_then(|f| self.family_name(f))
					.map(str::to_owned),
			})
			.collect()
	}

	fn find_family(&self, name: &str) -> Option<FamilyId> {
		HierarchyTable::find_family(self, name)
	}

	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
		self
	}
}

/// Immutable view of one hierarchy's mapping at a point in time.
///
/// Holding a snapshot keeps its descriptors alive; later registrations are not
/// reflected in it.
pub struct Snapshot<B: ?Sized> {
	pub(crate) table: Arc<HierarchyTable<B>>,
}

impl<B: ?Sized> Clone for Snapshot<B> {
	fn clone(&self) -> Self {
		Self {
			table: self.table.clone(),
		}
	}
}

impl<B: ?Sized> Snapshot<B> {
	pub fn id(&self) -> HierarchyId {
		self.table.meta.id
	}

	pub fn name(&self) -> &str {
		&self.table.meta.name
	}

	pub fn field(&self) -> &str {
		&self.table.meta.field
	}

	pub fn kind(&self) -> DiscriminatorKind {
		self.table.meta.kind
	}

	pub fn len(&self) -> usize {
		self.table.variants.len()
	}

	pub fn is_empty(&self) -> bool {
		self.table.variants.is_empty()
	}

	pub fn get(&self, value: &DiscriminatorValue) -> Option<&Arc<TypeDescriptor<B>>> {
		self.table.by_value.get(value)
	}

	/// Sorted values currently claimed in this hierarchy.
	pub fn known_values(&self) -> Vec<DiscriminatorValue> {
		self.table.by_value.keys().cloned().collect()
	}

	/// Variants in registration order.
	pub fn variants(&self) -> impl Iterator<Item = &Arc<TypeDescriptor<B>>> {
		self.table.variants.iter()
	}

	/// Picks the descriptor for `value`.
	pub fn resolve(
		&self,
		value: &DiscriminatorValue,
	) -> Result<Arc<TypeDescriptor<B>>, ValidationError> {
		if self.is_empty() {
			return Err(ValidationError::EmptyHierarchy {
				hierarchy: self.name().to_owned(),
			});
		}
		self.get(value)
			.cloned()
			.ok_or_else(|| ValidationError::UnknownDiscriminatorValue {
				hierarchy: self.name().to_owned(),
				field: self.field().to_owned(),
				value: value.clone(),
				known: self.known_values(),
			})
	}
}
