//! Shared hierarchy registry with atomic snapshot publication.
//!
//! # Mental model
//!
//! * Readers pin an `Arc<RegistryState>` and resolve against that immutable view.
//! * Writers clone the state, edit the one hierarchy table they touch, and
//!   publish the replacement with CAS.
//! * A failed CAS means another writer won first; the edit is replayed against
//!   the latest state, so its uniqueness checks see the winner's entries.
//!
//! # Invariants
//!
//! * Concurrent registrations are linearizable: two writers can never both pass
//!   the duplicate check for the same value (see `tests::concurrency`).
//! * In-flight validations keep the state they loaded; a publication never
//!   mutates a state another reader holds.
//! * Registration is insert-only. Hierarchies can be dropped as a whole for
//!   test isolation; individual variants cannot.

use std::any::type_name;
use std::convert::Infallible;
use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::config::RegistryConfig;
use crate::descriptor::{TypeDescriptor, VariantSpec, VariantSummary};
use crate::error::RegistrationError;
use crate::handle::Hierarchy;
use crate::hierarchy::{
	ErasedTable, FamilyId, FamilyNode, HierarchyId, HierarchyMeta, HierarchyOptions,
	HierarchyTable, Snapshot, Target,
};
use crate::hook::literal_values;
use crate::value::{DiscriminatorKind, DiscriminatorValue};

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Result of a successful registration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InsertAction {
	/// Variant was new; its values now resolve to it.
	InsertedNew,
	/// The identical declaration was already present; nothing changed.
	KeptExisting,
}

/// Published state: every hierarchy's current table.
#[derive(Clone, Default)]
pub(crate) struct RegistryState {
	pub hierarchies: FxHashMap<HierarchyId, Arc<dyn ErasedTable>>,
	pub by_name: FxHashMap<Box<str>, HierarchyId>,
}

impl RegistryState {
	/// Typed table for `id`, checked against the base the hierarchy was declared with.
	pub fn table<B: ?Sized + 'static>(
		&self,
		id: HierarchyId,
	) -> Result<Arc<HierarchyTable<B>>, RegistrationError> {
		let erased = self
			.hierarchies
			.get(&id)
			.ok_or(RegistrationError::UnknownHierarchy(id))?;
		let meta = erased.meta().clone();
		Arc::clone(erased)
			.into_any()
			.downcast::<HierarchyTable<B>>()
			.map_err(|_| RegistrationError::BaseMismatch {
				hierarchy: meta.name.to_string(),
				expected: type_name::<B>(),
				found: meta.base,
			})
	}
}

enum Commit<R> {
	Keep(R),
	Publish(R),
}

/// Summary of a declared hierarchy, for tooling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HierarchySummary {
	pub id: HierarchyId,
	pub name: String,
	pub field: String,
	pub kind: DiscriminatorKind,
	pub base: &'static str,
	pub sealed: bool,
	pub variants: usize,
}

struct Inner {
	state: ArcSwap<RegistryState>,
	config: RegistryConfig,
}

/// The single source of truth mapping discriminator values to variants, per hierarchy.
///
/// Cloning is cheap and yields a handle to the same registry.
#[derive(Clone)]
pub struct Registry {
	inner: Arc<Inner>,
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}

impl Registry {
	pub fn new() -> Self {
		Self::with_config(RegistryConfig::default())
	}

	pub fn with_config(config: RegistryConfig) -> Self {
		Self {
			inner: Arc::new(Inner {
				state: ArcSwap::from_pointee(RegistryState::default()),
				config,
			}),
		}
	}

	/// Process-wide registry, created on first use with default config.
	pub fn global() -> &'static Registry {
		&GLOBAL
	}

	pub fn config(&self) -> &RegistryConfig {
		&self.inner.config
	}

	#[inline]
	pub(crate) fn load(&self) -> Arc<RegistryState> {
		self.inner.state.load_full()
	}

	fn update<R, E>(
		&self,
		mut edit: impl FnMut(&mut RegistryState) -> Result<Commit<R>, E>,
	) -> Result<R, E> {
		loop {
			let cur = self.inner.state.load_full();
			let mut next = (*cur).clone();
			match edit(&mut next)? {
				Commit::Keep(r) => return Ok(r),
				Commit::Publish(r) => {
					let prev = self.inner.state.compare_and_swap(&cur, Arc::new(next));
					if Arc::ptr_eq(&prev, &cur) {
						return Ok(r);
					}
				}
			}
		}
	}

	/// Declares a hierarchy rooted at base `B`.
	///
	/// Variants declared at link time for `name` are installed before this
	/// returns. If one of them is rejected the hierarchy stays declared, with the
	/// variants installed so far, and the rejection is returned.
	pub fn declare<B: ?Sized + 'static>(
		&self,
		name: &str,
		options: HierarchyOptions,
	) -> Result<Hierarchy<B>, RegistrationError> {
		let id = HierarchyId::next();
		let meta = Arc::new(HierarchyMeta::new(
			id,
			name,
			type_name::<B>(),
			options.resolve(&self.inner.config),
		));
		self.update(|state| {
			if state.by_name.contains_key(name) {
				return Err(RegistrationError::DuplicateHierarchy {
					name: name.to_owned(),
				});
			}
			state.by_name.insert(name.into(), id);
			state
				.hierarchies
				.insert(id, Arc::new(HierarchyTable::<B>::new(meta.clone())));
			Ok(Commit::Publish(()))
		})?;
		tracing::debug!(hierarchy = name, %id, field = %meta.field, base = meta.base, "declared hierarchy");

		self.install_declared(name, None, Target::Hierarchy(id))?;
		Ok(Hierarchy::new(self.clone(), id))
	}

	/// Declares a named family under a hierarchy or another family.
	///
	/// Family names are unique within their hierarchy. Link-time declarations
	/// naming this family are installed before this returns.
	pub fn declare_family<B: ?Sized + 'static>(
		&self,
		parent: impl Into<Target>,
		name: &str,
	) -> Result<FamilyId, RegistrationError> {
		let parent = parent.into();
		let id = parent.hierarchy();
		let (family, hierarchy_name) = self.update(|state| {
			let table = state.table::<B>(id)?;
			let parent_index = parent
				.family()
				.map(|f| table.family_index(f).ok_or(RegistrationError::UnknownFamily(f)))
				.transpose()?;
			if table.find_family(name).is_some() {
				return Err(RegistrationError::DuplicateFamily {
					hierarchy: table.meta.name.to_string(),
					family: name.to_owned(),
				});
			}
			let mut next = (*table).clone();
			next.families.push(FamilyNode {
				name: name.into(),
				parent: parent_index,
			});
			let family = next.family_id(next.families.len() - 1);
			let hierarchy_name = next.meta.name.to_string();
			state.hierarchies.insert(id, Arc::new(next));
			Ok(Commit::Publish((family, hierarchy_name)))
		})?;
		tracing::debug!(hierarchy = %hierarchy_name, family = name, %family, "declared family");

		self.install_declared(&hierarchy_name, Some(name), Target::Family(family))?;
		Ok(family)
	}

	/// Inserts a variant under each of its discriminator values.
	///
	/// Fails if any value already maps to a different variant in the target's
	/// hierarchy. Registering the identical declaration again succeeds with
	/// [`InsertAction::KeptExisting`]. Snapshots taken after this returns see the
	/// new variant.
	///
	/// `spec.schema` must produce values of the type named by `spec.variant`;
	/// [`TypeDescriptor::is`] and [`Validated::is`](crate::Validated::is) answer
	/// from that declaration, not from the boxed value.
	pub fn register<B: ?Sized + 'static>(
		&self,
		target: impl Into<Target>,
		spec: VariantSpec<B>,
	) -> Result<InsertAction, RegistrationError> {
		let target = target.into();
		let id = target.hierarchy();
		let result = self.update(|state| {
			let table = state.table::<B>(id)?;
			let meta = &table.meta;
			let family = target
				.family()
				.map(|f| {
					table
						.family_index(f)
						.map(|_| f)
						.ok_or(RegistrationError::UnknownFamily(f))
				})
				.transpose()?;
			let values = literal_values(&spec, meta)?;

			if let Some(existing) = table.variants.iter().find(|d| d.variant == spec.variant) {
				if existing.declares_same(&spec.variant, &values, family) {
					return Ok(Commit::Keep(InsertAction::KeptExisting));
				}
				return Err(RegistrationError::VariantRedeclared {
					hierarchy: meta.name.to_string(),
					variant: spec.variant.type_name,
				});
			}
			if meta.is_sealed() {
				return Err(RegistrationError::Sealed {
					hierarchy: meta.name.to_string(),
					variant: spec.variant.type_name,
				});
			}
			for value in &values {
				if let Some(owner) = table.by_value.get(value) {
					return Err(RegistrationError::DuplicateDiscriminator {
						hierarchy: meta.name.to_string(),
						value: value.clone(),
						existing: owner.type_name(),
						new: spec.variant.type_name,
					});
				}
			}

			let descriptor = Arc::new(TypeDescriptor {
				values: values.into_boxed_slice(),
				hierarchy: id,
				family,
				variant: spec.variant,
				schema: spec.schema.clone(),
			});
			let mut next = (*table).clone();
			for value in descriptor.values() {
				next.by_value.insert(value.clone(), descriptor.clone());
			}
			next.variants.push(descriptor);
			state.hierarchies.insert(id, Arc::new(next));
			Ok(Commit::Publish(InsertAction::InsertedNew))
		});

		match &result {
			Ok(action) => tracing::debug!(
				%id,
				variant = spec.variant.type_name,
				?action,
				"registered variant"
			),
			Err(err) => tracing::warn!(%id, variant = spec.variant.type_name, %err, "rejected variant"),
		}
		result
	}

	/// Typed handle to a hierarchy declared under `name` with base `B`.
	pub fn hierarchy<B: ?Sized + 'static>(&self, name: &str) -> Option<Hierarchy<B>> {
		let state = self.load();
		let id = *state.by_name.get(name)?;
		state.table::<B>(id).ok()?;
		Some(Hierarchy::new(self.clone(), id))
	}

	/// Immutable view of the hierarchy's current mapping.
	pub fn snapshot<B: ?Sized + 'static>(&self, id: HierarchyId) -> Option<Snapshot<B>> {
		let table = self.load().table::<B>(id).ok()?;
		Some(Snapshot { table })
	}

	/// Sorted discriminator values currently registered in `id`.
	pub fn known_values(&self, id: HierarchyId) -> Option<Vec<DiscriminatorValue>> {
		Some(self.load().hierarchies.get(&id)?.known_values())
	}

	/// Registered variants in registration order.
	pub fn variants(&self, id: HierarchyId) -> Option<Vec<VariantSummary>> {
		Some(self.load().hierarchies.get(&id)?.summaries())
	}

	pub fn family(&self, id: HierarchyId, name: &str) -> Option<FamilyId> {
		self.load().hierarchies.get(&id)?.find_family(name)
	}

	/// All declared hierarchies, ordered by declaration.
	pub fn hierarchies(&self) -> Vec<HierarchySummary> {
		let state = self.load();
		let mut out: Vec<_> = state
			.hierarchies
			.values()
			.map(|table| {
				let meta = table.meta();
				HierarchySummary {
					id: meta.id,
					name: meta.name.to_string(),
					field: meta.field.to_string(),
					kind: meta.kind,
					base: meta.base,
					sealed: meta.is_sealed(),
					variants: table.variant_count(),
				}
			})
			.collect();
		out.sort_by_key(|h| h.id);
		out
	}

	/// Refuses further registrations into `id`. Returns `true` if this call sealed it.
	pub fn seal(&self, id: HierarchyId) -> bool {
		let Some(table) = self.load().hierarchies.get(&id).cloned() else {
			return false;
		};
		let sealed = self.seal_meta(table.meta());
		if sealed {
			tracing::debug!(%id, hierarchy = %table.meta().name, "sealed hierarchy");
		}
		sealed
	}

	/// Sets the seal flag, then republishes the state.
	///
	/// A writer that read the flag before it was set still holds the old state
	/// pointer, so its CAS fails and its retry sees the flag.
	pub(crate) fn seal_meta(&self, meta: &HierarchyMeta) -> bool {
		if !meta.seal() {
			return false;
		}
		let Ok(()) = self.update(|_| -> Result<Commit<()>, Infallible> { Ok(Commit::Publish(())) });
		true
	}

	pub fn is_sealed(&self, id: HierarchyId) -> Option<bool> {
		Some(self.load().hierarchies.get(&id)?.meta().is_sealed())
	}

	/// Drops a hierarchy and all its variants. Meant for test isolation.
	pub fn unregister_hierarchy(&self, id: HierarchyId) -> bool {
		let Ok(removed) = self.update(|state| -> Result<Commit<bool>, Infallible> {
			let Some(table) = state.hierarchies.remove(&id) else {
				return Ok(Commit::Keep(false));
			};
			state.by_name.remove(&table.meta().name);
			Ok(Commit::Publish(true))
		});
		if removed {
			tracing::debug!(%id, "unregistered hierarchy");
		}
		removed
	}

	/// Drops every hierarchy.
	pub fn clear(&self) {
		self.inner.state.store(Arc::new(RegistryState::default()));
	}
}
