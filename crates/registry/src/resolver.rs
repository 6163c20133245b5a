//! Lazy resolution of a payload to a variant.
//!
//! Nothing is cached between calls: every validation evaluates its selection
//! against the registry state it loaded, so variants registered after earlier
//! validations take part in later ones.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::descriptor::TypeDescriptor;
use crate::error::ValidationError;
use crate::hierarchy::{HierarchyId, HierarchyTable, Target};
use crate::registry::RegistryState;
use crate::selection::Node;
use crate::value::{DiscriminatorValue, json_type_name};

type ValueMap<B> = BTreeMap<DiscriminatorValue, Arc<TypeDescriptor<B>>>;

/// Candidate variants of one hierarchy.
pub(crate) struct Group<B: ?Sized> {
	table: Arc<HierarchyTable<B>>,
	/// `None` means every variant in the table.
	subset: Option<ValueMap<B>>,
}

impl<B: ?Sized> Group<B> {
	fn members(&self) -> &ValueMap<B> {
		self.subset.as_ref().unwrap_or(&self.table.by_value)
	}

	pub fn name(&self) -> &str {
		&self.table.meta.name
	}

	pub fn is_empty(&self) -> bool {
		self.members().is_empty()
	}

	/// Reads this group's discriminator out of the payload.
	///
	/// `Err` carries the JSON type found instead, if the field exists at all.
	fn extract(&self, payload: &Value) -> Result<DiscriminatorValue, Option<&'static str>> {
		let meta = &self.table.meta;
		let raw = payload.get(&*meta.field).ok_or(None)?;
		DiscriminatorValue::from_json(raw, meta.kind).ok_or(Some(json_type_name(raw)))
	}

	fn missing(&self, found: Option<&'static str>) -> ValidationError {
		let meta = &self.table.meta;
		ValidationError::MissingDiscriminatorField {
			hierarchy: meta.name.to_string(),
			field: meta.field.to_string(),
			expected: meta.kind,
			found,
		}
	}

	fn lookup(&self, value: &DiscriminatorValue) -> Result<Arc<TypeDescriptor<B>>, ValidationError> {
		let members = self.members();
		members.get(value).cloned().ok_or_else(|| {
			ValidationError::UnknownDiscriminatorValue {
				hierarchy: self.name().to_owned(),
				field: self.table.meta.field.to_string(),
				value: value.clone(),
				known: members.keys().cloned().collect(),
			}
		})
	}

	fn union(self, other: Self) -> Self {
		let subset = match (self.subset, other.subset) {
			(Some(mut a), Some(b)) => {
				a.extend(b);
				Some(a)
			}
			_ => None,
		};
		Self {
			table: self.table,
			subset,
		}
	}

	fn intersect(self, other: Self) -> Self {
		let subset = match (self.subset, other.subset) {
			(None, None) => None,
			(Some(a), None) | (None, Some(a)) => Some(a),
			(Some(mut a), Some(b)) => {
				a.retain(|value, _| b.contains_key(value));
				Some(a)
			}
		};
		Self {
			table: self.table,
			subset,
		}
	}
}

/// Discriminator read from the payload for one group.
pub(crate) struct Pick<'c, B: ?Sized> {
	group: &'c Group<B>,
	value: DiscriminatorValue,
}

/// The resolved variant and where it came from.
pub(crate) struct Resolution<'c, B: ?Sized> {
	pub group: &'c Group<B>,
	pub descriptor: Arc<TypeDescriptor<B>>,
	pub value: DiscriminatorValue,
}

/// Candidate variants for a selection, grouped by hierarchy in declaration order.
pub(crate) struct Candidates<B: ?Sized> {
	groups: BTreeMap<HierarchyId, Group<B>>,
	label: String,
}

impl<B: ?Sized + 'static> Candidates<B> {
	pub fn collect(state: &RegistryState, node: &Node) -> Result<Self, ValidationError> {
		match node {
			Node::Target(target) => Self::for_target(state, *target),
			Node::Any(nodes) => Self::fold(state, nodes, " | ", Self::union),
			Node::All(nodes) => Self::fold(state, nodes, " & ", Self::intersect),
		}
	}

	fn for_target(state: &RegistryState, target: Target) -> Result<Self, ValidationError> {
		let id = target.hierarchy();
		let table = state
			.table::<B>(id)
			.map_err(|_| ValidationError::UnknownHierarchy { id })?;
		let (subset, label) = match target.family() {
			None => (None, table.meta.name.to_string()),
			Some(family) => {
				let Some(name) = table.family_name(family) else {
					return Err(ValidationError::UnknownHierarchy { id });
				};
				let label = format!("{}/{}", table.meta.name, name);
				let subset: ValueMap<B> = table
					.by_value
					.iter()
					.filter(|(_, d)| table.in_family(d, family))
					.map(|(v, d)| (v.clone(), d.clone()))
					.collect();
				(Some(subset), label)
			}
		};
		let mut groups = BTreeMap::new();
		groups.insert(id, Group { table, subset });
		Ok(Self { groups, label })
	}

	fn fold(
		state: &RegistryState,
		nodes: &[Node],
		separator: &str,
		combine: fn(Self, Self) -> Self,
	) -> Result<Self, ValidationError> {
		let mut acc: Option<Self> = None;
		for node in nodes {
			let next = Self::collect(state, node)?;
			acc = Some(match acc {
				None => next,
				Some(prev) => {
					let label = format!("{}{separator}{}", prev.label, next.label);
					Self {
						label,
						..combine(prev, next)
					}
				}
			});
		}
		Ok(acc.unwrap_or_else(|| Self {
			groups: BTreeMap::new(),
			label: String::from("<empty selection>"),
		}))
	}

	fn union(self, other: Self) -> Self {
		let mut groups = self.groups;
		for (id, group) in other.groups {
			let merged = match groups.remove(&id) {
				Some(existing) => existing.union(group),
				None => group,
			};
			groups.insert(id, merged);
		}
		Self {
			groups,
			label: self.label,
		}
	}

	fn intersect(self, mut other: Self) -> Self {
		let groups = self
			.groups
			.into_iter()
			.filter_map(|(id, group)| {
				let theirs = other.groups.remove(&id)?;
				Some((id, group.intersect(theirs)))
			})
			.collect();
		Self {
			groups,
			label: self.label,
		}
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	pub fn is_empty(&self) -> bool {
		self.groups.values().all(Group::is_empty)
	}

	/// Hierarchies taking part in this resolution.
	pub fn tables(&self) -> impl Iterator<Item = &Arc<HierarchyTable<B>>> {
		self.groups.values().map(|g| &g.table)
	}

	/// Reads the discriminator of every group whose field is present.
	///
	/// Empty groups are skipped unless every group is empty, in which case the
	/// field is still read so a payload without it fails as such. Fails with the
	/// first group's missing-field error when none is readable.
	pub fn extract(&self, payload: &Value) -> Result<Vec<Pick<'_, B>>, ValidationError> {
		let all_empty = self.is_empty();
		let mut picks = Vec::new();
		let mut first_miss = None;
		for group in self.groups.values().filter(|g| all_empty || !g.is_empty()) {
			match group.extract(payload) {
				Ok(value) => picks.push(Pick { group, value }),
				Err(found) => {
					first_miss.get_or_insert_with(|| group.missing(found));
				}
			}
		}
		match first_miss {
			Some(err) if picks.is_empty() => Err(err),
			_ => Ok(picks),
		}
	}

	/// First pick whose value is known wins; otherwise the first pick's unknown-value error.
	pub fn resolve<'c>(&'c self, picks: Vec<Pick<'c, B>>) -> Result<Resolution<'c, B>, ValidationError> {
		let mut first_err = None;
		for Pick { group, value } in picks {
			match group.lookup(&value) {
				Ok(descriptor) => {
					return Ok(Resolution {
						group,
						descriptor,
						value,
					});
				}
				Err(err) => {
					first_err.get_or_insert(err);
				}
			}
		}
		Err(first_err.unwrap_or_else(|| ValidationError::EmptyHierarchy {
			hierarchy: self.label.clone(),
		}))
	}
}
