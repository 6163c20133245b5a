use pretty_assertions::assert_eq;
use serde_json::json;

use super::fixtures::*;
use super::init_tracing;
use crate::{
	DiscriminatorKind, DiscriminatorValue, Family, Hierarchy, HierarchyOptions, RegistrationError,
	Registry, ValidationError,
};

struct Tree {
	registry: Registry,
	modes: Hierarchy<dyn Mode>,
	numeric: Family<dyn Mode>,
	counting: Family<dyn Mode>,
}

/// `modes` holds `text`; `modes/numeric` holds `number`; `modes/numeric/counting` holds `count`.
fn tree() -> Tree {
	init_tracing();
	let registry = Registry::new();
	let modes = registry.declare::<dyn Mode>("modes", mode_options()).unwrap();
	let numeric = modes.family("numeric").unwrap();
	let counting = numeric.family("counting").unwrap();
	modes.register::<TextMode>().unwrap();
	numeric.register::<NumberMode>().unwrap();
	counting.register::<CountMode>().unwrap();
	Tree {
		registry,
		modes,
		numeric,
		counting,
	}
}

fn known(err: ValidationError) -> Vec<DiscriminatorValue> {
	match err {
		ValidationError::UnknownDiscriminatorValue { known, .. } => known,
		other => panic!("expected unknown value, got {other:?}"),
	}
}

fn values(raw: &[&str]) -> Vec<DiscriminatorValue> {
	raw.iter().copied().map(DiscriminatorValue::from).collect()
}

#[test]
fn root_resolves_every_family_member() {
	let Tree { modes, .. } = tree();

	assert!(modes.validate(&json!({"mode": "text", "text": "a"})).unwrap().is::<TextMode>());
	assert!(modes.validate(&json!({"mode": "number", "number": 1.0})).unwrap().is::<NumberMode>());
	assert!(modes.validate(&json!({"mode": "tally", "count": 1})).unwrap().is::<CountMode>());
	assert_eq!(modes.known_values(), values(&["count", "number", "tally", "text"]));
}

#[test]
fn family_restricts_to_its_subtree() {
	let Tree { numeric, counting, .. } = tree();

	assert!(numeric.validate(&json!({"mode": "count", "count": 2})).unwrap().is::<CountMode>());
	let err = numeric.validate(&json!({"mode": "text", "text": "a"})).unwrap_err();
	assert_eq!(known(err), values(&["count", "number", "tally"]));

	let err = counting.validate(&json!({"mode": "number", "number": 1.0})).unwrap_err();
	assert_eq!(known(err), values(&["count", "tally"]));
}

#[test]
fn family_values_are_unique_across_the_whole_hierarchy() {
	let Tree { counting, .. } = tree();

	let err = counting.register::<RichTextMode>().unwrap_err();

	assert!(matches!(
		err,
		RegistrationError::DuplicateDiscriminator { ref hierarchy, .. } if hierarchy == "modes"
	));
}

#[test]
fn empty_family_reports_its_path() {
	let Tree { modes, .. } = tree();
	let binary = modes.family("binary").unwrap();

	let err = binary.validate(&json!({"mode": "bytes", "content": ""})).unwrap_err();

	assert!(
		matches!(&err, ValidationError::EmptyHierarchy { hierarchy } if hierarchy == "modes/binary"),
		"{err:?}"
	);
}

#[test]
fn family_names_are_unique_per_hierarchy() {
	let Tree { modes, numeric, counting, .. } = tree();

	assert!(matches!(
		numeric.family("numeric"),
		Err(RegistrationError::DuplicateFamily { .. })
	));
	assert!(matches!(modes.family("counting"), Err(RegistrationError::DuplicateFamily { .. })));
	assert_eq!(modes.find_family("counting").unwrap().id(), counting.id());
	assert!(modes.find_family("binary").is_none());
}

#[test]
fn summaries_name_each_variants_family() {
	let Tree { modes, .. } = tree();

	let families: Vec<_> = modes
		.variants()
		.into_iter()
		.map(|v| (v.values[0].clone(), v.family))
		.collect();

	assert_eq!(
		families,
		vec![
			(DiscriminatorValue::from("text"), None),
			(DiscriminatorValue::from("number"), Some("numeric".to_owned())),
			(DiscriminatorValue::from("count"), Some("counting".to_owned())),
		]
	);
}

#[test]
fn union_spans_hierarchies_with_different_fields() {
	let Tree { registry, modes, .. } = tree();
	let statuses = registry
		.declare::<dyn Mode>("statuses", HierarchyOptions::new().kind(DiscriminatorKind::Integer))
		.unwrap();
	statuses.register::<NotFoundStatus>().unwrap();
	let either = &modes | &statuses;

	let found = registry
		.validate::<dyn Mode>(either.clone(), &json!({"type": 404}))
		.unwrap();
	assert!(found.is::<NotFoundStatus>());
	let text = registry
		.validate::<dyn Mode>(either.clone(), &json!({"mode": "text", "text": "t"}))
		.unwrap();
	assert!(text.is::<TextMode>());

	let err = registry
		.validate::<dyn Mode>(either.clone(), &json!({"neither": true}))
		.unwrap_err();
	assert!(
		matches!(&err, ValidationError::MissingDiscriminatorField { hierarchy, .. } if hierarchy == "modes"),
		"{err:?}"
	);

	let err = registry
		.validate::<dyn Mode>(either, &json!({"mode": "bytes", "type": 500}))
		.unwrap_err();
	assert_eq!(known(err), values(&["count", "number", "tally", "text"]));
}

#[test]
fn union_of_families_in_one_hierarchy_merges_members() {
	let Tree { registry, modes, counting, .. } = tree();
	let plain = modes.family("plain").unwrap();
	plain.register::<BytesMode>().unwrap();
	let selection = &plain | &counting;

	let err = registry
		.validate::<dyn Mode>(selection.clone(), &json!({"mode": "text", "text": "t"}))
		.unwrap_err();
	assert_eq!(known(err), values(&["bytes", "count", "tally"]));

	let bytes = registry
		.validate::<dyn Mode>(selection, &json!({"mode": "bytes", "content": "aGk="}))
		.unwrap();
	assert!(bytes.is::<BytesMode>());
}

#[test]
fn intersection_keeps_shared_members() {
	let Tree { registry, modes, numeric, counting } = tree();

	let nested = &numeric & &counting;
	let err = registry
		.validate::<dyn Mode>(nested, &json!({"mode": "number", "number": 1.0}))
		.unwrap_err();
	assert_eq!(known(err), values(&["count", "tally"]));

	let same = &modes & &numeric;
	let number = registry
		.validate::<dyn Mode>(same, &json!({"mode": "number", "number": 1.0}))
		.unwrap();
	assert!(number.is::<NumberMode>());

	let other = registry.declare::<dyn Mode>("other", mode_options()).unwrap();
	other.register::<TextMode>().unwrap();
	let disjoint = &modes & &other;
	let err = registry
		.validate::<dyn Mode>(disjoint, &json!({"mode": "text", "text": "t"}))
		.unwrap_err();
	assert!(
		matches!(&err, ValidationError::EmptyHierarchy { hierarchy } if hierarchy == "modes & other"),
		"{err:?}"
	);
}

#[test]
fn handles_reject_the_wrong_base() {
	let Tree { registry, .. } = tree();

	assert!(registry.hierarchy::<dyn Mode>("modes").is_some());
	assert!(registry.hierarchy::<dyn std::fmt::Debug + Send + Sync>("modes").is_none());
	assert!(matches!(
		registry.declare_family::<dyn std::fmt::Debug + Send + Sync>(
			registry.hierarchy::<dyn Mode>("modes").unwrap().id(),
			"debuggable"
		),
		Err(RegistrationError::BaseMismatch { .. })
	));
}
