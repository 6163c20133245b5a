use pretty_assertions::assert_eq;
use serde_json::json;

use super::fixtures::*;
use super::init_tracing;
use crate::{
	DiscriminatorKind, DiscriminatorValue, HierarchyOptions, InsertAction, RegistrationError,
	Registry, RegistryConfig, ValidationError,
};

#[test]
fn config_supplies_hierarchy_defaults() {
	init_tracing();
	let config = RegistryConfig::from_toml_str("default_discriminator_field = \"kind\"").unwrap();
	let registry = Registry::with_config(config);

	let modes = registry.declare::<dyn Mode>("modes", HierarchyOptions::new()).unwrap();
	let explicit = registry.declare::<dyn Mode>("explicit", mode_options()).unwrap();
	modes.register::<TextMode>().unwrap();
	explicit.register::<TextMode>().unwrap();

	assert!(modes.validate(&json!({"kind": "text", "text": "k"})).is_ok());
	assert!(explicit.validate(&json!({"mode": "text", "text": "m"})).is_ok());
	assert_eq!(modes.snapshot().unwrap().field(), "kind");
	assert_eq!(explicit.snapshot().unwrap().kind(), DiscriminatorKind::String);
}

#[test]
fn sealed_hierarchy_refuses_new_variants() {
	init_tracing();
	let registry = Registry::new();
	let modes = registry.declare::<dyn Mode>("modes", mode_options()).unwrap();
	modes.register::<TextMode>().unwrap();

	assert!(modes.seal());
	assert!(!modes.seal());
	assert_eq!(registry.is_sealed(modes.id()), Some(true));

	let err = modes.register::<NumberMode>().unwrap_err();
	assert!(matches!(err, RegistrationError::Sealed { .. }), "{err:?}");
	assert_eq!(modes.register::<TextMode>().unwrap(), InsertAction::KeptExisting);
	assert!(modes.validate(&json!({"mode": "text", "text": "t"})).is_ok());
}

#[test]
fn first_validation_seals_when_configured() {
	init_tracing();
	let registry = Registry::new();
	let modes = registry
		.declare::<dyn Mode>("modes", mode_options().seal_after_first_validation(true))
		.unwrap();
	modes.register::<TextMode>().unwrap();
	assert_eq!(registry.is_sealed(modes.id()), Some(false));

	let _ = modes.validate(&json!({"mode": "number", "number": 1.0}));

	assert_eq!(registry.is_sealed(modes.id()), Some(true));
	assert!(matches!(
		modes.register::<NumberMode>(),
		Err(RegistrationError::Sealed { .. })
	));
}

#[test]
fn validating_an_empty_hierarchy_does_not_seal_it() {
	init_tracing();
	let registry = Registry::new();
	let modes = registry
		.declare::<dyn Mode>("modes", mode_options().seal_after_first_validation(true))
		.unwrap();

	let err = modes.validate(&json!({"mode": "text", "text": "t"})).unwrap_err();
	assert!(matches!(err, ValidationError::EmptyHierarchy { .. }), "{err:?}");
	assert_eq!(registry.is_sealed(modes.id()), Some(false));

	assert_eq!(modes.register::<TextMode>().unwrap(), InsertAction::InsertedNew);
	assert!(modes.validate(&json!({"mode": "text", "text": "t"})).is_ok());
	assert_eq!(registry.is_sealed(modes.id()), Some(true));
	assert!(matches!(
		modes.register::<NumberMode>(),
		Err(RegistrationError::Sealed { .. })
	));
}

#[test]
fn hierarchy_names_are_unique_per_registry() {
	init_tracing();
	let registry = Registry::new();
	registry.declare::<dyn Mode>("modes", mode_options()).unwrap();

	let err = registry.declare::<dyn Mode>("modes", mode_options()).unwrap_err();

	assert!(matches!(err, RegistrationError::DuplicateHierarchy { ref name } if name == "modes"));
	assert!(Registry::new().declare::<dyn Mode>("modes", mode_options()).is_ok());
}

#[test]
fn unregistered_hierarchy_leaves_stale_handles_failing() {
	init_tracing();
	let registry = Registry::new();
	let modes = registry.declare::<dyn Mode>("modes", mode_options()).unwrap();
	modes.register::<TextMode>().unwrap();
	let pinned = modes.snapshot().unwrap();

	assert!(registry.unregister_hierarchy(modes.id()));
	assert!(!registry.unregister_hierarchy(modes.id()));

	let err = modes.validate(&json!({"mode": "text", "text": "t"})).unwrap_err();
	assert!(matches!(err, ValidationError::UnknownHierarchy { id } if id == modes.id()));
	assert!(matches!(
		modes.register::<NumberMode>(),
		Err(RegistrationError::UnknownHierarchy(_))
	));
	assert!(modes.known_values().is_empty());

	assert!(pinned.resolve(&"text".into()).unwrap().is::<TextMode>());

	let again = registry.declare::<dyn Mode>("modes", mode_options()).unwrap();
	assert_ne!(again.id(), modes.id());
}

#[test]
fn clear_drops_everything() {
	init_tracing();
	let registry = Registry::new();
	registry.declare::<dyn Mode>("modes", mode_options()).unwrap();
	registry.declare::<dyn Mode>("other", mode_options()).unwrap();
	assert_eq!(registry.hierarchies().len(), 2);

	registry.clear();

	assert!(registry.hierarchies().is_empty());
	assert!(registry.hierarchy::<dyn Mode>("modes").is_none());
}

#[test]
fn hierarchy_summaries_serialize_for_tooling() {
	init_tracing();
	let registry = Registry::new();
	let modes = registry.declare::<dyn Mode>("modes", mode_options()).unwrap();
	modes.register::<CountMode>().unwrap();

	let summaries = registry.hierarchies();
	assert_eq!(summaries.len(), 1);
	assert_eq!(summaries[0].name, "modes");
	assert_eq!(summaries[0].variants, 1);
	assert!(!summaries[0].sealed);

	let variants = serde_json::to_value(modes.variants()).unwrap();
	assert_eq!(variants[0]["values"], json!(["count", "tally"]));
	assert!(variants[0].get("family").is_none());
}

#[test]
fn snapshot_resolve_mirrors_dispatch_errors() {
	init_tracing();
	let registry = Registry::new();
	let modes = registry.declare::<dyn Mode>("modes", mode_options()).unwrap();

	let empty = modes.snapshot().unwrap();
	assert!(matches!(
		empty.resolve(&"text".into()),
		Err(ValidationError::EmptyHierarchy { .. })
	));

	modes.register::<TextMode>().unwrap();
	let snapshot = modes.snapshot().unwrap();
	let err = snapshot.resolve(&DiscriminatorValue::from("bytes")).unwrap_err();
	assert_eq!(
		err.to_string(),
		r#"unknown discriminator "bytes" for `mode` in `modes`; known values: ["text"]"#
	);
}

#[test]
fn global_registry_is_shared() {
	init_tracing();
	let name = "lifecycle::global";
	let declared = Registry::global()
		.declare::<dyn Mode>(name, mode_options())
		.unwrap();
	declared.register::<BytesMode>().unwrap();

	let found = Registry::global().hierarchy::<dyn Mode>(name).unwrap();
	assert_eq!(found.id(), declared.id());
	assert_eq!(found.known_values(), vec![DiscriminatorValue::from("bytes")]);
	assert!(Registry::global().unregister_hierarchy(found.id()));
}
