//! Polymorphic model registry.
//!
//! Payloads arrive as untyped JSON maps that belong to a *hierarchy*: a base
//! type with any number of concrete variants, each identified by a literal in
//! one discriminator field. This crate keeps the mapping from discriminator
//! values to variants and turns a payload into the right variant instance.
//!
//! # Flow
//!
//! ```text
//! declare ──► Hierarchy<B> ──► register::<T>() ──► TypeDescriptor<B> (per value)
//!                                                        │
//! payload ──► validate ──► extract ──► resolve ──────────┴──► FieldSchema ──► Validated<B>
//! ```
//!
//! * Variants register themselves against a hierarchy, explicitly or at link
//!   time through [`declare_variant!`]. No central list has to be edited.
//! * Every variant's discriminator values are unique within its hierarchy.
//! * Registration and validation may run concurrently; readers work from
//!   immutable snapshots published with `arc_swap`.
//! * Field validation is delegated to a [`FieldSchema`]; with [`variant!`] that
//!   is the variant's serde `Deserialize` impl.
//!
//! # Example
//!
//! ```ignore
//! trait Mode: Send + Sync {}
//!
//! #[derive(serde::Deserialize)]
//! struct TextMode { text: String }
//! impl Mode for TextMode {}
//! polymodel_registry::variant!(TextMode as dyn Mode => "text");
//!
//! let registry = Registry::new();
//! let modes = registry.declare::<dyn Mode>("modes", HierarchyOptions::new().field("mode"))?;
//! modes.register::<TextMode>()?;
//! let mode = modes.validate(&json!({"mode": "text", "text": "hi"}))?;
//! assert!(mode.is::<TextMode>());
//! ```

mod config;
mod descriptor;
mod dispatch;
mod error;
mod handle;
mod hierarchy;
mod hook;
mod registry;
mod resolver;
mod schema;
mod selection;
mod value;

#[cfg(test)]
mod tests;

pub use config::{ConfigError, DEFAULT_DISCRIMINATOR_FIELD, RegistryConfig};
pub use descriptor::{TypeDescriptor, VariantMeta, VariantSpec, VariantSummary};
pub use dispatch::{Stage, Validated};
pub use error::{RegistrationError, ValidationError};
pub use handle::{Family, Hierarchy};
pub use hierarchy::{FamilyId, HierarchyId, HierarchyOptions, Snapshot, Target};
pub use hook::{Variant, VariantDecl, install_variant};
#[doc(hidden)]
pub use inventory;
pub use registry::{HierarchySummary, InsertAction, Registry};
pub use schema::{FieldSchema, FnSchema, SchemaError, SerdeSchema};
pub use selection::Selection;
pub use value::{Discriminator, DiscriminatorKind, DiscriminatorValue};
