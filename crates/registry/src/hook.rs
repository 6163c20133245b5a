//! Registration hook: turning a variant type into a registered descriptor.
//!
//! Two entry points reach the same [`Registry::register`] path:
//!
//! * explicit: [`Registry::register_variant`] (or `Hierarchy::register`), called
//!   from the variant's own initialization code, at any time;
//! * link time: [`declare_variant!`](crate::declare_variant) submits a
//!   [`VariantDecl`] that is installed when its hierarchy (or family) is declared.
//!
//! Either way the discriminator is read from the variant's own declaration and
//! must be a literal.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::descriptor::{VariantMeta, VariantSpec};
use crate::error::RegistrationError;
use crate::hierarchy::{HierarchyMeta, Target};
use crate::registry::{InsertAction, Registry};
use crate::schema::SerdeSchema;
use crate::value::{Discriminator, DiscriminatorValue};

/// A concrete variant of base `B`.
///
/// The `Deserialize` impl is the variant's field schema. The discriminator is
/// declared once here and nowhere else.
pub trait Variant<B: ?Sized>: DeserializeOwned + 'static {
	fn discriminator() -> Discriminator;

	fn into_base(self) -> Box<B>;
}

/// A variant declared at link time against a hierarchy name.
pub struct VariantDecl {
	pub hierarchy: &'static str,
	pub family: Option<&'static str>,
	pub variant: &'static str,
	pub install: fn(&Registry, Target) -> Result<InsertAction, RegistrationError>,
}

inventory::collect!(VariantDecl);

/// Installer stored in [`VariantDecl::install`].
pub fn install_variant<B, T>(
	registry: &Registry,
	target: Target,
) -> Result<InsertAction, RegistrationError>
where
	B: ?Sized + 'static,
	T: Variant<B>,
{
	registry.register_variant::<B, T>(target)
}

/// Validates a declaration against the hierarchy and returns its values,
/// canonical first, deduplicated.
pub(crate) fn literal_values<B: ?Sized>(
	spec: &VariantSpec<B>,
	meta: &HierarchyMeta,
) -> Result<Vec<DiscriminatorValue>, RegistrationError> {
	let non_literal = |reason: String| RegistrationError::NonLiteralDiscriminator {
		variant: spec.variant.type_name,
		field: meta.field.to_string(),
		reason,
	};
	let declared = match &spec.discriminator {
		Discriminator::Literal(values) => values,
		Discriminator::Open { type_name } => {
			return Err(non_literal(format!("declared as open type `{type_name}`")));
		}
	};
	if declared.is_empty() {
		return Err(non_literal("no literal values declared".to_owned()));
	}

	let mut values = Vec::with_capacity(declared.len());
	for value in declared {
		if value.kind() != meta.kind {
			return Err(non_literal(format!(
				"{value} is a {} literal but `{}` dispatches on {} values",
				value.kind(),
				meta.name,
				meta.kind
			)));
		}
		if !values.contains(value) {
			values.push(value.clone());
		}
	}
	Ok(values)
}

impl Registry {
	/// Registers variant `T` into `target`, reading its discriminator from `T` itself.
	///
	/// Registering into a family places `T` in the family's root hierarchy, where
	/// its values must be unique.
	pub fn register_variant<B, T>(
		&self,
		target: impl Into<Target>,
	) -> Result<InsertAction, RegistrationError>
	where
		B: ?Sized + 'static,
		T: Variant<B>,
	{
		let spec = VariantSpec::new(
			VariantMeta::of::<T>(),
			T::discriminator(),
			Arc::new(SerdeSchema::<T>::new()),
		);
		self.register(target, spec)
	}

	/// Installs every link-time declaration aimed at `hierarchy` / `family`.
	pub(crate) fn install_declared(
		&self,
		hierarchy: &str,
		family: Option<&str>,
		target: Target,
	) -> Result<(), RegistrationError> {
		for decl in inventory::iter::<VariantDecl> {
			if decl.hierarchy != hierarchy || decl.family != family {
				continue;
			}
			tracing::trace!(hierarchy, ?family, variant = decl.variant, "installing declared variant");
			(decl.install)(self, target)?;
		}
		Ok(())
	}
}

/// Implements [`Variant`] for a type, with one or more literal discriminator values.
///
/// ```ignore
/// variant!(TextMode as dyn Mode => "text");
/// variant!(NumberMode as dyn Mode => "number", "num");
/// ```
#[macro_export]
macro_rules! variant {
	($variant:ty as $base:ty => $($value:expr),+ $(,)?) => {
		impl $crate::Variant<$base> for $variant {
			fn discriminator() -> $crate::Discriminator {
				$crate::Discriminator::one_of([$($crate::DiscriminatorValue::from($value)),+])
			}

			fn into_base(self) -> ::std::boxed::Box<$base> {
				::std::boxed::Box::new(self)
			}
		}
	};
}

/// Declares a variant at link time; it is installed when the named hierarchy
/// (or `hierarchy / family`) is declared on any registry.
///
/// ```ignore
/// declare_variant!("modes", dyn Mode => TextMode);
/// declare_variant!("modes" / "numeric", dyn Mode => NumberMode);
/// ```
#[macro_export]
macro_rules! declare_variant {
	($hierarchy:literal, $base:ty => $variant:ty) => {
		$crate::inventory::submit! {
			$crate::VariantDecl {
				hierarchy: $hierarchy,
				family: ::std::option::Option::None,
				variant: ::std::stringify!($variant),
				install: $crate::install_variant::<$base, $variant>,
			}
		}
	};
	($hierarchy:literal / $family:literal, $base:ty => $variant:ty) => {
		$crate::inventory::submit! {
			$crate::VariantDecl {
				hierarchy: $hierarchy,
				family: ::std::option::Option::Some($family),
				variant: ::std::stringify!($variant),
				install: $crate::install_variant::<$base, $variant>,
			}
		}
	};
}
