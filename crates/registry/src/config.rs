//! Registry-wide defaults, loadable from TOML.
//!
//! ```toml
//! default_discriminator_field = "kind"
//! default_kind = "string"
//! seal_after_first_validation = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::DiscriminatorKind;

/// Discriminator field used when a hierarchy does not name one.
pub const DEFAULT_DISCRIMINATOR_FIELD: &str = "type";

/// Defaults applied to hierarchies declared without explicit [`HierarchyOptions`](crate::HierarchyOptions).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
	pub default_discriminator_field: String,
	pub default_kind: DiscriminatorKind,
	pub seal_after_first_validation: bool,
}

impl Default for RegistryConfig {
	fn default() -> Self {
		Self {
			default_discriminator_field: DEFAULT_DISCRIMINATOR_FIELD.to_owned(),
			default_kind: DiscriminatorKind::default(),
			seal_after_first_validation: false,
		}
	}
}

impl RegistryConfig {
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.check()?;
		Ok(config)
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}

	fn check(&self) -> Result<(), ConfigError> {
		if self.default_discriminator_field.trim().is_empty() {
			return Err(ConfigError::EmptyField);
		}
		Ok(())
	}
}

/// Errors that can occur when loading a [`RegistryConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("I/O error reading {}: {error}", path.display())]
	Io {
		path: PathBuf,
		error: std::io::Error,
	},

	#[error("default_discriminator_field must not be empty")]
	EmptyField,
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_input_yields_defaults() {
		let config = RegistryConfig::from_toml_str("").unwrap();
		assert_eq!(config, RegistryConfig::default());
		assert_eq!(config.default_discriminator_field, "type");
	}

	#[test]
	fn partial_input_overrides_named_keys() {
		let config = RegistryConfig::from_toml_str(
			"default_discriminator_field = \"mode\"\ndefault_kind = \"integer\"\n",
		)
		.unwrap();
		assert_eq!(config.default_discriminator_field, "mode");
		assert_eq!(config.default_kind, DiscriminatorKind::Integer);
		assert!(!config.seal_after_first_validation);
	}

	#[test]
	fn rejects_unknown_keys_and_blank_field() {
		assert!(matches!(
			RegistryConfig::from_toml_str("discriminator = \"mode\""),
			Err(ConfigError::Toml(_))
		));
		assert!(matches!(
			RegistryConfig::from_toml_str("default_discriminator_field = \"  \""),
			Err(ConfigError::EmptyField)
		));
	}

	#[test]
	fn loads_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "seal_after_first_validation = true").unwrap();
		let config = RegistryConfig::load(file.path()).unwrap();
		assert!(config.seal_after_first_validation);

		let missing = RegistryConfig::load("/nonexistent/polymodel.toml");
		assert!(matches!(missing, Err(ConfigError::Io { .. })));
	}
}
