// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration error types.

use std::path::PathBuf;

/// Errors that can occur while reading or writing the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// I/O error reading or writing the config file
	#[error("I/O error on {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// TOML parsing error
	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// TOML serialization error
	#[error("Failed to serialize config: {0}")]
	TomlSerialize(#[from] toml::ser::Error),

	/// Refusing to overwrite an existing config file
	#[error("Config file already exists: {0}")]
	AlreadyExists(PathBuf),

	/// Only a YAML file from an older release is present
	#[error("Found {0} from an older kade release, YAML config is no longer read. Run `kade --create-config` to write config.toml")]
	LegacyConfig(PathBuf),

	/// Home directory not found
	#[error("Could not determine home directory")]
	HomeDirNotFound,
}

impl ConfigError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::Io {
			path: path.into(),
			source,
		}
	}

	/// Whether the error only means "there is no config file yet".
	pub fn is_not_found(&self) -> bool {
		matches!(self, ConfigError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
	}
}
