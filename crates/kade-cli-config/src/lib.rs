// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for the kade CLI.
//!
//! This crate provides:
//! - XDG Base Directory compliant path resolution
//! - The `config.toml` schema (registry and database defaults, logging)
//! - Loading with graceful fallback and write-once creation

pub mod error;
pub mod paths;
pub mod runtime;
pub mod store;

pub use error::ConfigError;
pub use paths::{paths_for, resolve_xdg_paths, PathsConfig};
pub use runtime::{
	DatabaseConfig, GlobalConfig, KadeConfig, LogFormat, LogLevel, LoggingConfig, RegistryConfig,
};
pub use store::{read_config, render_config, write_config};

/// Where the active configuration came from.
#[derive(Debug)]
pub enum ConfigSource {
	File(std::path::PathBuf),
	/// No usable file. Carries the reason when a file existed but was unusable.
	Defaults(Option<ConfigError>),
}

/// Load the user config file, falling back to defaults when it is missing
/// or unreadable.
pub fn load_config(paths: &PathsConfig) -> (KadeConfig, ConfigSource) {
	let path = &paths.user_config_file;
	match read_config(path) {
		Ok(config) => (config, ConfigSource::File(path.clone())),
		Err(e) if e.is_not_found() => {
			let legacy = &paths.legacy_config_file;
			if legacy.exists() {
				tracing::warn!(path = %legacy.display(), "found legacy YAML config, ignoring it");
				return (
					KadeConfig::default(),
					ConfigSource::Defaults(Some(ConfigError::LegacyConfig(legacy.clone()))),
				);
			}
			tracing::debug!(path = %path.display(), "no config file, using defaults");
			(KadeConfig::default(), ConfigSource::Defaults(None))
		}
		Err(e) => {
			tracing::warn!(path = %path.display(), error = %e, "ignoring unusable config file");
			(KadeConfig::default(), ConfigSource::Defaults(Some(e)))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::Path;

	#[test]
	fn test_load_config_missing_file_uses_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let paths = paths_for(dir.path(), None);

		let (config, source) = load_config(&paths);

		assert_eq!(config, KadeConfig::default());
		assert!(matches!(source, ConfigSource::Defaults(None)));
	}

	#[test]
	fn test_load_config_reads_file() {
		let dir = tempfile::tempdir().unwrap();
		let paths = paths_for(dir.path(), None);
		let mut config = KadeConfig::default();
		config.global.database.host = "mysql.db.svc".into();
		write_config(&paths.user_config_file, &config).unwrap();

		let (loaded, source) = load_config(&paths);

		assert_eq!(loaded.global.database.host, "mysql.db.svc");
		assert!(matches!(source, ConfigSource::File(p) if p == paths.user_config_file));
	}

	#[test]
	fn test_load_config_broken_file_uses_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let paths = paths_for(dir.path(), None);
		std::fs::create_dir_all(paths.config_dir()).unwrap();
		std::fs::write(&paths.user_config_file, "not = [valid").unwrap();

		let (config, source) = load_config(&paths);

		assert_eq!(config, KadeConfig::default());
		assert!(matches!(source, ConfigSource::Defaults(Some(_))));
		assert!(Path::new(&paths.user_config_file).exists());
	}

	#[test]
	fn test_load_config_reports_legacy_yaml() {
		let dir = tempfile::tempdir().unwrap();
		let paths = paths_for(dir.path(), None);
		std::fs::create_dir_all(paths.config_dir()).unwrap();
		std::fs::write(&paths.legacy_config_file, "global:\n  database:\n    host: db\n").unwrap();

		let (config, source) = load_config(&paths);

		assert_eq!(config, KadeConfig::default());
		match source {
			ConfigSource::Defaults(Some(ConfigError::LegacyConfig(path))) => {
				assert_eq!(path, paths.legacy_config_file);
			}
			other => panic!("expected legacy config notice, got {other:?}"),
		}
	}

	#[test]
	fn test_load_config_prefers_toml_over_legacy() {
		let dir = tempfile::tempdir().unwrap();
		let paths = paths_for(dir.path(), None);
		write_config(&paths.user_config_file, &KadeConfig::default()).unwrap();
		std::fs::write(&paths.legacy_config_file, "global: {}\n").unwrap();

		let (_, source) = load_config(&paths);

		assert!(matches!(source, ConfigSource::File(_)));
	}
}
