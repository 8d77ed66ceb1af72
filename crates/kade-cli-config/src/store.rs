// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reading and writing the config file.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::runtime::KadeConfig;
use crate::ConfigError;

const FILE_HEADER: &str = "# kade configuration\n# Values here are offered as defaults by the deploy prompts.\n\n";

/// Parse the config file at `path`.
pub fn read_config(path: &Path) -> Result<KadeConfig, ConfigError> {
	let contents = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
	let config = toml::from_str(&contents).map_err(|source| ConfigError::TomlParse {
		path: path.to_path_buf(),
		source,
	})?;
	debug!(path = %path.display(), "loaded config file");
	Ok(config)
}

/// Render `config` as the TOML written by [`write_config`].
pub fn render_config(config: &KadeConfig) -> Result<String, ConfigError> {
	let body = toml::to_string_pretty(config)?;
	Ok(format!("{FILE_HEADER}{body}"))
}

/// Write a new config file. Refuses to touch an existing one.
///
/// The file holds passwords, so on Unix it is created with mode 0600.
pub fn write_config(path: &Path, config: &KadeConfig) -> Result<(), ConfigError> {
	if path.exists() {
		return Err(ConfigError::AlreadyExists(path.to_path_buf()));
	}

	let contents = render_config(config)?;

	if let Some(parent) = path.parent() {
		if !parent.exists() {
			debug!(path = %parent.display(), "creating config directory");
			fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
		}
	}

	let mut options = fs::OpenOptions::new();
	options.write(true).create_new(true);
	#[cfg(unix)]
	{
		use std::os::unix::fs::OpenOptionsExt;
		options.mode(0o600);
	}

	let mut file = options.open(path).map_err(|e| match e.kind() {
		std::io::ErrorKind::AlreadyExists => ConfigError::AlreadyExists(path.to_path_buf()),
		_ => ConfigError::io(path, e),
	})?;
	file
		.write_all(contents.as_bytes())
		.map_err(|e| ConfigError::io(path, e))?;

	info!(path = %path.display(), "created config file");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::runtime::{LogFormat, LogLevel};
	use tempfile::tempdir;

	fn sample() -> KadeConfig {
		let mut config = KadeConfig::default();
		config.global.container_registry.uri = "ghcr.io".into();
		config.global.container_registry.user = "bot".into();
		config.global.container_registry.pass = "token".into();
		config.global.database.host = "mysql.db.svc".into();
		config.global.database.user = "wp".into();
		config.global.database.pass = "db-pass".into();
		config.logging.level = LogLevel::Info;
		config.logging.format = LogFormat::Json;
		config
	}

	#[test]
	fn test_write_then_read() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("kade/config.toml");

		write_config(&path, &sample()).unwrap();
		let loaded = read_config(&path).unwrap();

		assert_eq!(loaded, sample());
		assert_eq!(loaded.global.database.pass.expose(), "db-pass");
	}

	#[test]
	fn test_written_file_has_sections_and_plain_passwords() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("config.toml");

		write_config(&path, &sample()).unwrap();
		let contents = fs::read_to_string(&path).unwrap();

		assert!(contents.starts_with("# kade configuration"));
		assert!(contents.contains("[global.container_registry]"));
		assert!(contents.contains("[global.database]"));
		assert!(contents.contains("pass = \"db-pass\""));
		assert!(contents.contains("level = \"info\""));
		assert!(contents.contains("format = \"json\""));
	}

	#[test]
	fn test_write_refuses_existing_file() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("config.toml");
		fs::write(&path, "# existing config\n").unwrap();

		let err = write_config(&path, &sample()).unwrap_err();

		assert!(matches!(err, ConfigError::AlreadyExists(_)));
		assert_eq!(fs::read_to_string(&path).unwrap(), "# existing config\n");
	}

	#[cfg(unix)]
	#[test]
	fn test_written_file_is_private() {
		use std::os::unix::fs::PermissionsExt;

		let dir = tempdir().unwrap();
		let path = dir.path().join("config.toml");
		write_config(&path, &sample()).unwrap();

		let mode = fs::metadata(&path).unwrap().permissions().mode();
		assert_eq!(mode & 0o777, 0o600);
	}

	#[test]
	fn test_missing_file_is_not_found() {
		let dir = tempdir().unwrap();
		let err = read_config(&dir.path().join("absent.toml")).unwrap_err();
		assert!(err.is_not_found());
	}

	#[test]
	fn test_invalid_toml_reports_path() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("config.toml");
		fs::write(&path, "[global\nbroken").unwrap();

		let err = read_config(&path).unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
		assert!(!err.is_not_found());
		assert!(err.to_string().contains("config.toml"));
	}
}
