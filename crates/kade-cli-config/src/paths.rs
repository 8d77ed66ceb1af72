// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! XDG Base Directory compliant path resolution.

use std::path::{Path, PathBuf};

use crate::ConfigError;

const CONFIG_FILE: &str = "kade/config.toml";
const LEGACY_CONFIG_FILE: &str = "kade/config.yml";

/// Resolved locations kade reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
	/// User config file: ~/.config/kade/config.toml
	pub user_config_file: PathBuf,
	/// YAML file written by older kade releases. Detected, never read.
	pub legacy_config_file: PathBuf,
	/// Default kubeconfig: ~/.kube/config
	pub kubeconfig: PathBuf,
}

impl PathsConfig {
	/// Get the config directory (parent of user_config_file)
	pub fn config_dir(&self) -> PathBuf {
		self
			.user_config_file
			.parent()
			.map(|p| p.to_path_buf())
			.unwrap_or_else(|| self.user_config_file.clone())
	}
}

/// Resolve paths from the environment.
///
/// Uses XDG_CONFIG_HOME if set, otherwise ~/.config.
pub fn resolve_xdg_paths() -> Result<PathsConfig, ConfigError> {
	let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
	let config_home = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
	Ok(paths_for(&home, config_home))
}

/// Resolve paths for an explicit home directory and optional XDG config home.
pub fn paths_for(home: &Path, config_home: Option<PathBuf>) -> PathsConfig {
	let config_home = config_home
		.filter(|p| p.is_absolute())
		.unwrap_or_else(|| home.join(".config"));

	tracing::debug!(config_home = %config_home.display(), "resolved XDG paths");

	PathsConfig {
		user_config_file: config_home.join(CONFIG_FILE),
		legacy_config_file: config_home.join(LEGACY_CONFIG_FILE),
		kubeconfig: home.join(".kube").join("config"),
	}
}
