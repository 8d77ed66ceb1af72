// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Build and release information for kade.
//!
//! [`BuildInfo`] carries the compile-time version, git SHA, build timestamp
//! and platform. The [`check`] module asks the release feed whether a newer
//! version exists.

shadow_rs::shadow!(build);

pub mod check;

pub use check::{
	compare_versions, GithubReleaseChecker, VersionChecker, VersionError, VersionStatus,
	RELEASES_URL,
};

/// Platform string in `{os}-{arch}` format, e.g. "linux-x86_64".
///
/// Derived at compile time from target configuration.
pub const PLATFORM: &str = env!("KADE_PLATFORM");

/// Core build information.
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
	pub version: &'static str,
	pub git_sha: &'static str,
	pub build_timestamp: &'static str,
	pub platform: &'static str,
}

impl BuildInfo {
	/// Get the current build information (compile-time constants).
	#[allow(clippy::const_is_empty)]
	pub const fn current() -> Self {
		Self {
			version: build::PKG_VERSION,
			git_sha: if build::SHORT_COMMIT.is_empty() {
				"unknown"
			} else {
				build::SHORT_COMMIT
			},
			build_timestamp: build::BUILD_TIME,
			platform: PLATFORM,
		}
	}
}

/// The version string printed by `kade --version`.
pub const fn kade_version() -> &'static str {
	build::PKG_VERSION
}

/// User-Agent sent with outgoing requests: `kade/{version} ({platform}; {git_sha})`.
pub fn user_agent() -> String {
	let info = BuildInfo::current();
	format!("kade/{} ({}; {})", info.version, info.platform, info.git_sha)
}
