// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Release check against the GitHub releases API.

use std::cmp::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Latest-release endpoint of the kade repository.
pub const RELEASES_URL: &str = "https://api.github.com/repos/adde/kade/releases/latest";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum VersionError {
	#[error("failed to build HTTP client: {0}")]
	Client(#[source] reqwest::Error),

	#[error("release request failed: {0}")]
	Request(#[from] reqwest::Error),

	#[error("release feed returned status {0}")]
	Status(u16),

	#[error("release feed returned an empty tag name")]
	EmptyTag,
}

/// Something that knows the latest released version.
#[async_trait]
pub trait VersionChecker: Send + Sync {
	/// The latest release tag, e.g. `v1.4.0`.
	async fn latest_version(&self) -> Result<String, VersionError>;
}

#[derive(Debug, Deserialize)]
struct Release {
	tag_name: String,
}

/// [`VersionChecker`] backed by `GET /repos/{owner}/{repo}/releases/latest`.
#[derive(Debug, Clone)]
pub struct GithubReleaseChecker {
	client: reqwest::Client,
	url: String,
}

impl GithubReleaseChecker {
	pub fn new() -> Result<Self, VersionError> {
		Self::with_url(RELEASES_URL)
	}

	/// Point the checker at a different releases endpoint.
	pub fn with_url(url: impl Into<String>) -> Result<Self, VersionError> {
		let client = reqwest::Client::builder()
			.user_agent(crate::user_agent())
			.timeout(REQUEST_TIMEOUT)
			.build()
			.map_err(VersionError::Client)?;
		Ok(Self {
			client,
			url: url.into(),
		})
	}
}

#[async_trait]
impl VersionChecker for GithubReleaseChecker {
	#[instrument(skip(self), fields(url = %self.url))]
	async fn latest_version(&self) -> Result<String, VersionError> {
		let response = self
			.client
			.get(&self.url)
			.header(reqwest::header::ACCEPT, "application/vnd.github+json")
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			return Err(VersionError::Status(status.as_u16()));
		}

		let release: Release = response.json().await?;
		let tag = release.tag_name.trim().to_string();
		if tag.is_empty() {
			return Err(VersionError::EmptyTag);
		}
		debug!(tag = %tag, "Fetched latest release");
		Ok(tag)
	}
}

/// Result of comparing the running build with the latest release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionStatus {
	UpToDate,
	Outdated { current: String, latest: String },
	/// The release feed could not be read or parsed. Treated as up to date.
	Unknown,
}

impl VersionStatus {
	/// Ask `checker` for the latest release and compare it with `current`.
	pub async fn check(checker: &dyn VersionChecker, current: &str) -> Self {
		let latest = match checker.latest_version().await {
			Ok(latest) => latest,
			Err(e) => {
				warn!(error = %e, "Could not determine the latest release");
				return VersionStatus::Unknown;
			}
		};

		match compare_versions(current, &latest) {
			Some(Ordering::Less) => VersionStatus::Outdated {
				current: current.to_string(),
				latest,
			},
			Some(_) => VersionStatus::UpToDate,
			None => {
				warn!(current, latest = %latest, "Unparseable version, skipping comparison");
				VersionStatus::Unknown
			}
		}
	}

	pub fn is_outdated(&self) -> bool {
		matches!(self, VersionStatus::Outdated { .. })
	}
}

/// Compare two dotted numeric versions, ignoring a leading `v` and any
/// pre-release or build suffix. Missing components count as zero.
pub fn compare_versions(a: &str, b: &str) -> Option<Ordering> {
	let a = parse_version(a)?;
	let b = parse_version(b)?;
	let len = a.len().max(b.len());
	let component = |v: &[u64], i: usize| v.get(i).copied().unwrap_or(0);
	Some(
		(0..len)
			.map(|i| component(&a, i).cmp(&component(&b, i)))
			.find(|ord| ord.is_ne())
			.unwrap_or(Ordering::Equal),
	)
}

fn parse_version(raw: &str) -> Option<Vec<u64>> {
	let raw = raw.trim();
	let raw = raw.strip_prefix(['v', 'V']).unwrap_or(raw);
	let core = raw.split(['-', '+']).next().unwrap_or(raw);
	if core.is_empty() {
		return None;
	}
	core.split('.').map(|part| part.parse().ok()).collect()
}
