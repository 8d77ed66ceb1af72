// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioner configuration.

use std::time::Duration;

/// How long to wait for a new deployment to report ready replicas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessConfig {
	/// Pause between two status queries
	pub interval: Duration,
	/// Upper bound on status queries, including the first one
	pub max_attempts: u32,
}

impl Default for ReadinessConfig {
	fn default() -> Self {
		Self {
			interval: Duration::from_secs(5),
			max_attempts: 11,
		}
	}
}

impl ReadinessConfig {
	/// Longest time [`crate::ReadinessPoller::wait`] can spend sleeping.
	pub fn max_wait(&self) -> Duration {
		self.interval * self.max_attempts.saturating_sub(1)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_readiness_config() {
		let config = ReadinessConfig::default();
		assert_eq!(config.interval, Duration::from_secs(5));
		assert_eq!(config.max_attempts, 11);
		assert_eq!(config.max_wait(), Duration::from_secs(50));
	}

	#[test]
	fn test_single_attempt_never_sleeps() {
		let config = ReadinessConfig {
			interval: Duration::from_secs(5),
			max_attempts: 1,
		};
		assert_eq!(config.max_wait(), Duration::ZERO);
	}
}
