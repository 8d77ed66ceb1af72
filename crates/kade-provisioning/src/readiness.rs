// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded polling for deployment readiness.
//!
//! Readiness is advisory. The poller never fails a run: when the attempt
//! budget runs out it reports [`Readiness::TimedOut`] and the caller goes on
//! to print the URL anyway.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kade_k8s::{ClusterClient, DeploymentStatus};

use crate::config::ReadinessConfig;

/// Source of delays between status queries.
#[async_trait]
pub trait Clock: Send + Sync {
	async fn sleep(&self, duration: Duration);
}

/// Wall-clock sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
	async fn sleep(&self, duration: Duration) {
		tokio::time::sleep(duration).await;
	}
}

/// Outcome of waiting for a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
	/// Ready replicas met the desired count on query number `attempts`.
	Ready { attempts: u32 },
	/// Every one of `attempts` queries came back not ready.
	TimedOut { attempts: u32 },
}

impl Readiness {
	pub fn is_ready(&self) -> bool {
		matches!(self, Readiness::Ready { .. })
	}

	pub fn attempts(&self) -> u32 {
		match self {
			Readiness::Ready { attempts } | Readiness::TimedOut { attempts } => *attempts,
		}
	}
}

pub struct ReadinessPoller {
	config: ReadinessConfig,
	clock: Arc<dyn Clock>,
}

impl Default for ReadinessPoller {
	fn default() -> Self {
		Self::new(ReadinessConfig::default(), Arc::new(TokioClock))
	}
}

impl ReadinessPoller {
	pub fn new(config: ReadinessConfig, clock: Arc<dyn Clock>) -> Self {
		Self { config, clock }
	}

	pub fn config(&self) -> &ReadinessConfig {
		&self.config
	}

	/// Query the deployment until it is ready or the attempt budget is spent.
	///
	/// A failed query counts as "not ready". There is no sleep after the last
	/// query.
	pub async fn wait(&self, client: &dyn ClusterClient, namespace: &str, name: &str) -> Readiness {
		let max_attempts = self.config.max_attempts.max(1);

		for attempt in 1..=max_attempts {
			match client.get_deployment(namespace, name).await {
				Ok(deployment) => {
					let status = DeploymentStatus::from_deployment(&deployment);
					tracing::debug!(
						namespace,
						name,
						attempt,
						ready = status.ready_replicas,
						desired = status.desired_replicas,
						"Polled deployment status"
					);
					if status.is_ready() {
						return Readiness::Ready { attempts: attempt };
					}
				}
				Err(e) => {
					tracing::warn!(namespace, name, attempt, error = %e, "Deployment status query failed");
				}
			}

			if attempt < max_attempts {
				self.clock.sleep(self.config.interval).await;
			}
		}

		tracing::info!(
			namespace,
			name,
			attempts = max_attempts,
			"Deployment not ready within the polling budget"
		);
		Readiness::TimedOut {
			attempts: max_attempts,
		}
	}
}


#[cfg(test)]
mod proptests {
	use super::tests::RecordingClock;
	use super::*;
	use kade_k8s::{Deployment, DeploymentSpec, MockClusterClient, ObjectMeta};
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn wait_is_bounded(
			ready_at in proptest::option::of(1u32..20),
			max_attempts in 1u32..15,
			interval_ms in 1u64..10_000,
		) {
			let mock = MockClusterClient::new();
			mock.put_deployment("ns", Deployment {
				metadata: ObjectMeta { name: Some("app".into()), ..Default::default() },
				spec: Some(DeploymentSpec { replicas: Some(1), ..Default::default() }),
				..Default::default()
			});
			let script: Vec<i32> = match ready_at {
				Some(n) => (1..=n).map(|i| i32::from(i == n)).collect(),
				None => vec![0],
			};
			mock.script_ready_replicas(script);

			let clock = Arc::new(RecordingClock::default());
			let config = ReadinessConfig {
				interval: Duration::from_millis(interval_ms),
				max_attempts,
			};
			let poller = ReadinessPoller::new(config, clock.clone());
			let readiness = tokio_test::block_on(poller.wait(&mock, "ns", "app"));

			prop_assert!(readiness.attempts() <= max_attempts);
			let sleeps = clock.sleeps();
			prop_assert_eq!(sleeps.len() as u32, readiness.attempts() - 1);
			prop_assert!(sleeps.iter().all(|d| *d == config.interval));
			match ready_at {
				Some(n) if n <= max_attempts => prop_assert_eq!(readiness, Readiness::Ready { attempts: n }),
				_ => prop_assert_eq!(readiness, Readiness::TimedOut { attempts: max_attempts }),
			}
		}
	}
}
