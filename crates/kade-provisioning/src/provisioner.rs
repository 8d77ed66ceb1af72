// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core provisioner implementation.

use std::sync::Arc;

use kade_k8s::{ClusterClient, CreateOutcome, DeploymentStatus, K8sError};
use tracing::instrument;

use crate::error::ProvisionerError;
use crate::events::{ProgressEvent, ProgressSink};
use crate::readiness::{Readiness, ReadinessPoller};
use crate::specs::{build_service, deployment_url, ResourceSpecs};
use crate::types::{DeploymentRequest, ProvisioningReport, ProvisioningRun, Step, StepOutcome};

const NO_REGISTRY_CREDENTIALS: &str = "No container registry credentials provided";

/// Drives one deployment request through the fixed seven-step sequence.
///
/// Steps run strictly one after another. A conflict means the resource is
/// already there and is left untouched; any other error aborts the run and
/// leaves earlier resources in place.
pub struct Provisioner {
	client: Arc<dyn ClusterClient>,
	poller: ReadinessPoller,
	sink: Arc<dyn ProgressSink>,
}

impl Provisioner {
	/// Create a provisioner with the default readiness budget.
	pub fn new(client: Arc<dyn ClusterClient>, sink: Arc<dyn ProgressSink>) -> Self {
		Self {
			client,
			poller: ReadinessPoller::default(),
			sink,
		}
	}

	pub fn with_poller(mut self, poller: ReadinessPoller) -> Self {
		self.poller = poller;
		self
	}

	/// Create every resource, wait for the deployment, and report the URL.
	///
	/// A slow rollout is not an error: the report carries
	/// [`Readiness::TimedOut`] and the URL all the same.
	#[instrument(
		skip(self, request),
		fields(namespace = %request.namespace, deployment = %request.deployment_name)
	)]
	pub async fn provision(
		&self,
		request: &DeploymentRequest,
	) -> Result<ProvisioningReport, ProvisionerError> {
		let run = self.apply_resources(request).await?;

		self.sink.emit(&ProgressEvent::WaitingForReadiness {
			namespace: request.namespace.clone(),
			name: request.deployment_name.clone(),
		});
		let readiness = self
			.poller
			.wait(
				self.client.as_ref(),
				&request.namespace,
				&request.deployment_name,
			)
			.await;
		match readiness {
			Readiness::Ready { attempts } => {
				self.sink.emit(&ProgressEvent::DeploymentReady { attempts });
			}
			Readiness::TimedOut { attempts } => {
				self.sink.emit(&ProgressEvent::ReadinessTimedOut { attempts });
			}
		}

		let url = deployment_url(request);
		tracing::info!(url = %url, ready = readiness.is_ready(), "Provisioning finished");
		self.sink.emit(&ProgressEvent::EnvironmentReady { url: url.clone() });

		Ok(ProvisioningReport {
			run,
			readiness,
			url,
		})
	}

	/// Run the seven creation steps without waiting for readiness.
	pub async fn apply_resources(
		&self,
		request: &DeploymentRequest,
	) -> Result<ProvisioningRun, ProvisionerError> {
		let specs = ResourceSpecs::build(request);
		let namespace = request.namespace.as_str();
		let name = request.deployment_name.as_str();
		let mut run = ProvisioningRun::default();

		tracing::info!(
			namespace,
			deployment = name,
			selector = %specs.selector_label,
			"Provisioning resources"
		);

		let outcome = self.client.create_namespace(specs.namespace).await;
		self.settle(&mut run, Step::Namespace, namespace, outcome)?;

		let outcome = self
			.client
			.create_persistent_volume_claim(namespace, specs.pvc)
			.await;
		self.settle(
			&mut run,
			Step::PersistentVolumeClaim,
			crate::specs::PVC_NAME,
			outcome,
		)?;

		let outcome = self
			.client
			.create_secret(namespace, specs.database_secret)
			.await;
		self.settle(
			&mut run,
			Step::DatabaseSecret,
			crate::specs::DB_SECRET_NAME,
			outcome,
		)?;

		match specs.registry_secret {
			Some(secret) => {
				let outcome = self.client.create_secret(namespace, secret).await;
				self.settle(
					&mut run,
					Step::RegistrySecret,
					crate::specs::REGISTRY_SECRET_NAME,
					outcome,
				)?;
			}
			None => {
				tracing::debug!(namespace, "Registry credentials incomplete, skipping pull secret");
				run.record(
					Step::RegistrySecret,
					crate::specs::REGISTRY_SECRET_NAME,
					StepOutcome::Skipped(NO_REGISTRY_CREDENTIALS.to_string()),
				);
				self.sink.emit(&ProgressEvent::StepSkipped {
					step: Step::RegistrySecret,
					reason: NO_REGISTRY_CREDENTIALS.to_string(),
				});
			}
		}

		let outcome = self
			.client
			.create_deployment(namespace, specs.deployment)
			.await;
		self.settle(&mut run, Step::Deployment, name, outcome)?;

		// The service follows whatever selector the stored deployment carries,
		// which differs from ours when the deployment already existed.
		let live = match self.client.get_deployment(namespace, name).await {
			Ok(deployment) => deployment,
			Err(e) => return Err(self.fail(&mut run, Step::Service, name, e)),
		};
		let Some(selector) = DeploymentStatus::from_deployment(&live).selector_label else {
			let cause = "live deployment has no app selector label".to_string();
			tracing::error!(namespace, deployment = name, "{cause}");
			run.record(Step::Service, name, StepOutcome::Fatal(cause.clone()));
			run.abort();
			self.sink.emit(&ProgressEvent::StepFailed {
				step: Step::Service,
				cause,
			});
			return Err(ProvisionerError::MissingSelector {
				namespace: namespace.to_string(),
				name: name.to_string(),
				run: Box::new(run),
			});
		};
		if selector != specs.selector_label {
			tracing::info!(
				namespace,
				deployment = name,
				live = %selector,
				built = %specs.selector_label,
				"Service follows the selector of the existing deployment"
			);
		}
		let outcome = self
			.client
			.create_service(namespace, build_service(request, &selector))
			.await;
		self.settle(&mut run, Step::Service, name, outcome)?;

		let outcome = self.client.create_ingress(namespace, specs.ingress).await;
		self.settle(&mut run, Step::Ingress, name, outcome)?;

		run.complete();
		tracing::info!(
			namespace,
			created = run.created_resources().len(),
			"All resources applied"
		);
		Ok(run)
	}

	/// Record the result of one create call, or abort the run on error.
	fn settle(
		&self,
		run: &mut ProvisioningRun,
		step: Step,
		resource_name: &str,
		outcome: Result<CreateOutcome, K8sError>,
	) -> Result<(), ProvisionerError> {
		match outcome {
			Ok(CreateOutcome::Created { name }) => {
				tracing::info!(step = %step, name = %name, "Created");
				self.sink.emit(&ProgressEvent::StepCreated {
					step,
					name: name.clone(),
				});
				run.record(step, resource_name, StepOutcome::Created(name));
				Ok(())
			}
			Ok(CreateOutcome::Conflict) => {
				tracing::info!(step = %step, name = resource_name, "Already exists, leaving it untouched");
				self.sink.emit(&ProgressEvent::StepAlreadyExists { step });
				run.record(step, resource_name, StepOutcome::AlreadyExists);
				Ok(())
			}
			Err(e) => Err(self.fail(run, step, resource_name, e)),
		}
	}

	fn fail(
		&self,
		run: &mut ProvisioningRun,
		step: Step,
		resource_name: &str,
		source: K8sError,
	) -> ProvisionerError {
		tracing::error!(step = %step, name = resource_name, error = %source, "Provisioning aborted");
		self.sink.emit(&ProgressEvent::StepFailed {
			step,
			cause: source.to_string(),
		});
		run.record(step, resource_name, StepOutcome::Fatal(source.to_string()));
		run.abort();
		ProvisionerError::StepFailed {
			step,
			source,
			run: Box::new(std::mem::take(run)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeMap;
	use std::time::Duration;

	use kade_k8s::{
		Deployment, DeploymentSpec, LabelSelector, MockCall, MockClusterClient, ObjectMeta,
		ResourceKind, APP_LABEL,
	};

	use crate::config::ReadinessConfig;
	use crate::events::CollectingSink;
	use crate::readiness::tests::RecordingClock;
	use crate::specs::tests::{sample_request, with_registry};
	use crate::types::RunState;

	struct Harness {
		mock: MockClusterClient,
		sink: Arc<CollectingSink>,
		clock: Arc<RecordingClock>,
		provisioner: Provisioner,
	}

	fn harness() -> Harness {
		let mock = MockClusterClient::new();
		let sink = Arc::new(CollectingSink::new());
		let clock = Arc::new(RecordingClock::default());
		let provisioner = Provisioner::new(Arc::new(mock.clone()), sink.clone()).with_poller(
			ReadinessPoller::new(ReadinessConfig::default(), clock.clone()),
		);
		Harness {
			mock,
			sink,
			clock,
			provisioner,
		}
	}

	fn outcomes(run: &ProvisioningRun) -> Vec<(Step, StepOutcome)> {
		run
			.steps()
			.iter()
			.map(|r| (r.step, r.outcome.clone()))
			.collect()
	}

	fn service_selector(mock: &MockClusterClient, namespace: &str, name: &str) -> Option<String> {
		mock
			.service(namespace, name)
			.and_then(|s| s.spec)
			.and_then(|s| s.selector)
			.and_then(|s| s.get(APP_LABEL).cloned())
	}

	#[tokio::test]
	async fn test_creates_all_resources_in_order() {
		let h = harness();
		h.mock.script_ready_replicas([1]);

		let report = h
			.provisioner
			.provision(&with_registry(sample_request()))
			.await
			.unwrap();

		assert_eq!(report.run.state(), RunState::Completed);
		assert_eq!(report.readiness, Readiness::Ready { attempts: 1 });
		assert_eq!(report.url, "http://app.example.com");
		assert_eq!(
			h.mock.create_order(),
			vec![
				ResourceKind::Namespace,
				ResourceKind::PersistentVolumeClaim,
				ResourceKind::Secret,
				ResourceKind::Secret,
				ResourceKind::Deployment,
				ResourceKind::Service,
				ResourceKind::Ingress,
			]
		);
		assert_eq!(
			report.run.steps().iter().map(|r| r.step).collect::<Vec<_>>(),
			Step::ORDER.to_vec()
		);
		assert_eq!(
			report.run.created_resources(),
			vec![
				"proj1",
				"wp-uploads",
				"wp-db-password",
				"wp-registry-auth",
				"wordpress",
				"wordpress",
				"wordpress",
			]
		);
		assert_eq!(h.mock.object_count(), 7);
	}

	#[tokio::test]
	async fn test_service_selector_matches_deployment() {
		let h = harness();
		h.mock.script_ready_replicas([1]);

		h.provisioner.provision(&sample_request()).await.unwrap();

		let deployment_label = h
			.mock
			.deployment("proj1", "wordpress")
			.and_then(|d| d.spec)
			.and_then(|s| s.selector.match_labels)
			.and_then(|l| l.get(APP_LABEL).cloned());
		assert!(deployment_label.is_some());
		assert_eq!(service_selector(&h.mock, "proj1", "wordpress"), deployment_label);
	}

	#[tokio::test]
	async fn test_second_run_changes_nothing() {
		let h = harness();
		h.mock.script_ready_replicas([1]);
		let request = with_registry(sample_request());

		h.provisioner.provision(&request).await.unwrap();
		let count = h.mock.object_count();
		let first_selector = service_selector(&h.mock, "proj1", "wordpress");

		let report = h.provisioner.provision(&request).await.unwrap();

		assert_eq!(h.mock.object_count(), count);
		assert_eq!(report.run.state(), RunState::Completed);
		assert!(report.run.created_resources().is_empty());
		for record in report.run.steps() {
			assert_eq!(record.outcome, StepOutcome::AlreadyExists, "{}", record.step);
		}
		assert_eq!(report.run.steps().len(), 7);
		assert_eq!(service_selector(&h.mock, "proj1", "wordpress"), first_selector);
	}

	#[tokio::test]
	async fn test_second_run_without_registry_skips_registry_step() {
		let h = harness();
		h.mock.script_ready_replicas([1]);

		h.provisioner.provision(&sample_request()).await.unwrap();
		let report = h.provisioner.provision(&sample_request()).await.unwrap();

		for (step, outcome) in outcomes(&report.run) {
			match step {
				Step::RegistrySecret => assert!(matches!(outcome, StepOutcome::Skipped(_))),
				_ => assert_eq!(outcome, StepOutcome::AlreadyExists),
			}
		}
	}

	#[tokio::test]
	async fn test_empty_registry_fields_skip_registry_secret() {
		let h = harness();
		h.mock.script_ready_replicas([1]);

		let report = h.provisioner.provision(&sample_request()).await.unwrap();

		assert_eq!(
			report.run.outcome(Step::RegistrySecret),
			Some(&StepOutcome::Skipped(NO_REGISTRY_CREDENTIALS.to_string()))
		);
		assert!(h.mock.secret("proj1", "wp-registry-auth").is_none());
		assert!(h.sink.events().contains(&ProgressEvent::StepSkipped {
			step: Step::RegistrySecret,
			reason: NO_REGISTRY_CREDENTIALS.to_string(),
		}));

		let pull_secrets = h
			.mock
			.deployment("proj1", "wordpress")
			.and_then(|d| d.spec)
			.and_then(|s| s.template.spec)
			.and_then(|s| s.image_pull_secrets)
			.unwrap_or_default();
		assert!(pull_secrets.is_empty());
	}

	#[tokio::test]
	async fn test_existing_namespace_continues() {
		let h = harness();
		h.mock.seed_namespace("proj1");
		h.mock.script_ready_replicas([1]);

		let report = h.provisioner.provision(&sample_request()).await.unwrap();

		assert_eq!(
			report.run.outcome(Step::Namespace),
			Some(&StepOutcome::AlreadyExists)
		);
		for step in [
			Step::PersistentVolumeClaim,
			Step::DatabaseSecret,
			Step::Deployment,
			Step::Service,
			Step::Ingress,
		] {
			assert!(
				matches!(report.run.outcome(step), Some(StepOutcome::Created(_))),
				"{step}"
			);
		}
		assert_eq!(
			h.sink.events().first(),
			Some(&ProgressEvent::StepAlreadyExists {
				step: Step::Namespace
			})
		);
	}

	#[tokio::test]
	async fn test_tls_request_reports_https_url() {
		let h = harness();
		h.mock.script_ready_replicas([1]);
		let mut request = sample_request();
		request.tls = true;

		let report = h.provisioner.provision(&request).await.unwrap();

		assert_eq!(report.url, "https://app.example.com");
		let tls = h
			.mock
			.ingress("proj1", "wordpress")
			.and_then(|i| i.spec)
			.and_then(|s| s.tls)
			.unwrap();
		assert_eq!(tls[0].secret_name.as_deref(), Some("proj1-tls"));
		assert_eq!(
			h.sink.events().last(),
			Some(&ProgressEvent::EnvironmentReady {
				url: "https://app.example.com".into()
			})
		);
	}

	#[tokio::test]
	async fn test_pvc_failure_aborts_run() {
		let h = harness();
		h.mock
			.fail_creates_of(ResourceKind::PersistentVolumeClaim, "storage class missing");

		let err = h.provisioner.provision(&sample_request()).await.unwrap_err();

		assert_eq!(err.step(), Step::PersistentVolumeClaim);
		assert!(matches!(
			err,
			ProvisionerError::StepFailed {
				source: K8sError::ApiError { code: 500, .. },
				..
			}
		));
		assert_eq!(err.run().state(), RunState::Aborted);
		assert_eq!(err.run().steps().len(), 2);
		assert!(matches!(
			err.run().outcome(Step::PersistentVolumeClaim),
			Some(StepOutcome::Fatal(_))
		));

		assert!(h.mock.has_namespace("proj1"));
		assert_eq!(
			h.mock.create_order(),
			vec![ResourceKind::Namespace, ResourceKind::PersistentVolumeClaim]
		);
		assert!(!h
			.mock
			.calls()
			.iter()
			.any(|c| matches!(c, MockCall::GetDeployment { .. })));
		assert!(matches!(
			h.sink.events().last(),
			Some(ProgressEvent::StepFailed {
				step: Step::PersistentVolumeClaim,
				..
			})
		));
	}

	#[tokio::test]
	async fn test_readiness_timeout_still_reports_url() {
		let h = harness();
		h.mock.script_ready_replicas([0]);

		let report = h.provisioner.provision(&sample_request()).await.unwrap();

		assert_eq!(report.readiness, Readiness::TimedOut { attempts: 11 });
		assert_eq!(report.url, "http://app.example.com");
		assert_eq!(report.run.state(), RunState::Completed);
		assert_eq!(h.clock.sleeps(), vec![Duration::from_secs(5); 10]);

		let events = h.sink.events();
		assert!(events.contains(&ProgressEvent::ReadinessTimedOut { attempts: 11 }));
		assert_eq!(
			events.last(),
			Some(&ProgressEvent::EnvironmentReady {
				url: "http://app.example.com".into()
			})
		);
	}

	#[tokio::test]
	async fn test_service_uses_live_deployment_selector() {
		let h = harness();
		h.mock.script_ready_replicas([1]);
		h.mock.put_deployment(
			"proj1",
			Deployment {
				metadata: ObjectMeta {
					name: Some("wordpress".into()),
					..Default::default()
				},
				spec: Some(DeploymentSpec {
					replicas: Some(1),
					selector: LabelSelector {
						match_labels: Some(BTreeMap::from([(
							APP_LABEL.to_string(),
							"deployment-proj1-wordpress-legacy".to_string(),
						)])),
						..Default::default()
					},
					..Default::default()
				}),
				..Default::default()
			},
		);

		let report = h.provisioner.provision(&sample_request()).await.unwrap();

		assert_eq!(
			report.run.outcome(Step::Deployment),
			Some(&StepOutcome::AlreadyExists)
		);
		assert_eq!(
			service_selector(&h.mock, "proj1", "wordpress").as_deref(),
			Some("deployment-proj1-wordpress-legacy")
		);
	}

	#[tokio::test]
	async fn test_deployment_without_selector_aborts_at_service() {
		let h = harness();
		h.mock.put_deployment(
			"proj1",
			Deployment {
				metadata: ObjectMeta {
					name: Some("wordpress".into()),
					..Default::default()
				},
				..Default::default()
			},
		);

		let err = h.provisioner.provision(&sample_request()).await.unwrap_err();

		assert!(matches!(err, ProvisionerError::MissingSelector { .. }));
		assert_eq!(err.step(), Step::Service);
		assert_eq!(err.run().state(), RunState::Aborted);
		assert!(h.mock.service("proj1", "wordpress").is_none());
		assert!(!h.mock.create_order().contains(&ResourceKind::Ingress));
	}

	#[tokio::test]
	async fn test_failed_deployment_read_aborts_at_service() {
		let h = harness();
		h.mock.fail_get_deployment("etcd unavailable");

		let err = h.provisioner.provision(&sample_request()).await.unwrap_err();

		assert_eq!(err.step(), Step::Service);
		assert!(matches!(err, ProvisionerError::StepFailed { .. }));
		assert_eq!(
			h.mock.create_order().last(),
			Some(&ResourceKind::Deployment)
		);
	}

	#[tokio::test]
	async fn test_apply_resources_does_not_poll() {
		let h = harness();

		let run = h
			.provisioner
			.apply_resources(&sample_request())
			.await
			.unwrap();

		assert_eq!(run.state(), RunState::Completed);
		// one read for the service selector, none for readiness
		let reads = h
			.mock
			.calls()
			.iter()
			.filter(|c| matches!(c, MockCall::GetDeployment { .. }))
			.count();
		assert_eq!(reads, 1);
		assert!(h.clock.sleeps().is_empty());
	}
}
