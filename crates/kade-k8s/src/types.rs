// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

pub use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
pub use k8s_openapi::api::core::v1::{
	Container, ContainerPort, EnvVar, EnvVarSource, LocalObjectReference, Namespace,
	PersistentVolumeClaim, PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource, PodSpec,
	PodTemplateSpec, Secret, SecretKeySelector, Service, ServicePort, ServiceSpec, Volume,
	VolumeMount, VolumeResourceRequirements,
};
pub use k8s_openapi::api::networking::v1::{
	HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
	IngressServiceBackend, IngressSpec, IngressTLS, ServiceBackendPort,
};
pub use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
pub use k8s_openapi::ByteString;

/// Label key that ties a deployment's pods to its service.
pub const APP_LABEL: &str = "app";

/// Result of a create call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
	/// The object was stored under `name`.
	Created { name: String },
	/// An object with the same name already exists; nothing was changed.
	Conflict,
}

/// The parts of a live deployment the provisioner cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentStatus {
	pub desired_replicas: i32,
	pub ready_replicas: i32,
	/// Value of the `app` selector label, if the deployment has one.
	pub selector_label: Option<String>,
}

impl DeploymentStatus {
	pub fn from_deployment(deployment: &Deployment) -> Self {
		let spec = deployment.spec.as_ref();
		Self {
			// the API server defaults an unset replica count to 1
			desired_replicas: spec.and_then(|s| s.replicas).unwrap_or(1),
			ready_replicas: deployment
				.status
				.as_ref()
				.and_then(|s| s.ready_replicas)
				.unwrap_or(0),
			selector_label: spec
				.and_then(|s| s.selector.match_labels.as_ref())
				.and_then(|labels| labels.get(APP_LABEL))
				.cloned(),
		}
	}

	/// Whether the observed ready replicas meet the desired count.
	pub fn is_ready(&self) -> bool {
		self.ready_replicas >= self.desired_replicas
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeMap;

	fn deployment(replicas: Option<i32>, ready: Option<i32>, label: Option<&str>) -> Deployment {
		Deployment {
			spec: Some(DeploymentSpec {
				replicas,
				selector: LabelSelector {
					match_labels: label.map(|l| BTreeMap::from([(APP_LABEL.to_string(), l.to_string())])),
					..Default::default()
				},
				..Default::default()
			}),
			status: Some(k8s_openapi::api::apps::v1::DeploymentStatus {
				ready_replicas: ready,
				..Default::default()
			}),
			..Default::default()
		}
	}

	#[test]
	fn status_reads_replicas_and_selector() {
		let status = DeploymentStatus::from_deployment(&deployment(Some(2), Some(1), Some("web")));
		assert_eq!(status.desired_replicas, 2);
		assert_eq!(status.ready_replicas, 1);
		assert_eq!(status.selector_label.as_deref(), Some("web"));
		assert!(!status.is_ready());
	}

	#[test]
	fn unset_counts_use_api_defaults() {
		let status = DeploymentStatus::from_deployment(&deployment(None, None, None));
		assert_eq!(status.desired_replicas, 1);
		assert_eq!(status.ready_replicas, 0);
		assert!(status.selector_label.is_none());
		assert!(!status.is_ready());
	}

	#[test]
	fn ready_when_counts_match() {
		let status = DeploymentStatus::from_deployment(&deployment(Some(1), Some(1), Some("web")));
		assert!(status.is_ready());
	}

	#[test]
	fn missing_status_block_is_not_ready() {
		let mut d = deployment(Some(1), None, Some("web"));
		d.status = None;
		assert!(!DeploymentStatus::from_deployment(&d).is_ready());
	}
}
