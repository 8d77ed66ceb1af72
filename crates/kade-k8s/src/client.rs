// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::error::K8sError;
use crate::types::{
	CreateOutcome, Deployment, Ingress, Namespace, PersistentVolumeClaim, Secret, Service,
};

/// Trait for the cluster operations the provisioner needs.
///
/// Every create returns a typed [`CreateOutcome`]: `Created` with the stored
/// name, or `Conflict` when an object of that name already exists. Any other
/// failure is an `Err`. Implementations never update an existing object.
#[async_trait]
pub trait ClusterClient: Send + Sync {
	/// Create a cluster-scoped namespace.
	async fn create_namespace(&self, namespace: Namespace) -> Result<CreateOutcome, K8sError>;

	/// Create a persistent volume claim in the given namespace.
	async fn create_persistent_volume_claim(
		&self,
		namespace: &str,
		pvc: PersistentVolumeClaim,
	) -> Result<CreateOutcome, K8sError>;

	/// Create a secret in the given namespace.
	async fn create_secret(&self, namespace: &str, secret: Secret)
		-> Result<CreateOutcome, K8sError>;

	/// Create a deployment in the given namespace.
	async fn create_deployment(
		&self,
		namespace: &str,
		deployment: Deployment,
	) -> Result<CreateOutcome, K8sError>;

	/// Read the live deployment, including its status.
	async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, K8sError>;

	/// Create a service in the given namespace.
	async fn create_service(&self, namespace: &str, service: Service)
		-> Result<CreateOutcome, K8sError>;

	/// Create an ingress in the given namespace.
	async fn create_ingress(&self, namespace: &str, ingress: Ingress)
		-> Result<CreateOutcome, K8sError>;
}
