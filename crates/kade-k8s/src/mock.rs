// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::client::ClusterClient;
use crate::error::K8sError;
use crate::types::{
	CreateOutcome, Deployment, Ingress, Namespace, PersistentVolumeClaim, Secret, Service,
};

/// Kinds of objects the provisioner creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
	Namespace,
	PersistentVolumeClaim,
	Secret,
	Deployment,
	Service,
	Ingress,
}

/// A call observed by [`MockClusterClient`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
	Create {
		kind: ResourceKind,
		namespace: String,
		name: String,
	},
	GetDeployment {
		namespace: String,
		name: String,
	},
}

#[derive(Debug, Clone)]
enum Stored {
	Namespace(Namespace),
	PersistentVolumeClaim(PersistentVolumeClaim),
	Secret(Secret),
	Deployment(Deployment),
	Service(Service),
	Ingress(Ingress),
}

type Key = (ResourceKind, String, String);

#[derive(Debug, Default)]
struct MockState {
	objects: BTreeMap<Key, Stored>,
	create_failures: HashMap<ResourceKind, String>,
	get_failure: Option<String>,
	ready_replicas: VecDeque<i32>,
	calls: Vec<MockCall>,
}

/// An in-memory cluster for tests.
///
/// Creates store the object and answer `Conflict` when the name is taken,
/// like the API server does. Failures and readiness progress can be scripted,
/// and every call is recorded so tests can assert ordering.
#[derive(Debug, Clone, Default)]
pub struct MockClusterClient {
	state: Arc<Mutex<MockState>>,
}

impl MockClusterClient {
	/// Create an empty mock cluster.
	pub fn new() -> Self {
		Self::default()
	}

	fn state(&self) -> MutexGuard<'_, MockState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Make every create of `kind` fail with an API error carrying `message`.
	pub fn fail_creates_of(&self, kind: ResourceKind, message: impl Into<String>) {
		self.state().create_failures.insert(kind, message.into());
	}

	/// Make every `get_deployment` call fail.
	pub fn fail_get_deployment(&self, message: impl Into<String>) {
		self.state().get_failure = Some(message.into());
	}

	/// Script the ready replica count reported by successive `get_deployment`
	/// calls. The last value sticks once the script runs out.
	pub fn script_ready_replicas(&self, counts: impl IntoIterator<Item = i32>) {
		self.state().ready_replicas = counts.into_iter().collect();
	}

	/// Pretend a namespace already exists.
	pub fn seed_namespace(&self, name: &str) {
		let namespace = Namespace {
			metadata: crate::types::ObjectMeta {
				name: Some(name.to_string()),
				..Default::default()
			},
			..Default::default()
		};
		self.state().objects.insert(
			(ResourceKind::Namespace, String::new(), name.to_string()),
			Stored::Namespace(namespace),
		);
	}

	/// Store or overwrite a deployment, as an external actor would.
	pub fn put_deployment(&self, namespace: &str, deployment: Deployment) {
		let name = deployment.metadata.name.clone().unwrap_or_default();
		self.state().objects.insert(
			(ResourceKind::Deployment, namespace.to_string(), name),
			Stored::Deployment(deployment),
		);
	}

	/// All calls received so far.
	pub fn calls(&self) -> Vec<MockCall> {
		self.state().calls.clone()
	}

	/// Kinds of the create calls received so far, in order.
	pub fn create_order(&self) -> Vec<ResourceKind> {
		self
			.state()
			.calls
			.iter()
			.filter_map(|call| match call {
				MockCall::Create { kind, .. } => Some(*kind),
				MockCall::GetDeployment { .. } => None,
			})
			.collect()
	}

	/// Number of stored objects.
	pub fn object_count(&self) -> usize {
		self.state().objects.len()
	}

	pub fn has_namespace(&self, name: &str) -> bool {
		self
			.state()
			.objects
			.contains_key(&(ResourceKind::Namespace, String::new(), name.to_string()))
	}

	pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
		match self.get(ResourceKind::Secret, namespace, name)? {
			Stored::Secret(secret) => Some(secret),
			_ => None,
		}
	}

	pub fn persistent_volume_claim(&self, namespace: &str, name: &str) -> Option<PersistentVolumeClaim> {
		match self.get(ResourceKind::PersistentVolumeClaim, namespace, name)? {
			Stored::PersistentVolumeClaim(pvc) => Some(pvc),
			_ => None,
		}
	}

	pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
		match self.get(ResourceKind::Deployment, namespace, name)? {
			Stored::Deployment(deployment) => Some(deployment),
			_ => None,
		}
	}

	pub fn service(&self, namespace: &str, name: &str) -> Option<Service> {
		match self.get(ResourceKind::Service, namespace, name)? {
			Stored::Service(service) => Some(service),
			_ => None,
		}
	}

	pub fn ingress(&self, namespace: &str, name: &str) -> Option<Ingress> {
		match self.get(ResourceKind::Ingress, namespace, name)? {
			Stored::Ingress(ingress) => Some(ingress),
			_ => None,
		}
	}

	fn get(&self, kind: ResourceKind, namespace: &str, name: &str) -> Option<Stored> {
		self
			.state()
			.objects
			.get(&(kind, namespace.to_string(), name.to_string()))
			.cloned()
	}

	fn create(
		&self,
		kind: ResourceKind,
		namespace: &str,
		name: Option<String>,
		object: Stored,
	) -> Result<CreateOutcome, K8sError> {
		let name = name.unwrap_or_default();
		let mut state = self.state();
		state.calls.push(MockCall::Create {
			kind,
			namespace: namespace.to_string(),
			name: name.clone(),
		});

		if let Some(message) = state.create_failures.get(&kind) {
			return Err(K8sError::ApiError {
				code: 500,
				message: message.clone(),
			});
		}

		let key = (kind, namespace.to_string(), name.clone());
		if state.objects.contains_key(&key) {
			return Ok(CreateOutcome::Conflict);
		}
		state.objects.insert(key, object);
		Ok(CreateOutcome::Created { name })
	}
}

#[async_trait]
impl ClusterClient for MockClusterClient {
	async fn create_namespace(&self, namespace: Namespace) -> Result<CreateOutcome, K8sError> {
		let name = namespace.metadata.name.clone();
		self.create(ResourceKind::Namespace, "", name, Stored::Namespace(namespace))
	}

	async fn create_persistent_volume_claim(
		&self,
		namespace: &str,
		pvc: PersistentVolumeClaim,
	) -> Result<CreateOutcome, K8sError> {
		let name = pvc.metadata.name.clone();
		self.create(
			ResourceKind::PersistentVolumeClaim,
			namespace,
			name,
			Stored::PersistentVolumeClaim(pvc),
		)
	}

	async fn create_secret(
		&self,
		namespace: &str,
		secret: Secret,
	) -> Result<CreateOutcome, K8sError> {
		let name = secret.metadata.name.clone();
		self.create(ResourceKind::Secret, namespace, name, Stored::Secret(secret))
	}

	async fn create_deployment(
		&self,
		namespace: &str,
		deployment: Deployment,
	) -> Result<CreateOutcome, K8sError> {
		let name = deployment.metadata.name.clone();
		self.create(
			ResourceKind::Deployment,
			namespace,
			name,
			Stored::Deployment(deployment),
		)
	}

	async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, K8sError> {
		let mut state = self.state();
		state.calls.push(MockCall::GetDeployment {
			namespace: namespace.to_string(),
			name: name.to_string(),
		});

		if let Some(message) = &state.get_failure {
			return Err(K8sError::ApiError {
				code: 500,
				message: message.clone(),
			});
		}

		let ready = if state.ready_replicas.len() > 1 {
			state.ready_replicas.pop_front()
		} else {
			state.ready_replicas.front().copied()
		};

		let key = (ResourceKind::Deployment, namespace.to_string(), name.to_string());
		let Some(Stored::Deployment(mut deployment)) = state.objects.get(&key).cloned() else {
			return Err(K8sError::DeploymentNotFound {
				namespace: namespace.to_string(),
				name: name.to_string(),
			});
		};

		if let Some(ready) = ready {
			let status = deployment.status.get_or_insert_with(Default::default);
			status.ready_replicas = Some(ready);
		}
		Ok(deployment)
	}

	async fn create_service(
		&self,
		namespace: &str,
		service: Service,
	) -> Result<CreateOutcome, K8sError> {
		let name = service.metadata.name.clone();
		self.create(ResourceKind::Service, namespace, name, Stored::Service(service))
	}

	async fn create_ingress(
		&self,
		namespace: &str,
		ingress: Ingress,
	) -> Result<CreateOutcome, K8sError> {
		let name = ingress.metadata.name.clone();
		self.create(ResourceKind::Ingress, namespace, name, Stored::Ingress(ingress))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::{DeploymentStatus, ObjectMeta};

	fn named_namespace(name: &str) -> Namespace {
		Namespace {
			metadata: ObjectMeta {
				name: Some(name.into()),
				..Default::default()
			},
			..Default::default()
		}
	}

	fn named_deployment(name: &str) -> Deployment {
		Deployment {
			metadata: ObjectMeta {
				name: Some(name.into()),
				..Default::default()
			},
			..Default::default()
		}
	}

	#[tokio::test]
	async fn second_create_conflicts() {
		let mock = MockClusterClient::new();

		let first = mock.create_namespace(named_namespace("proj1")).await.unwrap();
		let second = mock.create_namespace(named_namespace("proj1")).await.unwrap();

		assert_eq!(first, CreateOutcome::Created { name: "proj1".into() });
		assert_eq!(second, CreateOutcome::Conflict);
		assert_eq!(mock.object_count(), 1);
	}

	#[tokio::test]
	async fn seeded_namespace_conflicts() {
		let mock = MockClusterClient::new();
		mock.seed_namespace("proj1");

		let outcome = mock.create_namespace(named_namespace("proj1")).await.unwrap();
		assert_eq!(outcome, CreateOutcome::Conflict);
	}

	#[tokio::test]
	async fn scripted_failure_is_an_error() {
		let mock = MockClusterClient::new();
		mock.fail_creates_of(ResourceKind::Secret, "quota exceeded");

		let err = mock
			.create_secret("proj1", Secret::default())
			.await
			.unwrap_err();
		assert!(matches!(err, K8sError::ApiError { code: 500, .. }));
		assert_eq!(mock.object_count(), 0);
	}

	#[tokio::test]
	async fn get_missing_deployment_is_not_found() {
		let mock = MockClusterClient::new();
		let err = mock.get_deployment("proj1", "wordpress").await.unwrap_err();
		assert!(matches!(err, K8sError::DeploymentNotFound { .. }));
	}

	#[tokio::test]
	async fn ready_replicas_follow_script() {
		let mock = MockClusterClient::new();
		mock
			.create_deployment("proj1", named_deployment("wordpress"))
			.await
			.unwrap();
		mock.script_ready_replicas([0, 1]);

		let first = mock.get_deployment("proj1", "wordpress").await.unwrap();
		let second = mock.get_deployment("proj1", "wordpress").await.unwrap();
		let third = mock.get_deployment("proj1", "wordpress").await.unwrap();

		assert_eq!(DeploymentStatus::from_deployment(&first).ready_replicas, 0);
		assert_eq!(DeploymentStatus::from_deployment(&second).ready_replicas, 1);
		assert_eq!(DeploymentStatus::from_deployment(&third).ready_replicas, 1);
	}

	#[tokio::test]
	async fn calls_are_recorded_in_order() {
		let mock = MockClusterClient::new();
		mock.create_namespace(named_namespace("proj1")).await.unwrap();
		mock
			.create_deployment("proj1", named_deployment("wordpress"))
			.await
			.unwrap();
		mock.get_deployment("proj1", "wordpress").await.unwrap();

		assert_eq!(
			mock.create_order(),
			vec![ResourceKind::Namespace, ResourceKind::Deployment]
		);
		assert_eq!(
			mock.calls().last(),
			Some(&MockCall::GetDeployment {
				namespace: "proj1".into(),
				name: "wordpress".into(),
			})
		);
	}
}
