// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::Path;

use async_trait::async_trait;
use kube::{
	api::{Api, ListParams, PostParams},
	config::{KubeConfigOptions, Kubeconfig},
	Client, Config, Resource, ResourceExt,
};
use tracing::{debug, instrument};

use crate::client::ClusterClient;
use crate::error::K8sError;
use crate::types::{
	CreateOutcome, Deployment, Ingress, Namespace, PersistentVolumeClaim, Secret, Service,
};

/// Production cluster client implementation using the kube crate.
pub struct KubeClient {
	client: Client,
	cluster_name: Option<String>,
}

impl KubeClient {
	/// Connect using a kubeconfig file.
	///
	/// With no explicit path this follows the usual discovery: the
	/// `KUBECONFIG` environment variable, then `~/.kube/config`.
	pub async fn connect(kubeconfig: Option<&Path>) -> Result<Self, K8sError> {
		let kubeconfig = match kubeconfig {
			Some(path) => Kubeconfig::read_from(path)?,
			None => Kubeconfig::read()?,
		};
		let cluster_name = current_cluster_name(&kubeconfig);

		let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
		let client = Client::try_from(config)?;
		debug!(cluster = ?cluster_name, "K8s client initialized");

		Ok(Self {
			client,
			cluster_name,
		})
	}

	/// Wrap an already configured kube client.
	pub fn from_client(client: Client) -> Self {
		Self {
			client,
			cluster_name: None,
		}
	}

	/// Cluster name of the kubeconfig's current context, if known.
	pub fn cluster_name(&self) -> Option<&str> {
		self.cluster_name.as_deref()
	}

	/// Check that the API server answers and our credentials are accepted.
	pub async fn probe(&self) -> Result<(), K8sError> {
		let namespaces: Api<Namespace> = Api::all(self.client.clone());
		namespaces.list(&ListParams::default().limit(1)).await?;
		Ok(())
	}
}

fn current_cluster_name(kubeconfig: &Kubeconfig) -> Option<String> {
	let current = kubeconfig.current_context.as_deref()?;
	kubeconfig
		.contexts
		.iter()
		.find(|named| named.name == current)
		.and_then(|named| named.context.as_ref())
		.map(|ctx| ctx.cluster.clone())
}

/// Map a create result onto [`CreateOutcome`], treating HTTP 409 as a conflict.
fn classify<K: Resource>(result: Result<K, kube::Error>) -> Result<CreateOutcome, K8sError> {
	match result {
		Ok(created) => Ok(CreateOutcome::Created {
			name: created.name_any(),
		}),
		Err(kube::Error::Api(err)) if err.code == 409 => {
			debug!(reason = %err.reason, "object already exists");
			Ok(CreateOutcome::Conflict)
		}
		Err(e) => Err(e.into()),
	}
}

#[async_trait]
impl ClusterClient for KubeClient {
	#[instrument(skip_all, fields(name = ?namespace.metadata.name))]
	async fn create_namespace(&self, namespace: Namespace) -> Result<CreateOutcome, K8sError> {
		let namespaces: Api<Namespace> = Api::all(self.client.clone());
		classify(namespaces.create(&PostParams::default(), &namespace).await)
	}

	#[instrument(skip(self, pvc), fields(name = ?pvc.metadata.name))]
	async fn create_persistent_volume_claim(
		&self,
		namespace: &str,
		pvc: PersistentVolumeClaim,
	) -> Result<CreateOutcome, K8sError> {
		let claims: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
		classify(claims.create(&PostParams::default(), &pvc).await)
	}

	#[instrument(skip(self, secret), fields(name = ?secret.metadata.name))]
	async fn create_secret(
		&self,
		namespace: &str,
		secret: Secret,
	) -> Result<CreateOutcome, K8sError> {
		let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
		classify(secrets.create(&PostParams::default(), &secret).await)
	}

	#[instrument(skip(self, deployment), fields(name = ?deployment.metadata.name))]
	async fn create_deployment(
		&self,
		namespace: &str,
		deployment: Deployment,
	) -> Result<CreateOutcome, K8sError> {
		let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
		classify(deployments.create(&PostParams::default(), &deployment).await)
	}

	async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, K8sError> {
		let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
		match deployments.get(name).await {
			Ok(deployment) => Ok(deployment),
			Err(kube::Error::Api(err)) if err.code == 404 => Err(K8sError::DeploymentNotFound {
				namespace: namespace.into(),
				name: name.into(),
			}),
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self, service), fields(name = ?service.metadata.name))]
	async fn create_service(
		&self,
		namespace: &str,
		service: Service,
	) -> Result<CreateOutcome, K8sError> {
		let services: Api<Service> = Api::namespaced(self.client.clone(), namespace);
		classify(services.create(&PostParams::default(), &service).await)
	}

	#[instrument(skip(self, ingress), fields(name = ?ingress.metadata.name))]
	async fn create_ingress(
		&self,
		namespace: &str,
		ingress: Ingress,
	) -> Result<CreateOutcome, K8sError> {
		let ingresses: Api<Ingress> = Api::namespaced(self.client.clone(), namespace);
		classify(ingresses.create(&PostParams::default(), &ingress).await)
	}
}
