// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Desired-state builders for the WordPress resource set.
//!
//! Everything here is pure: a [`DeploymentRequest`] goes in, `k8s-openapi`
//! objects come out. The only non-determinism is the random id embedded in
//! the deployment selector label, see [`generate_unique_id`].

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use kade_k8s::{
	ByteString, Container, ContainerPort, Deployment, DeploymentSpec, EnvVar, EnvVarSource,
	HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
	IngressServiceBackend, IngressSpec, IngressTLS, LabelSelector, LocalObjectReference, Namespace,
	ObjectMeta, PersistentVolumeClaim, PersistentVolumeClaimSpec,
	PersistentVolumeClaimVolumeSource, PodSpec, PodTemplateSpec, Quantity, Secret,
	SecretKeySelector, Service, ServiceBackendPort, ServicePort, ServiceSpec, Volume, VolumeMount,
	VolumeResourceRequirements, APP_LABEL,
};
use rand::rngs::OsRng;
use rand::RngCore;
use serde_json::json;

use crate::types::DeploymentRequest;

pub const PVC_NAME: &str = "wp-uploads";
pub const DB_SECRET_NAME: &str = "wp-db-password";
pub const DB_SECRET_KEY: &str = "WORDPRESS_DB_PASSWORD";
pub const REGISTRY_SECRET_NAME: &str = "wp-registry-auth";
pub const CLUSTER_ISSUER: &str = "letsencrypt";
pub const CLUSTER_ISSUER_ANNOTATION: &str = "cert-manager.io/cluster-issuer";

const UPLOADS_MOUNT_PATH: &str = "/var/www/html/wp-content/uploads";
const HTTP_PORT: i32 = 80;
const STORAGE_UNIT: &str = "Gi";
const UNIQUE_ID_BYTES: usize = 8;
const DOCKER_CONFIG_KEY: &str = ".dockerconfigjson";
const SECRET_TYPE_OPAQUE: &str = "Opaque";
const SECRET_TYPE_DOCKER_CONFIG: &str = "kubernetes.io/dockerconfigjson";

/// Annotations every ingress gets, for the nginx ingress controller.
pub const INGRESS_ANNOTATIONS: [(&str, &str); 5] = [
	("nginx.ingress.kubernetes.io/proxy-body-size", "1G"),
	("nginx.ingress.kubernetes.io/proxy-connect-timeout", "30"),
	("nginx.ingress.kubernetes.io/proxy-read-timeout", "600"),
	("nginx.ingress.kubernetes.io/proxy-send-timeout", "600"),
	(
		"nginx.ingress.kubernetes.io/configuration-snippet",
		"more_set_headers \"X-Robots-Tag: noindex\";\n",
	),
];

/// The full desired state for one request.
#[derive(Debug, Clone)]
pub struct ResourceSpecs {
	pub namespace: Namespace,
	pub pvc: PersistentVolumeClaim,
	pub database_secret: Secret,
	/// `None` when the request carries no complete registry credentials.
	pub registry_secret: Option<Secret>,
	pub deployment: Deployment,
	pub service: Service,
	pub ingress: Ingress,
	/// Selector label embedded in the deployment and service.
	pub selector_label: String,
}

impl ResourceSpecs {
	/// Build every resource with a freshly generated selector id.
	pub fn build(request: &DeploymentRequest) -> Self {
		let label = selector_label(
			&request.namespace,
			&request.deployment_name,
			&generate_unique_id(),
		);
		Self {
			namespace: build_namespace(request),
			pvc: build_pvc(request),
			database_secret: build_database_secret(request),
			registry_secret: build_registry_secret(request),
			deployment: build_deployment(request, &label),
			service: build_service(request, &label),
			ingress: build_ingress(request),
			selector_label: label,
		}
	}
}

/// Selector label value tying a deployment's pods to its service.
pub fn selector_label(namespace: &str, deployment_name: &str, unique_id: &str) -> String {
	format!("deployment-{namespace}-{deployment_name}-{unique_id}")
}

/// 8 bytes from the OS random source, hex encoded.
pub fn generate_unique_id() -> String {
	let mut bytes = [0u8; UNIQUE_ID_BYTES];
	OsRng.fill_bytes(&mut bytes);
	hex::encode(bytes)
}

/// Externally reachable URL. The scheme depends only on the TLS flag.
pub fn deployment_url(request: &DeploymentRequest) -> String {
	let scheme = if request.tls { "https" } else { "http" };
	format!("{scheme}://{}", request.hostname)
}

fn metadata(name: &str, namespace: &str) -> ObjectMeta {
	ObjectMeta {
		name: Some(name.to_string()),
		namespace: Some(namespace.to_string()),
		..Default::default()
	}
}

fn app_labels(selector_label: &str) -> BTreeMap<String, String> {
	BTreeMap::from([(APP_LABEL.to_string(), selector_label.to_string())])
}

pub fn build_namespace(request: &DeploymentRequest) -> Namespace {
	Namespace {
		metadata: ObjectMeta {
			name: Some(request.namespace.clone()),
			..Default::default()
		},
		..Default::default()
	}
}

/// The uploads claim. The size is not validated here.
pub fn build_pvc(request: &DeploymentRequest) -> PersistentVolumeClaim {
	let storage = Quantity(format!("{}{STORAGE_UNIT}", request.storage_size));

	PersistentVolumeClaim {
		metadata: metadata(PVC_NAME, &request.namespace),
		spec: Some(PersistentVolumeClaimSpec {
			access_modes: Some(vec!["ReadWriteOnce".to_string()]),
			resources: Some(VolumeResourceRequirements {
				requests: Some(BTreeMap::from([("storage".to_string(), storage)])),
				..Default::default()
			}),
			..Default::default()
		}),
		..Default::default()
	}
}

pub fn build_database_secret(request: &DeploymentRequest) -> Secret {
	Secret {
		metadata: metadata(DB_SECRET_NAME, &request.namespace),
		data: Some(BTreeMap::from([(
			DB_SECRET_KEY.to_string(),
			ByteString(request.database_pass.expose().as_bytes().to_vec()),
		)])),
		type_: Some(SECRET_TYPE_OPAQUE.to_string()),
		..Default::default()
	}
}

/// Image pull secret, or `None` unless URI, user and password are all set.
pub fn build_registry_secret(request: &DeploymentRequest) -> Option<Secret> {
	let creds = request.registry_credentials()?;
	let auth = BASE64.encode(format!("{}:{}", creds.user, creds.pass.expose()));
	let docker_config = json!({
		"auths": {
			creds.uri: {
				"username": creds.user,
				"password": creds.pass.expose(),
				"auth": auth,
			}
		}
	});

	Some(Secret {
		metadata: metadata(REGISTRY_SECRET_NAME, &request.namespace),
		data: Some(BTreeMap::from([(
			DOCKER_CONFIG_KEY.to_string(),
			ByteString(docker_config.to_string().into_bytes()),
		)])),
		type_: Some(SECRET_TYPE_DOCKER_CONFIG.to_string()),
		..Default::default()
	})
}

/// Single-replica WordPress deployment selected by `selector_label`.
pub fn build_deployment(request: &DeploymentRequest, selector_label: &str) -> Deployment {
	let name = &request.deployment_name;

	let env = vec![
		EnvVar {
			name: "WORDPRESS_URL".to_string(),
			value: Some(deployment_url(request)),
			value_from: None,
		},
		EnvVar {
			name: "WORDPRESS_DB_HOST".to_string(),
			value: Some(request.database_host.clone()),
			value_from: None,
		},
		EnvVar {
			name: "WORDPRESS_DB_USER".to_string(),
			value: Some(request.database_user.clone()),
			value_from: None,
		},
		EnvVar {
			name: "WORDPRESS_DB_NAME".to_string(),
			value: Some(request.database_name.clone()),
			value_from: None,
		},
		EnvVar {
			name: DB_SECRET_KEY.to_string(),
			value: None,
			value_from: Some(EnvVarSource {
				secret_key_ref: Some(SecretKeySelector {
					key: DB_SECRET_KEY.to_string(),
					name: DB_SECRET_NAME.to_string(),
					optional: None,
				}),
				..Default::default()
			}),
		},
	];

	let image_pull_secrets = match request.registry_credentials() {
		Some(_) => vec![LocalObjectReference {
			name: REGISTRY_SECRET_NAME.to_string(),
		}],
		None => Vec::new(),
	};

	let container = Container {
		name: name.clone(),
		image: Some(request.image.clone()),
		ports: Some(vec![ContainerPort {
			container_port: HTTP_PORT,
			name: Some(name.clone()),
			..Default::default()
		}]),
		volume_mounts: Some(vec![VolumeMount {
			name: PVC_NAME.to_string(),
			mount_path: UPLOADS_MOUNT_PATH.to_string(),
			..Default::default()
		}]),
		env: Some(env),
		..Default::default()
	};

	Deployment {
		metadata: metadata(name, &request.namespace),
		spec: Some(DeploymentSpec {
			replicas: Some(1),
			selector: LabelSelector {
				match_labels: Some(app_labels(selector_label)),
				..Default::default()
			},
			template: PodTemplateSpec {
				metadata: Some(ObjectMeta {
					labels: Some(app_labels(selector_label)),
					..Default::default()
				}),
				spec: Some(PodSpec {
					image_pull_secrets: Some(image_pull_secrets),
					containers: vec![container],
					volumes: Some(vec![Volume {
						name: PVC_NAME.to_string(),
						persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
							claim_name: PVC_NAME.to_string(),
							read_only: None,
						}),
						..Default::default()
					}]),
					..Default::default()
				}),
			},
			..Default::default()
		}),
		..Default::default()
	}
}

/// ClusterIP service on port 80, selecting pods labelled `app=<selector_label>`.
pub fn build_service(request: &DeploymentRequest, selector_label: &str) -> Service {
	let name = &request.deployment_name;

	Service {
		metadata: metadata(name, &request.namespace),
		spec: Some(ServiceSpec {
			type_: Some("ClusterIP".to_string()),
			selector: Some(app_labels(selector_label)),
			ports: Some(vec![ServicePort {
				name: Some(name.clone()),
				port: HTTP_PORT,
				protocol: Some("TCP".to_string()),
				..Default::default()
			}]),
			..Default::default()
		}),
		..Default::default()
	}
}

/// Ingress routing the hostname to the service, with certificate issuance
/// when TLS is requested.
pub fn build_ingress(request: &DeploymentRequest) -> Ingress {
	let mut annotations: BTreeMap<String, String> = INGRESS_ANNOTATIONS
		.iter()
		.map(|(k, v)| (k.to_string(), v.to_string()))
		.collect();

	let mut tls = None;
	if request.tls {
		annotations.insert(
			CLUSTER_ISSUER_ANNOTATION.to_string(),
			CLUSTER_ISSUER.to_string(),
		);
		tls = Some(vec![IngressTLS {
			hosts: Some(vec![request.hostname.clone()]),
			secret_name: Some(format!("{}-tls", request.namespace)),
		}]);
	}

	let path = HTTPIngressPath {
		path: None,
		path_type: "ImplementationSpecific".to_string(),
		backend: IngressBackend {
			service: Some(IngressServiceBackend {
				name: request.deployment_name.clone(),
				port: Some(ServiceBackendPort {
					number: Some(HTTP_PORT),
					name: None,
				}),
			}),
			resource: None,
		},
	};

	Ingress {
		metadata: ObjectMeta {
			annotations: Some(annotations),
			..metadata(&request.deployment_name, &request.namespace)
		},
		spec: Some(IngressSpec {
			rules: Some(vec![IngressRule {
				host: Some(request.hostname.clone()),
				http: Some(HTTPIngressRuleValue { paths: vec![path] }),
			}]),
			tls,
			..Default::default()
		}),
		..Default::default()
	}
}
