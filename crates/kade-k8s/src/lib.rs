// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Cluster client abstraction for kade resource provisioning.
//!
//! This crate provides:
//! - The [`ClusterClient`] capability trait the provisioner drives
//! - A production implementation using the kube crate
//! - An in-memory [`MockClusterClient`] for tests
//! - Typed create outcomes, so conflicts are never detected by error text

mod client;
mod error;
mod kube_client;
mod mock;
mod types;

pub use client::ClusterClient;
pub use error::{K8sError, K8sResult};
pub use kube_client::KubeClient;
pub use mock::{MockCall, MockClusterClient, ResourceKind};
pub use types::{
	ByteString, Container, ContainerPort, CreateOutcome, Deployment, DeploymentSpec,
	DeploymentStatus, EnvVar, EnvVarSource, HTTPIngressPath, HTTPIngressRuleValue, Ingress,
	IngressBackend, IngressRule, IngressServiceBackend, IngressSpec, IngressTLS, LabelSelector,
	LocalObjectReference, Namespace, ObjectMeta, PersistentVolumeClaim,
	PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource, PodSpec, PodTemplateSpec,
	Quantity, Secret, SecretKeySelector, Service, ServiceBackendPort, ServicePort, ServiceSpec,
	Volume, VolumeMount, VolumeResourceRequirements, APP_LABEL,
};
