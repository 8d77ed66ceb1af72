// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Result type alias for K8s operations.
pub type K8sResult<T> = Result<T, K8sError>;

/// Errors that can occur during K8s operations.
///
/// A create that fails only because the object already exists is not an
/// error; it is reported as [`crate::CreateOutcome::Conflict`].
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("K8s API error ({code}): {message}")]
	ApiError { code: u16, message: String },

	#[error("Deployment not found: {namespace}/{name}")]
	DeploymentNotFound { namespace: String, name: String },

	#[error("Kubeconfig error: {message}")]
	Config { message: String },

	#[error("K8s client error: {message}")]
	ClientError { message: String },
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		match err {
			kube::Error::Api(resp) => K8sError::ApiError {
				code: resp.code,
				message: resp.message,
			},
			other => K8sError::ClientError {
				message: other.to_string(),
			},
		}
	}
}

impl From<kube::config::KubeconfigError> for K8sError {
	fn from(err: kube::config::KubeconfigError) -> Self {
		K8sError::Config {
			message: err.to_string(),
		}
	}
}
