// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioner error types.

use kade_k8s::K8sError;

use crate::types::{ProvisioningRun, Step};

/// Errors that abort a provisioning run.
///
/// Every variant carries the aborted run, so callers can tell which
/// resources were already created. Nothing is rolled back.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionerError {
	/// A cluster call failed for a reason other than "already exists"
	#[error("{step} step failed: {source}")]
	StepFailed {
		step: Step,
		#[source]
		source: K8sError,
		run: Box<ProvisioningRun>,
	},

	/// The live deployment has no `app` selector label to point the service at
	#[error("Deployment {namespace}/{name} has no app selector label")]
	MissingSelector {
		namespace: String,
		name: String,
		run: Box<ProvisioningRun>,
	},
}

impl ProvisionerError {
	/// The step the run stopped at.
	pub fn step(&self) -> Step {
		match self {
			ProvisionerError::StepFailed { step, .. } => *step,
			ProvisionerError::MissingSelector { .. } => Step::Service,
		}
	}

	/// The aborted run.
	pub fn run(&self) -> &ProvisioningRun {
		match self {
			ProvisionerError::StepFailed { run, .. } | ProvisionerError::MissingSelector { run, .. } => {
				run
			}
		}
	}
}
