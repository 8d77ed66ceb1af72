// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioning types.

use std::fmt;

use kade_common_secret::SecretString;

use crate::readiness::Readiness;

/// Everything needed to provision one WordPress instance.
///
/// Required fields are validated by whoever collects the request. Registry
/// fields may be left empty; see [`DeploymentRequest::registry_credentials`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentRequest {
	pub namespace: String,
	pub deployment_name: String,
	/// Uploads volume size in Gi, as typed by the user (e.g. "2").
	pub storage_size: String,
	pub image: String,
	pub registry_uri: String,
	pub registry_user: String,
	pub registry_pass: SecretString,
	pub hostname: String,
	pub tls: bool,
	pub database_host: String,
	pub database_name: String,
	pub database_user: String,
	pub database_pass: SecretString,
}

/// Borrowed view of a complete set of registry credentials.
#[derive(Debug, Clone, Copy)]
pub struct RegistryCredentials<'a> {
	pub uri: &'a str,
	pub user: &'a str,
	pub pass: &'a SecretString,
}

impl DeploymentRequest {
	/// Registry credentials, only when URI, user and password are all set.
	///
	/// A partial set means "no private registry", never an error.
	pub fn registry_credentials(&self) -> Option<RegistryCredentials<'_>> {
		if self.registry_uri.is_empty() || self.registry_user.is_empty() || self.registry_pass.is_empty()
		{
			return None;
		}
		Some(RegistryCredentials {
			uri: &self.registry_uri,
			user: &self.registry_user,
			pass: &self.registry_pass,
		})
	}
}

/// One resource-creation action, in the fixed provisioning order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
	Namespace,
	PersistentVolumeClaim,
	DatabaseSecret,
	RegistrySecret,
	Deployment,
	Service,
	Ingress,
}

impl Step {
	/// Execution order. Each step only runs after the previous one was
	/// created or already existed.
	pub const ORDER: [Step; 7] = [
		Step::Namespace,
		Step::PersistentVolumeClaim,
		Step::DatabaseSecret,
		Step::RegistrySecret,
		Step::Deployment,
		Step::Service,
		Step::Ingress,
	];

	/// Human readable name used in progress messages.
	pub fn label(&self) -> &'static str {
		match self {
			Step::Namespace => "Namespace",
			Step::PersistentVolumeClaim => "PVC",
			Step::DatabaseSecret => "Database password secret",
			Step::RegistrySecret => "Container registry auth secret",
			Step::Deployment => "WordPress deployment",
			Step::Service => "WordPress service",
			Step::Ingress => "WordPress ingress",
		}
	}
}

impl fmt::Display for Step {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// Result of one provisioning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
	/// The resource was created under this name.
	Created(String),
	/// The resource was already there and was left untouched.
	AlreadyExists,
	/// The step did not apply to this request.
	Skipped(String),
	/// The step failed and the run stopped here.
	Fatal(String),
}

/// A step together with what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
	pub step: Step,
	/// Name of the resource this step targets.
	pub resource_name: String,
	pub outcome: StepOutcome,
}

/// Lifecycle of a provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
	#[default]
	InProgress,
	/// Every step was created, already existed, or was skipped.
	Completed,
	/// A step failed. Resources created before it are left in place.
	Aborted,
}

/// Ordered record of one provisioning attempt. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningRun {
	steps: Vec<StepRecord>,
	state: RunState,
}

impl ProvisioningRun {
	pub(crate) fn record(&mut self, step: Step, resource_name: &str, outcome: StepOutcome) {
		self.steps.push(StepRecord {
			step,
			resource_name: resource_name.to_string(),
			outcome,
		});
	}

	pub(crate) fn complete(&mut self) {
		self.state = RunState::Completed;
	}

	pub(crate) fn abort(&mut self) {
		self.state = RunState::Aborted;
	}

	pub fn state(&self) -> RunState {
		self.state
	}

	pub fn steps(&self) -> &[StepRecord] {
		&self.steps
	}

	/// Outcome of `step`, if the run got that far.
	pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
		self
			.steps
			.iter()
			.find(|record| record.step == step)
			.map(|record| &record.outcome)
	}

	/// Names of the resources this run actually created.
	pub fn created_resources(&self) -> Vec<&str> {
		self
			.steps
			.iter()
			.filter_map(|record| match &record.outcome {
				StepOutcome::Created(name) => Some(name.as_str()),
				_ => None,
			})
			.collect()
	}
}

/// What a successful provisioning run hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningReport {
	pub run: ProvisioningRun,
	pub readiness: Readiness,
	/// Externally reachable URL of the application.
	pub url: String,
}
