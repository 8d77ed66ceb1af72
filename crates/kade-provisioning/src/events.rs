// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Progress reporting for provisioning runs.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::types::Step;

/// Something the user should hear about while a run progresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
	StepCreated { step: Step, name: String },
	StepAlreadyExists { step: Step },
	StepSkipped { step: Step, reason: String },
	StepFailed { step: Step, cause: String },
	WaitingForReadiness { namespace: String, name: String },
	DeploymentReady { attempts: u32 },
	ReadinessTimedOut { attempts: u32 },
	EnvironmentReady { url: String },
}

/// How a renderer should mark an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
	Success,
	Info,
	Warning,
	Error,
}

impl ProgressEvent {
	pub fn severity(&self) -> Severity {
		match self {
			ProgressEvent::StepCreated { .. }
			| ProgressEvent::DeploymentReady { .. }
			| ProgressEvent::EnvironmentReady { .. } => Severity::Success,
			ProgressEvent::WaitingForReadiness { .. } => Severity::Info,
			ProgressEvent::StepAlreadyExists { .. }
			| ProgressEvent::StepSkipped { .. }
			| ProgressEvent::ReadinessTimedOut { .. } => Severity::Warning,
			ProgressEvent::StepFailed { .. } => Severity::Error,
		}
	}
}

impl fmt::Display for ProgressEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ProgressEvent::StepCreated { step, name } => write!(f, "{step} {name} created"),
			ProgressEvent::StepAlreadyExists { step } => {
				write!(f, "{step} already exists, continuing...")
			}
			ProgressEvent::StepSkipped { reason, .. } => write!(f, "{reason}, skipping..."),
			ProgressEvent::StepFailed { step, cause } => write!(f, "{step} failed: {cause}"),
			ProgressEvent::WaitingForReadiness { .. } => f.write_str("Preparing the environment..."),
			ProgressEvent::DeploymentReady { .. } => f.write_str("Deployment is ready"),
			ProgressEvent::ReadinessTimedOut { attempts } => write!(
				f,
				"Deployment not ready after {attempts} checks, it may still be starting"
			),
			ProgressEvent::EnvironmentReady { url } => write!(f, "Environment ready: {url}"),
		}
	}
}

/// Receiver of progress events. Implementations must not block for long.
pub trait ProgressSink: Send + Sync {
	fn emit(&self, event: &ProgressEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
	fn emit(&self, event: &ProgressEvent) {
		match event.severity() {
			Severity::Success | Severity::Info => tracing::info!(event = %event, "Provisioning progress"),
			Severity::Warning => tracing::warn!(event = %event, "Provisioning progress"),
			Severity::Error => tracing::error!(event = %event, "Provisioning progress"),
		}
	}
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct CollectingSink {
	events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn events(&self) -> Vec<ProgressEvent> {
		self
			.events
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}
}

impl ProgressSink for CollectingSink {
	fn emit(&self, event: &ProgressEvent) {
		self
			.events
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(event.clone());
	}
}
