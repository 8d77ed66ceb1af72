// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioning orchestration for kade.
//!
//! This crate turns a validated [`DeploymentRequest`] into the WordPress
//! resource set on a Kubernetes cluster.
//!
//! # Architecture
//!
//! The provisioner sits between the CLI (kade-cli) and the cluster client
//! (kade-k8s), implementing:
//!
//! - Pure desired-state builders for every resource kind
//! - The fixed, sequential seven-step creation order
//! - Conflict-tolerant outcome classification
//! - Bounded readiness polling with an injectable clock

pub mod config;
pub mod error;
pub mod events;
pub mod provisioner;
pub mod readiness;
pub mod specs;
pub mod types;

pub use config::ReadinessConfig;
pub use error::ProvisionerError;
pub use events::{CollectingSink, ProgressEvent, ProgressSink, Severity, TracingSink};
pub use provisioner::Provisioner;
pub use readiness::{Clock, Readiness, ReadinessPoller, TokioClock};
pub use specs::{deployment_url, ResourceSpecs};
pub use types::{
	DeploymentRequest, ProvisioningReport, ProvisioningRun, RegistryCredentials, RunState, Step,
	StepOutcome, StepRecord,
};
