// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Interactive input collection.

use anyhow::Result;
use dialoguer::{Confirm, Input, Password, Select};
use kade_cli_config::{GlobalConfig, KadeConfig};
use kade_common_secret::SecretString;
use kade_provisioning::DeploymentRequest;

const REQUIRED: &str = "This field is required";

pub const PLACEHOLDER_NAMESPACE: &str = "myproject";
pub const DEFAULT_DEPLOYMENT: &str = "wordpress";
pub const DEFAULT_UPLOADS_SIZE: &str = "2";
pub const DEFAULT_IMAGE: &str = "wordpress:6.4.2";
pub const PLACEHOLDER_HOSTNAME: &str = "myproject.example.com";
pub const PLACEHOLDER_DB_NAME: &str = "my_project";

/// One question asked to the user.
pub trait Prompt {
	/// Free text. `hint` is shown as an example, `initial` is pre-filled.
	/// Required answers are never empty.
	fn text(&mut self, question: &str, hint: &str, initial: &str, required: bool) -> Result<String>;

	/// Hidden input. An empty answer falls back to `fallback`.
	fn password(&mut self, question: &str, fallback: &SecretString, required: bool)
		-> Result<SecretString>;

	fn confirm(&mut self, question: &str, default: bool) -> Result<bool>;

	/// Index of the chosen item.
	fn select(&mut self, question: &str, items: &[&str]) -> Result<usize>;
}

/// [`Prompt`] on the terminal via dialoguer.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
	fn text(&mut self, question: &str, hint: &str, initial: &str, required: bool) -> Result<String> {
		let prompt = if hint.is_empty() {
			question.to_string()
		} else {
			format!("{question} (e.g. {hint})")
		};

		let mut input = Input::<String>::new()
			.with_prompt(prompt)
			.allow_empty(!required);
		if !initial.is_empty() {
			input = input.with_initial_text(initial);
		}
		if required {
			input = input.validate_with(|value: &String| -> Result<(), &str> {
				if value.trim().is_empty() {
					Err(REQUIRED)
				} else {
					Ok(())
				}
			});
		}

		Ok(input.interact_text()?.trim().to_string())
	}

	fn password(
		&mut self,
		question: &str,
		fallback: &SecretString,
		required: bool,
	) -> Result<SecretString> {
		let prompt = if fallback.is_empty() {
			question.to_string()
		} else {
			format!("{question} (leave blank to use the configured one)")
		};

		let answer = Password::new()
			.with_prompt(prompt)
			.allow_empty_password(!required || !fallback.is_empty())
			.interact()?;

		Ok(answer_or_fallback(answer, fallback))
	}

	fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
		Ok(Confirm::new().with_prompt(question).default(default).interact()?)
	}

	fn select(&mut self, question: &str, items: &[&str]) -> Result<usize> {
		Ok(Select::new()
			.with_prompt(question)
			.items(items)
			.default(0)
			.interact()?)
	}
}

fn answer_or_fallback(answer: String, fallback: &SecretString) -> SecretString {
	if answer.is_empty() {
		fallback.clone()
	} else {
		SecretString::new(answer)
	}
}

/// Kinds of application kade knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppType {
	WordPress,
	SimpleWebApp,
}

impl AppType {
	pub const ALL: [AppType; 2] = [AppType::WordPress, AppType::SimpleWebApp];

	pub fn label(&self) -> &'static str {
		match self {
			AppType::WordPress => "WordPress",
			AppType::SimpleWebApp => "Simple web app",
		}
	}
}

pub fn select_app_type(prompt: &mut dyn Prompt) -> Result<AppType> {
	let labels: Vec<&str> = AppType::ALL.iter().map(AppType::label).collect();
	let index = prompt.select("What type of app do you want to deploy?", &labels)?;
	AppType::ALL
		.get(index)
		.copied()
		.ok_or_else(|| anyhow::anyhow!("invalid app type selection: {index}"))
}

/// Ask for everything a WordPress deployment needs, offering config values
/// as defaults.
pub fn collect_wordpress_request(
	prompt: &mut dyn Prompt,
	defaults: &GlobalConfig,
) -> Result<DeploymentRequest> {
	let registry = &defaults.container_registry;
	let database = &defaults.database;

	Ok(DeploymentRequest {
		namespace: prompt.text(
			"Namespace in Rancher/Kubernetes?",
			PLACEHOLDER_NAMESPACE,
			"",
			true,
		)?,
		deployment_name: prompt.text("Deployment name?", "", DEFAULT_DEPLOYMENT, true)?,
		storage_size: prompt.text(
			"WordPress uploads volume size(Gi)?",
			"",
			DEFAULT_UPLOADS_SIZE,
			true,
		)?,
		image: prompt.text("Container image to deploy?", "", DEFAULT_IMAGE, true)?,
		registry_uri: prompt.text(
			"Container registry URI(leave blank if docker.com)?",
			"",
			&registry.uri,
			false,
		)?,
		registry_user: prompt.text(
			"Container registry user(leave blank if docker.com)?",
			"",
			&registry.user,
			false,
		)?,
		registry_pass: prompt.password(
			"Container registry password(leave blank if docker.com)?",
			&registry.pass,
			false,
		)?,
		hostname: prompt.text(
			"Hostname that the web app should be exposed on?",
			PLACEHOLDER_HOSTNAME,
			"",
			true,
		)?,
		tls: prompt.confirm("Do you want to configure TLS for the app?", false)?,
		database_host: prompt.text("Database host?", "", &database.host, true)?,
		database_name: prompt.text("Database name?", PLACEHOLDER_DB_NAME, "", true)?,
		database_user: prompt.text("Database user?", "", &database.user, true)?,
		database_pass: prompt.password("Database password?", &database.pass, true)?,
	})
}

/// Ask for the values stored by `kade --create-config`. All optional.
pub fn collect_config(prompt: &mut dyn Prompt) -> Result<KadeConfig> {
	let mut config = KadeConfig::default();
	let none = SecretString::default();

	let registry = &mut config.global.container_registry;
	registry.uri = prompt.text("Container registry URI?", "", "", false)?;
	registry.user = prompt.text("Container registry user?", "", "", false)?;
	registry.pass = prompt.password("Container registry password?", &none, false)?;

	let database = &mut config.global.database;
	database.host = prompt.text("Database host?", "", "", false)?;
	database.user = prompt.text("Database user?", "", "", false)?;
	database.pass = prompt.password("Database password?", &none, false)?;

	Ok(config)
}
