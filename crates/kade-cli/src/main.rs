// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod prompts;
mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use kade_cli_config::{
	load_config, resolve_xdg_paths, write_config, ConfigSource, LogFormat, LoggingConfig,
	PathsConfig,
};
use kade_common_version::{kade_version, GithubReleaseChecker, VersionStatus};
use kade_k8s::KubeClient;
use kade_provisioning::{Provisioner, ProvisionerError, StepOutcome};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::prompts::{AppType, Prompt, TerminalPrompt};
use crate::render::{Spinner, TerminalSink};

#[derive(Parser, Debug)]
#[command(name = "kade", version = kade_version(), about, long_about = None)]
#[command(disable_version_flag = true)]
struct Args {
	/// Print version
	#[arg(short = 'v', long, action = clap::ArgAction::Version)]
	version: Option<bool>,

	/// Do not ask the release feed for a newer version
	#[arg(long)]
	skip_version_check: bool,

	/// Create the config file interactively and exit
	#[arg(long, alias = "cc")]
	create_config: bool,

	/// Kubeconfig to use instead of ~/.kube/config
	#[arg(long)]
	kubeconfig: Option<PathBuf>,

	/// Log level (overrides the config file)
	#[arg(long)]
	log_level: Option<String>,

	/// Emit logs as JSON
	#[arg(long)]
	json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	let paths = resolve_xdg_paths().context("could not resolve config paths")?;
	let (config, source) = load_config(&paths);

	init_tracing(&config.logging, &args);
	if let ConfigSource::Defaults(Some(e)) = &source {
		tracing::warn!(error = %e, "using default config");
	}

	if args.create_config {
		return create_config(&paths, &mut TerminalPrompt);
	}

	if !args.skip_version_check && newer_release_available().await {
		return Ok(());
	}

	println!("{}", render::header(kade_version()));

	let kubeconfig = args.kubeconfig.clone().unwrap_or_else(|| paths.kubeconfig.clone());
	println!("Using kube config from path: {}", kubeconfig.display());
	let client = connect_with_spinner(&kubeconfig).await?;
	let cluster = client.cluster_name().unwrap_or("unknown").to_string();
	println!("Successfully connected to cluster: {cluster}");

	println!("{}\n", render::config_notice(&source));

	let mut prompt = TerminalPrompt;
	match prompts::select_app_type(&mut prompt)? {
		AppType::WordPress => {}
		AppType::SimpleWebApp => {
			println!("Not implemented yet, come back later!");
			return Ok(());
		}
	}

	let request = prompts::collect_wordpress_request(&mut prompt, &config.global)?;

	let proceed = prompt.confirm(
		&format!("Are you sure you want to continue deploying to cluster: {cluster}?"),
		false,
	)?;
	if !proceed {
		println!("Aborting...");
		return Ok(());
	}

	println!("{}", render::separator());
	println!("Deploying resources to cluster...\n");

	let provisioner = Provisioner::new(Arc::new(client), Arc::new(TerminalSink::new()));
	match provisioner.provision(&request).await {
		Ok(report) => {
			tracing::info!(
				url = %report.url,
				created = report.run.created_resources().len(),
				ready = report.readiness.is_ready(),
				"deployment finished"
			);
			Ok(())
		}
		Err(e) => {
			report_partial_run(&e);
			Err(e).context("deployment aborted")
		}
	}
}

fn init_tracing(logging: &LoggingConfig, args: &Args) {
	let level = args
		.log_level
		.clone()
		.unwrap_or_else(|| logging.level.as_str().to_string());
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(format!("kade={level}")));

	let format = if args.json_logs {
		LogFormat::Json
	} else {
		logging.format
	};

	match format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Compact => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().compact().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_writer(std::io::stderr))
				.init();
		}
	}
}

fn create_config(paths: &PathsConfig, prompt: &mut dyn Prompt) -> Result<()> {
	let path = &paths.user_config_file;
	if path.exists() {
		println!("Config file already exists, aborting...");
		return Ok(());
	}

	println!("Creating config file...");
	let config = prompts::collect_config(prompt)?;
	write_config(path, &config)
		.with_context(|| format!("could not write config file {}", path.display()))?;
	println!("Config file created!");
	Ok(())
}

/// True when a newer release exists and the notice was shown.
async fn newer_release_available() -> bool {
	let checker = match GithubReleaseChecker::new() {
		Ok(checker) => checker,
		Err(e) => {
			tracing::warn!(error = %e, "skipping version check");
			return false;
		}
	};

	match VersionStatus::check(&checker, kade_version()).await {
		VersionStatus::Outdated { current, latest } => {
			println!("{}", render::outdated_notice(&current, &latest));
			true
		}
		status => {
			tracing::debug!(?status, "version check done");
			false
		}
	}
}

/// Connect behind a spinner. Failures are reported once, through the error chain.
async fn connect_with_spinner(kubeconfig: &Path) -> Result<KubeClient> {
	let spinner = Spinner::start("Connecting to Kubernetes cluster...");
	let connected = connect(kubeconfig).await;
	spinner.finish();

	connected.context("Failed to connect to the cluster")
}

async fn connect(kubeconfig: &Path) -> Result<KubeClient> {
	let client = KubeClient::connect(Some(kubeconfig))
		.await
		.context("could not load kubeconfig")?;
	client
		.probe()
		.await
		.context("cluster did not answer")?;
	Ok(client)
}

fn report_partial_run(error: &ProvisionerError) {
	let created: Vec<_> = error
		.run()
		.steps()
		.iter()
		.filter(|record| matches!(record.outcome, StepOutcome::Created(_)))
		.collect();
	if created.is_empty() {
		return;
	}
	println!("\nThe following resources were created and left in place:");
	for record in created {
		println!("  - {}: {}", record.step, record.resource_name);
	}
}
