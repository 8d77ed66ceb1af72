// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Terminal output: boxed banners, progress lines and spinners.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use kade_cli_config::ConfigSource;
use kade_provisioning::{ProgressEvent, ProgressSink, Severity};

const BOX_WIDTH: usize = 64;
const SPINNER_TICK: Duration = Duration::from_millis(100);

/// Draw `text` inside a rounded box, one box row per input line.
pub fn boxed(text: &str) -> String {
	let inner = text
		.lines()
		.map(|line| line.chars().count())
		.max()
		.unwrap_or(0)
		.max(BOX_WIDTH);

	let mut out = String::new();
	out.push('╭');
	out.push_str(&"─".repeat(inner + 2));
	out.push_str("╮\n");
	for line in text.lines() {
		let pad = inner - line.chars().count();
		out.push_str("│ ");
		out.push_str(line);
		out.push_str(&" ".repeat(pad));
		out.push_str(" │\n");
	}
	out.push('╰');
	out.push_str(&"─".repeat(inner + 2));
	out.push('╯');
	out
}

pub fn header(version: &str) -> String {
	boxed(&format!(
		"KADE\nKubernetes Application Deployment Engine\n{version}"
	))
}

pub fn outdated_notice(current: &str, latest: &str) -> String {
	boxed(&format!(
		"A new version of KADE is available, please update to the latest version.\n\nCurrent version: {current}\nLatest version: {latest}"
	))
}

pub fn environment_ready(url: &str) -> String {
	boxed(&format!("✔ Environment ready:\n\n{url}"))
}

pub fn separator() -> String {
	"─".repeat(BOX_WIDTH + 4)
}

/// What to tell the user about where their defaults came from.
pub fn config_notice(source: &ConfigSource) -> String {
	match source {
		ConfigSource::File(path) => format!("Loaded app config from {}", path.display()),
		ConfigSource::Defaults(None) => {
			"Could not load app config, will ask for required information...".to_string()
		}
		ConfigSource::Defaults(Some(e)) => {
			format!("Could not load app config ({e}), will ask for required information...")
		}
	}
}

/// One progress line, prefixed by a mark for its severity.
pub fn format_event(event: &ProgressEvent) -> String {
	let mark = match event.severity() {
		Severity::Success => "✔",
		Severity::Info => "…",
		Severity::Warning => "⚠",
		Severity::Error => "✖",
	};
	format!("{mark} {event}")
}

/// An animated spinner shown while kade waits on the cluster.
pub struct Spinner {
	bar: ProgressBar,
}

impl Spinner {
	pub fn start(message: impl Into<String>) -> Self {
		Self::on(ProgressBar::new_spinner(), message)
	}

	fn on(bar: ProgressBar, message: impl Into<String>) -> Self {
		bar.set_style(ProgressStyle::default_spinner().tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
		bar.set_message(message.into());
		bar.enable_steady_tick(SPINNER_TICK);
		Self { bar }
	}

	pub fn message(&self) -> String {
		self.bar.message()
	}

	pub fn is_active(&self) -> bool {
		!self.bar.is_finished()
	}

	/// Stop ticking and erase the spinner line.
	pub fn finish(&self) {
		self.bar.finish_and_clear();
	}
}

/// Prints progress to stdout and mirrors it to the log.
///
/// A spinner runs from `WaitingForReadiness` until the next event.
#[derive(Default)]
pub struct TerminalSink {
	spinner: Mutex<Option<Spinner>>,
	hidden: bool,
}

impl TerminalSink {
	pub fn new() -> Self {
		Self::default()
	}

	/// Message of the running spinner, if any.
	pub fn spinner_message(&self) -> Option<String> {
		self
			.spinner
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.as_ref()
			.filter(|spinner| spinner.is_active())
			.map(Spinner::message)
	}

	fn start_spinner(&self, message: String) {
		let bar = if self.hidden {
			ProgressBar::hidden()
		} else {
			ProgressBar::new_spinner()
		};
		let previous = self
			.spinner
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.replace(Spinner::on(bar, message));
		if let Some(previous) = previous {
			previous.finish();
		}
	}

	fn stop_spinner(&self) {
		let running = self
			.spinner
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.take();
		if let Some(spinner) = running {
			spinner.finish();
		}
	}
}

impl ProgressSink for TerminalSink {
	fn emit(&self, event: &ProgressEvent) {
		tracing::debug!(event = %event, "provisioning progress");
		match event {
			ProgressEvent::WaitingForReadiness { .. } => self.start_spinner(event.to_string()),
			ProgressEvent::EnvironmentReady { url } => {
				self.stop_spinner();
				println!("\n{}", environment_ready(url));
			}
			_ => {
				self.stop_spinner();
				println!("{}", format_event(event));
			}
		}
	}
}
