// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for the passwords kade collects.
//!
//! Database and registry passwords travel from the prompts and the config
//! file into Kubernetes secrets. [`SecretString`] keeps them out of logs and
//! `Debug` dumps along the way:
//!
//! ```
//! use kade_common_secret::SecretString;
//!
//! let pass = SecretString::new("hunter2");
//! assert_eq!(format!("{pass}"), "[REDACTED]");
//! assert_eq!(pass.expose(), "hunter2");
//! ```
//!
//! Serializing a secret with plain serde redacts it as well. Code that has
//! to persist the real value (the config writer) opts in with
//! `#[serde(with = "kade_common_secret::plaintext")]`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Placeholder printed in place of a secret value.
pub const REDACTED: &str = "[REDACTED]";

/// A string that never shows up in formatted output and is zeroed on drop.
#[derive(Clone, Default, Zeroize)]
#[zeroize(drop)]
pub struct SecretString {
	inner: String,
}

impl SecretString {
	pub fn new(value: impl Into<String>) -> Self {
		Self {
			inner: value.into(),
		}
	}

	/// Access the plaintext. Every call site is a place where the secret leaves
	/// the wrapper, so keep them few.
	pub fn expose(&self) -> &str {
		&self.inner
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("SecretString").field(&REDACTED).finish()
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl Eq for SecretString {}

impl Serialize for SecretString {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		String::deserialize(deserializer).map(SecretString::new)
	}
}

/// Serde adapter that writes the plaintext value.
///
/// Only for files the user owns, such as `~/.config/kade/config.toml`.
pub mod plaintext {
	use serde::{Deserialize, Deserializer, Serializer};

	use super::SecretString;

	pub fn serialize<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(secret.expose())
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
		String::deserialize(deserializer).map(SecretString::new)
	}
}
