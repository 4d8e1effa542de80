// SPDX-License-Identifier: GPL-3.0

//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading a [`crate::ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The configuration file could not be read.
	#[error("Failed to read config file {}: {source}", path.display())]
	Read {
		/// Path of the file.
		path: PathBuf,
		/// The underlying IO error.
		source: std::io::Error,
	},
	/// The configuration is not valid TOML or has unexpected fields.
	#[error("Invalid client config: {0}")]
	Parse(#[from] toml::de::Error),
}
