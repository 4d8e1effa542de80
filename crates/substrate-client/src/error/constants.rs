// SPDX-License-Identifier: GPL-3.0

//! Constants service error types.

use crate::error::MetadataError;
use thiserror::Error;

/// Errors that can occur when fetching runtime module constants.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConstantsError {
	/// The constant exists but its value bytes do not decode into the requested type.
	#[error("Failed to decode constant {module}.{constant}: {source}")]
	FetchingFailure {
		/// Module declaring the constant.
		module: String,
		/// Constant name.
		constant: String,
		/// The underlying decoding failure.
		source: substrate_codec::Error,
	},
	/// Runtime metadata could not be loaded.
	#[error(transparent)]
	Metadata(#[from] MetadataError),
}
