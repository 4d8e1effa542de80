// SPDX-License-Identifier: GPL-3.0

//! RPC client error types.

use thiserror::Error;

/// Errors that can occur when interacting with the node.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RpcClientError {
	/// Failed to connect to the RPC endpoint.
	#[error("Failed to connect to {endpoint}: {message}")]
	ConnectionFailed {
		/// The endpoint URL that failed to connect.
		endpoint: String,
		/// The error message describing the failure.
		message: String,
	},
	/// RPC request failed.
	#[error("RPC request `{method}` failed: {message}")]
	RequestFailed {
		/// The RPC method that failed.
		method: &'static str,
		/// The error message describing the failure.
		message: String,
	},
	/// Invalid response from RPC.
	#[error("Invalid RPC response: {0}")]
	InvalidResponse(String),
}
