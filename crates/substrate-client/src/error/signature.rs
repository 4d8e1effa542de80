// SPDX-License-Identifier: GPL-3.0

//! Signature engine error types.

use thiserror::Error;

/// Errors raised by signature engines.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
	/// Failed to parse a secret URI.
	#[error("Failed to parse secret URI: {0}")]
	ParseSecretURI(String),
	/// Failed to derive a key pair from a secret URI.
	#[error("Failed to create keypair from URI: {0}")]
	KeyPairCreation(String),
	/// The engine returned a signature of the wrong length for its kind.
	#[error("Expected a {expected} byte signature, got {found} byte(s)")]
	InvalidSignatureLength {
		/// Length required by the signature kind.
		expected: usize,
		/// Length returned by the engine.
		found: usize,
	},
	/// The engine failed to sign.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
}
