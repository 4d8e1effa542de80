// SPDX-License-Identifier: GPL-3.0

//! Extrinsics pipeline error types.

use crate::error::{MetadataError, RpcClientError, SignatureError};
use std::fmt::{self, Display};
use thiserror::Error;

/// Chain facts fetched before a payload can be signed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SigningFact {
	/// Spec and transaction versions of the current runtime.
	RuntimeVersion,
	/// Hash of block zero.
	GenesisHash,
	/// Next nonce of the signing account.
	AccountNonce,
}

impl Display for SigningFact {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			SigningFact::RuntimeVersion => "runtime version",
			SigningFact::GenesisHash => "genesis hash",
			SigningFact::AccountNonce => "account nonce",
		})
	}
}

/// Errors that can occur while building an extrinsic payload.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExtrinsicError {
	/// The call arguments could not be encoded.
	#[error("Failed to encode arguments of {module}.{call}: {source}")]
	Encode {
		/// Module declaring the call.
		module: String,
		/// Call name.
		call: String,
		/// The underlying encoding failure.
		source: substrate_codec::Error,
	},
	/// The encoded arguments do not match the call's declared field types.
	#[error("Arguments of {module}.{call} do not match its declared fields: {source}")]
	ArgumentsMismatch {
		/// Module declaring the call.
		module: String,
		/// Call name.
		call: String,
		/// Where the argument bytes stopped matching.
		source: substrate_codec::Error,
	},
	/// Fetching a signing fact failed.
	#[error("Failed to fetch the {fact}: {source}")]
	SigningFact {
		/// The fact being fetched.
		fact: SigningFact,
		/// The RPC failure.
		source: RpcClientError,
	},
	/// The node has no value for a signing fact.
	#[error("The node returned no {0}")]
	MissingSigningFact(SigningFact),
	/// A mortal era was requested without the hash of its birth block.
	#[error("A mortal era requires the hash of its birth block")]
	MissingCheckpoint,
	/// Runtime metadata could not be loaded.
	#[error(transparent)]
	Metadata(#[from] MetadataError),
	/// The signature engine failed.
	#[error(transparent)]
	Signature(#[from] SignatureError),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn error_display_signing_fact() {
		let err = ExtrinsicError::SigningFact {
			fact: SigningFact::AccountNonce,
			source: RpcClientError::InvalidResponse("boom".into()),
		};
		assert_eq!(err.to_string(), "Failed to fetch the account nonce: Invalid RPC response: boom");
	}

	#[test]
	fn error_display_missing_signing_fact() {
		let err = ExtrinsicError::MissingSigningFact(SigningFact::GenesisHash);
		assert_eq!(err.to_string(), "The node returned no genesis hash");
	}
}
