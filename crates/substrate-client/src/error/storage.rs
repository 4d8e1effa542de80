// SPDX-License-Identifier: GPL-3.0

//! Storage service error types.

use crate::error::{MetadataError, RpcClientError};
use thiserror::Error;

/// Errors that can occur when querying runtime storage.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StorageError {
	/// The number of keys supplied does not match the item's hashers.
	#[error("Storage item {module}.{item} takes {expected} key(s), {found} supplied")]
	KeyCountMismatch {
		/// Module declaring the item.
		module: String,
		/// Storage item name.
		item: String,
		/// Number of hashers declared for the item.
		expected: usize,
		/// Number of keys supplied.
		found: usize,
	},
	/// An encoded key is not a value of the key type the item declares.
	#[error("Key {index} of storage item {module}.{item} does not match its type: {source}")]
	InvalidKey {
		/// Module declaring the item.
		module: String,
		/// Storage item name.
		item: String,
		/// Position of the key.
		index: usize,
		/// The underlying decoding failure.
		source: substrate_codec::Error,
	},
	/// A typed key could not be encoded.
	#[error("Failed to encode storage key: {0}")]
	KeyEncoding(substrate_codec::Error),
	/// The stored value does not decode into the requested type.
	#[error("Failed to decode storage item {module}.{item}: {source}")]
	Decode {
		/// Module declaring the item.
		module: String,
		/// Storage item name.
		item: String,
		/// The underlying decoding failure.
		source: substrate_codec::Error,
	},
	/// Runtime metadata could not be loaded.
	#[error(transparent)]
	Metadata(#[from] MetadataError),
	/// The storage query failed.
	#[error(transparent)]
	Rpc(#[from] RpcClientError),
}
