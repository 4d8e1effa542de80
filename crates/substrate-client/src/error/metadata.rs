// SPDX-License-Identifier: GPL-3.0

//! Runtime metadata error types.

use crate::{TypeId, error::RpcClientError};
use thiserror::Error;

/// Errors raised while loading or validating runtime metadata.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
	/// Failed to decode the metadata returned by the node.
	#[error("Failed to decode metadata: {0}")]
	DecodeError(String),
	/// Type ids must be dense and listed in order.
	#[error("Type listed at position {position} has id {id}")]
	UnorderedTypeId {
		/// Position of the type in the registry.
		position: usize,
		/// Id the type declares.
		id: TypeId,
	},
	/// A type refers to an id that is not in the registry.
	#[error("Type {referenced_by} refers to unknown type {id}")]
	UnknownTypeId {
		/// Id of the referring type, or of the metadata item for module level references.
		referenced_by: String,
		/// The missing id.
		id: TypeId,
	},
	/// A type contains itself by value and can never finish encoding.
	#[error("Type {0} contains itself by value")]
	RecursiveType(TypeId),
	/// A storage item declares a different number of hashers and key types.
	#[error("Storage item {module}.{item} declares {hashers} hasher(s) for {keys} key type(s)")]
	HasherCountMismatch {
		/// Module declaring the item.
		module: String,
		/// Storage item name.
		item: String,
		/// Number of hashers.
		hashers: usize,
		/// Number of key types.
		keys: usize,
	},
	/// RPC client error when fetching metadata.
	#[error(transparent)]
	RpcError(#[from] RpcClientError),
}
