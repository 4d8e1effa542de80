// SPDX-License-Identifier: GPL-3.0

//! Error types for client operations.
//!
//! This module contains all error types used throughout the `substrate-client` crate,
//! organized by context:
//!
//! - [`rpc::RpcClientError`] - Errors from the node RPC collaborator.
//! - [`metadata::MetadataError`] - Invalid runtime metadata or a failed metadata load.
//! - [`constants::ConstantsError`] - Errors from the constants service.
//! - [`storage::StorageError`] - Errors from the storage service.
//! - [`extrinsic::ExtrinsicError`] - Errors from the extrinsics pipeline.
//! - [`signature::SignatureError`] - Errors raised by signature engines.
//! - [`config::ConfigError`] - Errors loading a client configuration.

pub mod config;
pub mod constants;
pub mod extrinsic;
pub mod metadata;
pub mod rpc;
pub mod signature;
pub mod storage;

pub use config::ConfigError;
pub use constants::ConstantsError;
pub use extrinsic::{ExtrinsicError, SigningFact};
pub use metadata::MetadataError;
pub use rpc::RpcClientError;
pub use signature::SignatureError;
pub use storage::StorageError;

use thiserror::Error;

/// Any error produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Constants(#[from] ConstantsError),
	#[error(transparent)]
	Extrinsic(#[from] ExtrinsicError),
	#[error(transparent)]
	Metadata(#[from] MetadataError),
	#[error(transparent)]
	Rpc(#[from] RpcClientError),
	#[error(transparent)]
	Signature(#[from] SignatureError),
	#[error(transparent)]
	Storage(#[from] StorageError),
}
