// SPDX-License-Identifier: GPL-3.0

#![doc = include_str!("../README.md")]

mod client;
mod config;
mod constants;
pub mod error;
/// Construction of unsigned and signed extrinsics.
pub mod extrinsics;
mod lookup;
/// Runtime metadata model and type registry.
pub mod metadata;
mod primitives;
mod rpc;
pub mod storage;
mod strings;
/// Mock node and runtime fixture for tests.
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::SubstrateClient;
pub use config::{ClientConfig, DEFAULT_ENDPOINT};
pub use constants::{ConstantsService, FoundConstant};
pub use error::{
	ConfigError, ConstantsError, Error, ExtrinsicError, MetadataError, RpcClientError, SignatureError,
	SigningFact, StorageError,
};
pub use extrinsics::{
	Call, EncodedCall, Era, ExtrinsicAdditional, ExtrinsicsService, MortalEra, Payload, SignatureEngine,
	SignatureKind, SignedExtra, SignedParams, SignedPayload, UnsignedPayload, create_signer,
};
pub use lookup::{Lookup, RuntimeCall, StorageItemRef};
pub use metadata::{
	RuntimeMetadata, RuntimeModule, RuntimeModuleConstant, RuntimeModuleStorage, RuntimeModuleStorageItem,
	TypeId,
};
pub use primitives::{AccountData, AccountId, AccountInfo, Balance, H256, Index, RuntimeVersion};
pub use rpc::{ChainRpc, RpcClient, account_storage_key};
pub use storage::{FoundStorageItem, StorageHasher, StorageService};
pub use substrate_codec::{Compact, NamingPolicy};
