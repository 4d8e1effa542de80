// SPDX-License-Identifier: GPL-3.0

//! Node RPC collaborator.
//!
//! The services never talk to the node directly: every network round-trip goes through
//! [`ChainRpc`], so tests and embedders can substitute their own transport. [`RpcClient`] is the
//! implementation backed by subxt's [`LegacyRpcMethods`].
//!
//! # Why Legacy RPCs?
//!
//! The `state_*` and `chain_*` methods are request/response and supported by every Polkadot SDK
//! node, which is all a lookup-then-fetch client needs. The newer `chainHead_v1_*` methods
//! require subscription lifecycle management this crate has no use for.

use crate::{
	error::{MetadataError, RpcClientError},
	metadata::RuntimeMetadata,
	primitives::{AccountId, AccountInfo, H256, RuntimeVersion},
	storage::StorageHasher,
	strings::rpc::{methods, storage_keys},
};
use async_trait::async_trait;
use subxt::{
	SubstrateConfig,
	backend::{legacy::LegacyRpcMethods, rpc::RpcClient as SubxtRpcClient},
};
use url::Url;

/// Requests the client needs from a node.
///
/// Implementations must not retry: a failure is reported once and propagated to the caller of
/// the operation that needed it.
#[async_trait]
pub trait ChainRpc: Send + Sync {
	/// Hash of block `number`, `None` when the node does not know the block.
	async fn block_hash(&self, number: u64) -> Result<Option<H256>, RpcClientError>;

	/// Value stored under `key` at the best block, `None` when the key is empty.
	async fn storage(&self, key: &[u8]) -> Result<Option<Vec<u8>>, RpcClientError>;

	/// Version of the runtime at the best block.
	async fn runtime_version(&self) -> Result<RuntimeVersion, RpcClientError>;

	/// `System.Account` entry of `account`, `None` when the account does not exist.
	async fn account_info(&self, account: &AccountId) -> Result<Option<AccountInfo>, RpcClientError>;

	/// Runtime metadata at the best block.
	async fn metadata(&self) -> Result<RuntimeMetadata, MetadataError>;
}

/// Storage key of the `System.Account` entry for `account`.
///
/// The key format is: twox128("System") ++ twox128("Account") ++ blake2_128(account) ++ account
pub fn account_storage_key(account: &AccountId) -> Vec<u8> {
	let mut key = StorageHasher::Twox128.hash(storage_keys::SYSTEM.as_bytes());
	key.extend(StorageHasher::Twox128.hash(storage_keys::ACCOUNT.as_bytes()));
	key.extend(StorageHasher::Blake2_128Concat.hash(account.as_bytes()));
	key
}

/// [`ChainRpc`] implementation over a node's JSON-RPC endpoint.
///
/// # Example
///
/// ```ignore
/// use substrate_client::{ChainRpc, RpcClient};
///
/// let rpc = RpcClient::connect(&"ws://127.0.0.1:9944".parse()?).await?;
/// let genesis = rpc.block_hash(0).await?;
/// ```
#[derive(Clone, Debug)]
pub struct RpcClient {
	legacy: LegacyRpcMethods<SubstrateConfig>,
	endpoint: Url,
}

impl RpcClient {
	/// Connect to the node at `endpoint`.
	///
	/// # Arguments
	/// * `endpoint` - WebSocket URL of the node's RPC endpoint (e.g., `ws://127.0.0.1:9944`)
	pub async fn connect(endpoint: &Url) -> Result<Self, RpcClientError> {
		let client = SubxtRpcClient::from_url(endpoint.as_str()).await.map_err(|e| {
			RpcClientError::ConnectionFailed { endpoint: endpoint.to_string(), message: e.to_string() }
		})?;
		log::debug!(target: "substrate_client", "connected to {endpoint}");
		Ok(Self { legacy: LegacyRpcMethods::new(client), endpoint: endpoint.clone() })
	}

	/// The endpoint this client is connected to.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}
}

#[async_trait]
impl ChainRpc for RpcClient {
	async fn block_hash(&self, number: u64) -> Result<Option<H256>, RpcClientError> {
		log::trace!(target: "substrate_client", "{} {number}", methods::CHAIN_GET_BLOCK_HASH);
		let hash = self.legacy.chain_get_block_hash(Some(number.into())).await.map_err(|e| {
			RpcClientError::RequestFailed { method: methods::CHAIN_GET_BLOCK_HASH, message: e.to_string() }
		})?;
		Ok(hash.map(H256::from))
	}

	async fn storage(&self, key: &[u8]) -> Result<Option<Vec<u8>>, RpcClientError> {
		log::trace!(target: "substrate_client", "{} 0x{}", methods::STATE_GET_STORAGE, hex::encode(key));
		self.legacy.state_get_storage(key, None).await.map_err(|e| {
			RpcClientError::RequestFailed { method: methods::STATE_GET_STORAGE, message: e.to_string() }
		})
	}

	async fn runtime_version(&self) -> Result<RuntimeVersion, RpcClientError> {
		let version = self.legacy.state_get_runtime_version(None).await.map_err(|e| {
			RpcClientError::RequestFailed {
				method: methods::STATE_GET_RUNTIME_VERSION,
				message: e.to_string(),
			}
		})?;
		Ok(RuntimeVersion {
			spec_version: version.spec_version,
			transaction_version: version.transaction_version,
		})
	}

	async fn account_info(&self, account: &AccountId) -> Result<Option<AccountInfo>, RpcClientError> {
		let Some(bytes) = self.storage(&account_storage_key(account)).await? else {
			return Ok(None);
		};
		AccountInfo::decode_lenient(&bytes)
			.map(Some)
			.map_err(|e| RpcClientError::InvalidResponse(format!("account {account}: {e}")))
	}

	async fn metadata(&self) -> Result<RuntimeMetadata, MetadataError> {
		let metadata = self.legacy.state_get_metadata(None).await.map_err(|e| {
			RpcClientError::RequestFailed { method: methods::STATE_GET_METADATA, message: e.to_string() }
		})?;
		RuntimeMetadata::try_from(metadata.into_raw().as_slice())
	}
}
