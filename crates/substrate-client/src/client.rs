// SPDX-License-Identifier: GPL-3.0

use crate::{
	config::ClientConfig,
	constants::ConstantsService,
	error::{MetadataError, RpcClientError},
	extrinsics::ExtrinsicsService,
	lookup::Lookup,
	rpc::{ChainRpc, RpcClient},
	storage::StorageService,
};
use std::sync::Arc;
use substrate_codec::NamingPolicy;
use tokio::sync::OnceCell;

/// State shared by the client and its services.
pub(crate) struct ClientInner {
	pub(crate) rpc: Arc<dyn ChainRpc>,
	pub(crate) policy: NamingPolicy,
	lookup: OnceCell<Arc<Lookup>>,
}

impl ClientInner {
	/// The session's lookup, fetching the metadata on first use.
	///
	/// Concurrent callers share a single in-flight fetch. A failed fetch is not memoized, the
	/// next call fetches again.
	pub(crate) async fn lookup(&self) -> Result<Arc<Lookup>, MetadataError> {
		self.lookup
			.get_or_try_init(|| async {
				log::debug!(target: "substrate_client", "fetching runtime metadata");
				let metadata = self.rpc.metadata().await?;
				Ok::<_, MetadataError>(Arc::new(Lookup::new(Arc::new(metadata), self.policy)))
			})
			.await
			.cloned()
	}

	/// The session's lookup, if the metadata has been loaded already.
	pub(crate) fn loaded_lookup(&self) -> Option<&Arc<Lookup>> {
		self.lookup.get()
	}
}

/// Client for a Substrate node.
///
/// The client owns the RPC collaborator and the session's metadata; the services it hands out
/// only hold weak references to them. Once the client is dropped, service operations return
/// `Ok(None)`.
///
/// # Example
///
/// ```ignore
/// use substrate_client::{ClientConfig, SubstrateClient};
///
/// let client = SubstrateClient::connect(&ClientConfig::default()).await?;
/// let epoch: Option<u64> = client.constants().fetch("Babe", "EpochDuration").await?;
/// ```
#[derive(Clone)]
pub struct SubstrateClient {
	inner: Arc<ClientInner>,
}

impl SubstrateClient {
	/// Create a client over `rpc`, matching names under `policy`.
	pub fn new(rpc: Arc<dyn ChainRpc>, policy: NamingPolicy) -> Self {
		Self { inner: Arc::new(ClientInner { rpc, policy, lookup: OnceCell::new() }) }
	}

	/// Connect to the node configured in `config`.
	pub async fn connect(config: &ClientConfig) -> Result<Self, RpcClientError> {
		let rpc = RpcClient::connect(&config.endpoint).await?;
		Ok(Self::new(Arc::new(rpc), config.naming_policy))
	}

	/// Policy names are matched under.
	pub fn naming_policy(&self) -> NamingPolicy {
		self.inner.policy
	}

	/// The RPC collaborator.
	pub fn rpc(&self) -> &Arc<dyn ChainRpc> {
		&self.inner.rpc
	}

	/// Lookup over the runtime metadata, fetched once per client.
	pub async fn lookup(&self) -> Result<Arc<Lookup>, MetadataError> {
		self.inner.lookup().await
	}

	/// Service decoding module constants.
	pub fn constants(&self) -> ConstantsService {
		ConstantsService::new(Arc::downgrade(&self.inner))
	}

	/// Service reading runtime storage.
	pub fn storage(&self) -> StorageService {
		StorageService::new(Arc::downgrade(&self.inner))
	}

	/// Service building extrinsics.
	pub fn extrinsics(&self) -> ExtrinsicsService {
		ExtrinsicsService::new(Arc::downgrade(&self.inner))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{MockMethod, MockRpc, runtime_metadata};
	use anyhow::Result;

	#[tokio::test]
	async fn lookup_is_memoized() -> Result<()> {
		let rpc = Arc::new(MockRpc::new(runtime_metadata()?));
		let client = SubstrateClient::new(rpc.clone(), NamingPolicy::Exact);
		let first = client.lookup().await?;
		let second = client.lookup().await?;
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(first.policy(), NamingPolicy::Exact);
		assert_eq!(rpc.calls(MockMethod::Metadata), 1);
		Ok(())
	}

	#[tokio::test]
	async fn failed_metadata_load_is_retried_on_next_use() -> Result<()> {
		let rpc = Arc::new(MockRpc::new(runtime_metadata()?));
		rpc.fail(MockMethod::Metadata);
		let client = SubstrateClient::new(rpc.clone(), NamingPolicy::Normalized);
		assert!(matches!(client.lookup().await, Err(MetadataError::RpcError(_))));

		rpc.recover(MockMethod::Metadata);
		client.lookup().await?;
		assert_eq!(rpc.calls(MockMethod::Metadata), 2);
		Ok(())
	}

	#[tokio::test]
	async fn services_do_not_keep_the_client_alive() -> Result<()> {
		let rpc = Arc::new(MockRpc::new(runtime_metadata()?));
		let client = SubstrateClient::new(rpc.clone(), NamingPolicy::Normalized);
		let constants = client.constants();
		let storage = client.storage();
		drop(client);

		assert_eq!(constants.fetch::<u64>("Babe", "EpochDuration").await?, None);
		assert_eq!(storage.fetch_plain::<u32>("System", "Number").await?, None);
		assert_eq!(rpc.total_calls(), 0);
		Ok(())
	}

	#[tokio::test]
	async fn connect_to_invalid_endpoint_fails() {
		let config = ClientConfig { endpoint: "ws://127.0.0.1:19998".parse().unwrap(), ..Default::default() };
		assert!(matches!(
			SubstrateClient::connect(&config).await,
			Err(RpcClientError::ConnectionFailed { .. })
		));
	}
}
