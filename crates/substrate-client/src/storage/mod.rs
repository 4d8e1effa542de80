// SPDX-License-Identifier: GPL-3.0

//! Typed access to runtime storage.
//!
//! A storage item is addressed by `twox128(prefix) ++ twox128(item) ++ hasher(key)...`, with one
//! hasher per key the item declares. The value is decoded with the layout of the item's value
//! type, so callers only need a `Deserialize` type whose field names match the runtime's.

mod hasher;

pub use hasher::StorageHasher;

use crate::{
	client::ClientInner,
	error::StorageError,
	lookup::{Lookup, StorageItemRef},
	metadata::RuntimeModuleStorageItem,
};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Weak;
use substrate_codec::Layouts;

/// A storage item with the prefix of the module storage declaring it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoundStorageItem {
	/// Module name as declared in metadata.
	pub module: String,
	/// Storage prefix of the module.
	pub prefix: String,
	pub item: RuntimeModuleStorageItem,
}

impl From<StorageItemRef<'_>> for FoundStorageItem {
	fn from(found: StorageItemRef<'_>) -> Self {
		Self {
			module: found.module.name.clone(),
			prefix: found.storage.prefix.clone(),
			item: found.item.clone(),
		}
	}
}

/// Reads storage items by module and item name.
///
/// Every operation returns `Ok(None)` when the item does not exist or the client has been dropped.
#[derive(Clone)]
pub struct StorageService {
	client: Weak<ClientInner>,
}

impl StorageService {
	pub(crate) fn new(client: Weak<ClientInner>) -> Self {
		Self { client }
	}

	/// Find the storage item `item` of module `module`.
	pub async fn find(&self, module: &str, item: &str) -> Result<Option<FoundStorageItem>, StorageError> {
		let Some(client) = self.client.upgrade() else { return Ok(None) };
		let lookup = client.lookup().await?;
		Ok(lookup.find_storage_item(module, item).map(Into::into))
	}

	/// Storage key of `module.item` for the encoded `keys`.
	///
	/// # Arguments
	/// * `module` - Module declaring the item.
	/// * `item` - Storage item name.
	/// * `keys` - One encoded key per hasher declared by the item, empty for plain values.
	pub async fn storage_key(
		&self,
		module: &str,
		item: &str,
		keys: &[Vec<u8>],
	) -> Result<Option<Vec<u8>>, StorageError> {
		let Some(client) = self.client.upgrade() else { return Ok(None) };
		let lookup = client.lookup().await?;
		let Some(found) = lookup.find_storage_item(module, item) else { return Ok(None) };
		item_key(&lookup, &found, keys).map(Some)
	}

	/// Fetch and decode the value of `module.item` under the encoded `keys`.
	///
	/// When the node has no value and the item declares a default, the default is decoded.
	pub async fn fetch<T: DeserializeOwned>(
		&self,
		module: &str,
		item: &str,
		keys: &[Vec<u8>],
	) -> Result<Option<T>, StorageError> {
		let Some(client) = self.client.upgrade() else { return Ok(None) };
		let lookup = client.lookup().await?;
		let Some(found) = lookup.find_storage_item(module, item) else {
			log::debug!(target: "substrate_client", "storage item {module}.{item} not found");
			return Ok(None);
		};
		fetch_item(&client, &lookup, &found, keys).await
	}

	/// Fetch a plain storage value.
	pub async fn fetch_plain<T: DeserializeOwned>(
		&self,
		module: &str,
		item: &str,
	) -> Result<Option<T>, StorageError> {
		self.fetch(module, item, &[]).await
	}

	/// Fetch the value of a single-key map at `key`.
	///
	/// The key is encoded with the layout of the item's key type.
	pub async fn fetch_with_key<K: Serialize + ?Sized, T: DeserializeOwned>(
		&self,
		module: &str,
		item: &str,
		key: &K,
	) -> Result<Option<T>, StorageError> {
		let Some(client) = self.client.upgrade() else { return Ok(None) };
		let lookup = client.lookup().await?;
		let Some(found) = lookup.find_storage_item(module, item) else { return Ok(None) };

		let empty = Layouts::new();
		let layouts = found.item.key_types.first().and_then(|ty| lookup.layouts(*ty)).unwrap_or(&empty);
		let key = substrate_codec::to_bytes_with(key, layouts, lookup.policy())
			.map_err(StorageError::KeyEncoding)?;
		fetch_item(&client, &lookup, &found, &[key]).await
	}
}

/// Key of `found` for the encoded `keys`, checked against the item's hashers and key types.
fn item_key(lookup: &Lookup, found: &StorageItemRef<'_>, keys: &[Vec<u8>]) -> Result<Vec<u8>, StorageError> {
	let hashers = &found.item.hashers;
	if hashers.len() != keys.len() {
		return Err(StorageError::KeyCountMismatch {
			module: found.module.name.clone(),
			item: found.item.name.clone(),
			expected: hashers.len(),
			found: keys.len(),
		});
	}
	let types = lookup.metadata().types();
	for (index, (ty, part)) in found.item.key_types.iter().zip(keys).enumerate() {
		types.check(*ty, part).map_err(|source| StorageError::InvalidKey {
			module: found.module.name.clone(),
			item: found.item.name.clone(),
			index,
			source,
		})?;
	}
	let mut key = StorageHasher::Twox128.hash(found.storage.prefix.as_bytes());
	key.extend(StorageHasher::Twox128.hash(found.item.name.as_bytes()));
	for (hasher, part) in hashers.iter().zip(keys) {
		key.extend(hasher.hash(part));
	}
	Ok(key)
}

async fn fetch_item<T: DeserializeOwned>(
	client: &ClientInner,
	lookup: &Lookup,
	found: &StorageItemRef<'_>,
	keys: &[Vec<u8>],
) -> Result<Option<T>, StorageError> {
	let key = item_key(lookup, found, keys)?;
	log::debug!(
		target: "substrate_client",
		"fetching {}.{} at 0x{}",
		found.module.name,
		found.item.name,
		hex::encode(&key)
	);
	let bytes = match client.rpc.storage(&key).await? {
		Some(bytes) => bytes,
		None => match &found.item.default {
			Some(default) => {
				log::trace!(target: "substrate_client", "no value, decoding the declared default");
				default.clone()
			},
			None => return Ok(None),
		},
	};

	let empty = Layouts::new();
	let layouts = lookup.layouts(found.item.value_type).unwrap_or(&empty);
	substrate_codec::from_bytes_with(&bytes, layouts, lookup.policy())
		.map(Some)
		.map_err(|source| StorageError::Decode {
			module: found.module.name.clone(),
			item: found.item.name.clone(),
			source,
		})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		AccountId, AccountInfo, H256, SubstrateClient,
		testing::{ALICE, MockMethod, MockRpc, runtime_metadata},
	};
	use anyhow::Result;
	use serde::Deserialize;
	use std::sync::Arc;
	use substrate_codec::NamingPolicy;

	fn setup() -> Result<(Arc<MockRpc>, SubstrateClient)> {
		let rpc = Arc::new(MockRpc::new(runtime_metadata()?));
		let client = SubstrateClient::new(rpc.clone(), NamingPolicy::Normalized);
		Ok((rpc, client))
	}

	#[tokio::test]
	async fn finds_items_with_their_prefix() -> Result<()> {
		let (_, client) = setup()?;
		let found = client.storage().find("system", "account").await?;
		let found = found.ok_or_else(|| anyhow::anyhow!("item not found"))?;
		assert_eq!(found.module, "System");
		assert_eq!(found.prefix, "System");
		assert_eq!(found.item.hashers, vec![StorageHasher::Blake2_128Concat]);
		assert_eq!(client.storage().find("System", "Accounts").await?, None);
		Ok(())
	}

	#[tokio::test]
	async fn storage_key_hashes_prefix_item_and_keys() -> Result<()> {
		let (_, client) = setup()?;
		let key = client
			.storage()
			.storage_key("System", "Account", &[ALICE.to_vec()])
			.await?
			.ok_or_else(|| anyhow::anyhow!("item not found"))?;
		assert_eq!(key, crate::rpc::account_storage_key(&AccountId(ALICE)));

		let key = client
			.storage()
			.storage_key("Assets", "Account", &[7u32.to_le_bytes().to_vec(), ALICE.to_vec()])
			.await?
			.ok_or_else(|| anyhow::anyhow!("item not found"))?;
		assert_eq!(key.len(), 32 + 16 + 4 + 16 + 32);
		assert_eq!(&key[48..52], &7u32.to_le_bytes());
		Ok(())
	}

	#[tokio::test]
	async fn fetches_map_values() -> Result<()> {
		let (rpc, client) = setup()?;
		let info = AccountInfo { nonce: 4, providers: 1, ..Default::default() };
		rpc.insert_account(AccountId(ALICE), info);

		let fetched: Option<AccountInfo> =
			client.storage().fetch_with_key("System", "Account", &AccountId(ALICE)).await?;
		assert_eq!(fetched, Some(info));
		assert_eq!(rpc.calls(MockMethod::Storage), 1);
		Ok(())
	}

	#[tokio::test]
	async fn fields_are_matched_by_name() -> Result<()> {
		#[derive(Debug, Deserialize, PartialEq)]
		struct AccountData {
			frozen: u128,
			reserved: u128,
			flags: u128,
			free: u128,
		}

		#[derive(Debug, Deserialize, PartialEq)]
		struct Info {
			data: AccountData,
			sufficients: u32,
			providers: u32,
			consumers: u32,
			nonce: u32,
		}

		let (rpc, client) = setup()?;
		let mut info = AccountInfo { nonce: 2, ..Default::default() };
		info.data.free = 500;
		info.data.frozen = 7;
		rpc.insert_account(AccountId(ALICE), info);

		let fetched: Option<Info> =
			client.storage().fetch("System", "Account", &[ALICE.to_vec()]).await?;
		let fetched = fetched.ok_or_else(|| anyhow::anyhow!("no value"))?;
		assert_eq!(fetched.nonce, 2);
		assert_eq!(fetched.data.free, 500);
		assert_eq!(fetched.data.frozen, 7);
		Ok(())
	}

	#[tokio::test]
	async fn missing_value_decodes_declared_default() -> Result<()> {
		let (_, client) = setup()?;
		let number: Option<u32> = client.storage().fetch_plain("System", "Number").await?;
		assert_eq!(number, Some(0));
		// Assets.Account declares no default.
		let balance: Option<u128> =
			client.storage().fetch("Assets", "Account", &[vec![0; 4], ALICE.to_vec()]).await?;
		assert_eq!(balance, None);
		Ok(())
	}

	#[tokio::test]
	async fn wrong_key_count_fails_without_network() -> Result<()> {
		let (rpc, client) = setup()?;
		let result: Result<Option<AccountInfo>, _> = client.storage().fetch_plain("System", "Account").await;
		assert_eq!(
			result,
			Err(StorageError::KeyCountMismatch {
				module: "System".into(),
				item: "Account".into(),
				expected: 1,
				found: 0,
			})
		);
		assert_eq!(rpc.calls(MockMethod::Storage), 0);
		Ok(())
	}

	#[tokio::test]
	async fn keys_must_match_their_types() -> Result<()> {
		let (rpc, client) = setup()?;
		let result = client.storage().storage_key("System", "Account", &[ALICE[..31].to_vec()]).await;
		assert!(
			matches!(
				&result,
				Err(StorageError::InvalidKey { index: 0, source: substrate_codec::Error::UnexpectedEof { .. }, .. })
			),
			"{result:?}"
		);
		let result: Result<Option<u128>, _> =
			client.storage().fetch("Assets", "Account", &[vec![0; 5], ALICE.to_vec()]).await;
		assert!(
			matches!(
				&result,
				Err(StorageError::InvalidKey { index: 0, source: substrate_codec::Error::TrailingBytes { .. }, .. })
			),
			"{result:?}"
		);
		assert_eq!(rpc.calls(MockMethod::Storage), 0);
		Ok(())
	}

	#[tokio::test]
	async fn hashes_decode_from_raw_bytes() -> Result<()> {
		let (rpc, client) = setup()?;
		let key = client
			.storage()
			.storage_key("System", "BlockHash", &[0u32.to_le_bytes().to_vec()])
			.await?
			.ok_or_else(|| anyhow::anyhow!("item not found"))?;
		rpc.insert_storage(key, vec![0x91; 32]);

		let genesis: Option<H256> = client.storage().fetch_with_key("System", "BlockHash", &0u32).await?;
		assert_eq!(genesis, Some(H256::repeat_byte(0x91)));
		let unknown: Option<H256> = client.storage().fetch_with_key("System", "BlockHash", &1u32).await?;
		assert_eq!(unknown, Some(H256::default()));
		Ok(())
	}

	#[tokio::test]
	async fn undecodable_value_is_a_failure() -> Result<()> {
		let (rpc, client) = setup()?;
		let key = client
			.storage()
			.storage_key("System", "Number", &[])
			.await?
			.ok_or_else(|| anyhow::anyhow!("item not found"))?;
		rpc.insert_storage(key, vec![1, 2]);
		let result: Result<Option<u32>, _> = client.storage().fetch_plain("System", "Number").await;
		assert!(matches!(result, Err(StorageError::Decode { .. })), "{result:?}");
		Ok(())
	}
}
