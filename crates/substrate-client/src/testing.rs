// SPDX-License-Identifier: GPL-3.0

//! Shared testing utilities.
//!
//! [`MockRpc`] is an in-memory [`ChainRpc`] that counts the requests it serves and fails the
//! methods it is told to fail. [`runtime_metadata`] builds a small runtime shaped like a
//! Polkadot SDK relay chain.

use crate::{
	error::{MetadataError, RpcClientError},
	metadata::{
		Field, Primitive, RuntimeMetadata, RuntimeModule, RuntimeModuleStorage, RuntimeModuleStorageItem,
		RuntimeType, RuntimeTypeDef, TypeId, TypeRegistry, Variant,
	},
	primitives::{AccountId, AccountInfo, H256, RuntimeVersion},
	rpc::{ChainRpc, account_storage_key},
	storage::StorageHasher,
	strings::rpc::methods,
};
use async_trait::async_trait;
use std::{
	collections::{HashMap, HashSet},
	sync::{
		Mutex, PoisonError,
		atomic::{AtomicUsize, Ordering},
	},
};

/// Alice's public key (Sr25519).
pub const ALICE: [u8; 32] = [
	0xd4, 0x35, 0x93, 0xc7, 0x15, 0xfd, 0xd3, 0x1c, 0x61, 0x14, 0x1a, 0xbd, 0x04, 0xa9, 0x9f, 0xd6,
	0x82, 0x2c, 0x85, 0x58, 0x85, 0x4c, 0xcd, 0xe3, 0x9a, 0x56, 0x84, 0xe7, 0xa5, 0x6d, 0xa2, 0x7d,
];

/// Bob's public key (Sr25519).
pub const BOB: [u8; 32] = [
	0x8e, 0xaf, 0x04, 0x15, 0x16, 0x87, 0x73, 0x63, 0x26, 0xc9, 0xfe, 0xa1, 0x7e, 0x25, 0xfc, 0x52,
	0x87, 0x61, 0x36, 0x93, 0xc9, 0x12, 0x90, 0x9c, 0xb2, 0x26, 0xaa, 0x47, 0x94, 0xf2, 0x6a, 0x48,
];

/// Methods of [`ChainRpc`], as counted by [`MockRpc`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MockMethod {
	BlockHash,
	Storage,
	RuntimeVersion,
	AccountInfo,
	Metadata,
}

impl MockMethod {
	const ALL: [MockMethod; 5] = [
		MockMethod::BlockHash,
		MockMethod::Storage,
		MockMethod::RuntimeVersion,
		MockMethod::AccountInfo,
		MockMethod::Metadata,
	];

	fn rpc_method(&self) -> &'static str {
		match self {
			MockMethod::BlockHash => methods::CHAIN_GET_BLOCK_HASH,
			MockMethod::Storage | MockMethod::AccountInfo => methods::STATE_GET_STORAGE,
			MockMethod::RuntimeVersion => methods::STATE_GET_RUNTIME_VERSION,
			MockMethod::Metadata => methods::STATE_GET_METADATA,
		}
	}
}

/// In-memory node.
pub struct MockRpc {
	metadata: RuntimeMetadata,
	genesis_hash: H256,
	version: RuntimeVersion,
	storage: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
	failing: Mutex<HashSet<MockMethod>>,
	calls: [AtomicUsize; 5],
}

impl MockRpc {
	/// A node serving `metadata` with empty storage.
	pub fn new(metadata: RuntimeMetadata) -> Self {
		Self {
			metadata,
			genesis_hash: H256::repeat_byte(0x91),
			version: RuntimeVersion { spec_version: 1_006_001, transaction_version: 26 },
			storage: Mutex::default(),
			failing: Mutex::default(),
			calls: Default::default(),
		}
	}

	/// Hash served for block zero.
	pub fn genesis_hash(&self) -> H256 {
		self.genesis_hash
	}

	/// Runtime version served.
	pub fn runtime_version(&self) -> RuntimeVersion {
		self.version
	}

	/// Store `value` under the raw storage `key`.
	pub fn insert_storage(&self, key: Vec<u8>, value: Vec<u8>) {
		self.storage.lock().unwrap_or_else(PoisonError::into_inner).insert(key, value);
	}

	/// Store the `System.Account` entry of `account`.
	pub fn insert_account(&self, account: AccountId, info: AccountInfo) {
		let value = substrate_codec::to_bytes(&info).unwrap_or_default();
		self.insert_storage(account_storage_key(&account), value);
	}

	/// Make every following request to `method` fail.
	pub fn fail(&self, method: MockMethod) {
		self.failing.lock().unwrap_or_else(PoisonError::into_inner).insert(method);
	}

	/// Serve `method` again.
	pub fn recover(&self, method: MockMethod) {
		self.failing.lock().unwrap_or_else(PoisonError::into_inner).remove(&method);
	}

	/// Number of requests served to `method`, failed ones included.
	pub fn calls(&self, method: MockMethod) -> usize {
		self.calls[method as usize].load(Ordering::SeqCst)
	}

	/// Number of requests served to any method.
	pub fn total_calls(&self) -> usize {
		MockMethod::ALL.iter().map(|method| self.calls(*method)).sum()
	}

	async fn serve(&self, method: MockMethod) -> Result<(), RpcClientError> {
		self.calls[method as usize].fetch_add(1, Ordering::SeqCst);
		// Give concurrent requests a chance to interleave.
		tokio::task::yield_now().await;
		if self.failing.lock().unwrap_or_else(PoisonError::into_inner).contains(&method) {
			return Err(RpcClientError::RequestFailed {
				method: method.rpc_method(),
				message: "injected failure".to_string(),
			});
		}
		Ok(())
	}

	fn stored(&self, key: &[u8]) -> Option<Vec<u8>> {
		self.storage.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
	}
}

#[async_trait]
impl ChainRpc for MockRpc {
	async fn block_hash(&self, number: u64) -> Result<Option<H256>, RpcClientError> {
		self.serve(MockMethod::BlockHash).await?;
		Ok((number == 0).then_some(self.genesis_hash))
	}

	async fn storage(&self, key: &[u8]) -> Result<Option<Vec<u8>>, RpcClientError> {
		self.serve(MockMethod::Storage).await?;
		Ok(self.stored(key))
	}

	async fn runtime_version(&self) -> Result<RuntimeVersion, RpcClientError> {
		self.serve(MockMethod::RuntimeVersion).await?;
		Ok(self.version)
	}

	async fn account_info(&self, account: &AccountId) -> Result<Option<AccountInfo>, RpcClientError> {
		self.serve(MockMethod::AccountInfo).await?;
		self.stored(&account_storage_key(account))
			.map(|bytes| AccountInfo::decode_lenient(&bytes))
			.transpose()
			.map_err(|e| RpcClientError::InvalidResponse(format!("account {account}: {e}")))
	}

	async fn metadata(&self) -> Result<RuntimeMetadata, MetadataError> {
		self.serve(MockMethod::Metadata).await?;
		Ok(self.metadata.clone())
	}
}

/// Ids of the types declared by [`runtime_metadata`].
mod ty {
	use super::TypeId;

	pub const U8: TypeId = 0;
	pub const U16: TypeId = 1;
	pub const U32: TypeId = 2;
	pub const U64: TypeId = 3;
	pub const U128: TypeId = 4;
	pub const BYTES_32: TypeId = 5;
	pub const ACCOUNT_ID: TypeId = 6;
	pub const BYTES: TypeId = 7;
	pub const COMPACT_U32: TypeId = 8;
	pub const COMPACT_U128: TypeId = 9;
	pub const MULTI_ADDRESS: TypeId = 10;
	pub const BYTES_20: TypeId = 11;
	pub const ACCOUNT_DATA: TypeId = 12;
	pub const ACCOUNT_INFO: TypeId = 13;
	pub const SYSTEM_CALL: TypeId = 14;
	pub const BALANCES_CALL: TypeId = 15;
	pub const HASH: TypeId = 16;
}

/// A runtime with `System` (0), `Babe` (1), `Balances` (5) and `Assets` (50).
///
/// - `System`: calls `remark` and `set_heap_pages`, constants `BlockHashCount` and `SS58Prefix`,
///   storage `Account` and `BlockHash` (maps) and `Number` (value), all with defaults.
/// - `Babe`: constant `EpochDuration` = 600, no calls.
/// - `Balances`: calls `transfer_allow_death` (0), `force_transfer` (2) and
///   `transfer_keep_alive` (3), constant `ExistentialDeposit`, storage `TotalIssuance`.
/// - `Assets`: storage `Account`, a double map without default.
pub fn runtime_metadata() -> Result<RuntimeMetadata, MetadataError> {
	use RuntimeTypeDef as Def;

	let transfer_fields = || vec![Field::named("dest", ty::MULTI_ADDRESS), Field::named("value", ty::COMPACT_U128)];
	let types = vec![
		RuntimeType::new(ty::U8, Def::Primitive(Primitive::U8)),
		RuntimeType::new(ty::U16, Def::Primitive(Primitive::U16)),
		RuntimeType::new(ty::U32, Def::Primitive(Primitive::U32)),
		RuntimeType::new(ty::U64, Def::Primitive(Primitive::U64)),
		RuntimeType::new(ty::U128, Def::Primitive(Primitive::U128)),
		RuntimeType::new(ty::BYTES_32, Def::Array { len: 32, element: ty::U8 }),
		RuntimeType::new(ty::ACCOUNT_ID, Def::Composite(vec![Field::unnamed(ty::BYTES_32)]))
			.with_path(["sp_core", "crypto", "AccountId32"]),
		RuntimeType::new(ty::BYTES, Def::Sequence(ty::U8)),
		RuntimeType::new(ty::COMPACT_U32, Def::Compact(ty::U32)),
		RuntimeType::new(ty::COMPACT_U128, Def::Compact(ty::U128)),
		RuntimeType::new(
			ty::MULTI_ADDRESS,
			Def::Variant(vec![
				Variant::new("Id", 0, vec![Field::unnamed(ty::ACCOUNT_ID)]),
				Variant::new("Index", 1, vec![Field::unnamed(ty::COMPACT_U32)]),
				Variant::new("Raw", 2, vec![Field::unnamed(ty::BYTES)]),
				Variant::new("Address32", 3, vec![Field::unnamed(ty::BYTES_32)]),
				Variant::new("Address20", 4, vec![Field::unnamed(ty::BYTES_20)]),
			]),
		)
		.with_path(["sp_runtime", "multiaddress", "MultiAddress"]),
		RuntimeType::new(ty::BYTES_20, Def::Array { len: 20, element: ty::U8 }),
		RuntimeType::new(
			ty::ACCOUNT_DATA,
			Def::Composite(vec![
				Field::named("free", ty::U128),
				Field::named("reserved", ty::U128),
				Field::named("frozen", ty::U128),
				Field::named("flags", ty::U128),
			]),
		)
		.with_path(["pallet_balances", "types", "AccountData"]),
		RuntimeType::new(
			ty::ACCOUNT_INFO,
			Def::Composite(vec![
				Field::named("nonce", ty::U32),
				Field::named("consumers", ty::U32),
				Field::named("providers", ty::U32),
				Field::named("sufficients", ty::U32),
				Field::named("data", ty::ACCOUNT_DATA),
			]),
		)
		.with_path(["frame_system", "AccountInfo"]),
		RuntimeType::new(
			ty::SYSTEM_CALL,
			Def::Variant(vec![
				Variant::new("remark", 0, vec![Field::named("remark", ty::BYTES)]),
				Variant::new("set_heap_pages", 1, vec![Field::named("pages", ty::U64)]),
			]),
		)
		.with_path(["frame_system", "pallet", "Call"]),
		RuntimeType::new(
			ty::BALANCES_CALL,
			Def::Variant(vec![
				Variant::new("transfer_allow_death", 0, transfer_fields()),
				Variant::new(
					"force_transfer",
					2,
					vec![
						Field::named("source", ty::MULTI_ADDRESS),
						Field::named("dest", ty::MULTI_ADDRESS),
						Field::named("value", ty::COMPACT_U128),
					],
				),
				Variant::new("transfer_keep_alive", 3, transfer_fields()),
			]),
		)
		.with_path(["pallet_balances", "pallet", "Call"]),
		RuntimeType::new(ty::HASH, Def::Composite(vec![Field::unnamed(ty::BYTES_32)]))
			.with_path(["primitive_types", "H256"]),
	];

	let system = RuntimeModule::new("System", 0)
		.with_calls(ty::SYSTEM_CALL)
		.with_constant("BlockHashCount", ty::U32, 4096u32.to_le_bytes().to_vec())
		.with_constant("SS58Prefix", ty::U16, 42u16.to_le_bytes().to_vec())
		.with_storage(RuntimeModuleStorage {
			prefix: "System".into(),
			items: vec![
				RuntimeModuleStorageItem::map(
					"Account",
					[(StorageHasher::Blake2_128Concat, ty::ACCOUNT_ID)],
					ty::ACCOUNT_INFO,
				)
				.with_default(vec![0; 80]),
				RuntimeModuleStorageItem::plain("Number", ty::U32).with_default(vec![0; 4]),
				RuntimeModuleStorageItem::map("BlockHash", [(StorageHasher::Twox64Concat, ty::U32)], ty::HASH)
					.with_default(vec![0; 32]),
			],
		});
	let babe = RuntimeModule::new("Babe", 1).with_constant("EpochDuration", ty::U64, 600u64.to_le_bytes().to_vec());
	let balances = RuntimeModule::new("Balances", 5)
		.with_calls(ty::BALANCES_CALL)
		.with_constant("ExistentialDeposit", ty::U128, 10_000_000_000u128.to_le_bytes().to_vec())
		.with_storage(RuntimeModuleStorage {
			prefix: "Balances".into(),
			items: vec![RuntimeModuleStorageItem::plain("TotalIssuance", ty::U128).with_default(vec![0; 16])],
		});
	let assets = RuntimeModule::new("Assets", 50).with_storage(RuntimeModuleStorage {
		prefix: "Assets".into(),
		items: vec![RuntimeModuleStorageItem::map(
			"Account",
			[(StorageHasher::Blake2_128Concat, ty::U32), (StorageHasher::Blake2_128Concat, ty::ACCOUNT_ID)],
			ty::U128,
		)],
	});

	RuntimeMetadata::new(TypeRegistry::new(types)?, vec![system, babe, balances, assets])
}
