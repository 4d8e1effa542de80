// SPDX-License-Identifier: GPL-3.0

//! Chain primitives shared by the services.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use substrate_codec::{Decoder, Error as CodecError};

/// Account balance.
pub type Balance = u128;

/// Account nonce.
pub type Index = u32;

/// 32-byte account identifier, the raw public key of the account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
	/// Raw identifier bytes.
	pub fn as_bytes(&self) -> &[u8; 32] {
		&self.0
	}
}

impl From<[u8; 32]> for AccountId {
	fn from(bytes: [u8; 32]) -> Self {
		AccountId(bytes)
	}
}

impl From<subxt_signer::sr25519::PublicKey> for AccountId {
	fn from(public: subxt_signer::sr25519::PublicKey) -> Self {
		AccountId(public.0)
	}
}

impl AsRef<[u8]> for AccountId {
	fn as_ref(&self) -> &[u8] {
		&self.0
	}
}

impl Display for AccountId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(self.0))
	}
}

/// 32-byte hash, such as a block hash. Encoded as its raw bytes without a length prefix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct H256(pub [u8; 32]);

impl H256 {
	/// Hash with every byte set to `byte`.
	pub const fn repeat_byte(byte: u8) -> Self {
		H256([byte; 32])
	}

	/// Raw hash bytes.
	pub fn as_bytes(&self) -> &[u8; 32] {
		&self.0
	}
}

impl From<[u8; 32]> for H256 {
	fn from(bytes: [u8; 32]) -> Self {
		H256(bytes)
	}
}

impl From<subxt::config::substrate::H256> for H256 {
	fn from(hash: subxt::config::substrate::H256) -> Self {
		H256(hash.0)
	}
}

impl AsRef<[u8]> for H256 {
	fn as_ref(&self) -> &[u8] {
		&self.0
	}
}

impl Display for H256 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(self.0))
	}
}

/// Versions of the runtime the node is currently executing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeVersion {
	/// Version of the runtime specification.
	pub spec_version: u32,
	/// Version of the extrinsic format accepted by the runtime.
	pub transaction_version: u32,
}

/// Value of the `System.Account` storage map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
	/// Number of transactions the account has sent.
	pub nonce: Index,
	pub consumers: u32,
	pub providers: u32,
	pub sufficients: u32,
	/// Balances held by the account.
	pub data: AccountData,
}

impl AccountInfo {
	/// Decodes a `System.Account` value.
	///
	/// Only the leading nonce is required. The reference counters and balances are read when the
	/// value carries them in the usual layout and left at zero otherwise, so runtimes with a
	/// custom account data type still yield a nonce.
	pub fn decode_lenient(bytes: &[u8]) -> Result<Self, CodecError> {
		let mut decoder = Decoder::new(bytes);
		let mut info = AccountInfo { nonce: decoder.decode()?, ..Default::default() };
		let Ok((consumers, providers, sufficients)) = decoder.decode::<(u32, u32, u32)>() else {
			return Ok(info);
		};
		info.consumers = consumers;
		info.providers = providers;
		info.sufficients = sufficients;
		if let Ok(data) = decoder.decode::<AccountData>() {
			info.data = data;
		}
		Ok(info)
	}
}

/// Balances part of [`AccountInfo`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountData {
	pub free: Balance,
	pub reserved: Balance,
	pub frozen: Balance,
	pub flags: u128,
}
