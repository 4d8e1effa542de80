// SPDX-License-Identifier: GPL-3.0

//! String constants for the RPC client module.

/// JSON-RPC method names used for error reporting.
///
/// These match the actual RPC method names in the Polkadot SDK JSON-RPC specification.
pub mod methods {
	pub const CHAIN_GET_BLOCK_HASH: &str = "chain_getBlockHash";
	pub const STATE_GET_STORAGE: &str = "state_getStorage";
	pub const STATE_GET_RUNTIME_VERSION: &str = "state_getRuntimeVersion";
	pub const STATE_GET_METADATA: &str = "state_getMetadata";
}

/// Well-known storage identifiers.
pub mod storage_keys {
	/// Prefix of the `System` pallet storage.
	pub const SYSTEM: &str = "System";
	/// `System.Account` map holding nonces and balances.
	pub const ACCOUNT: &str = "Account";
}
