// SPDX-License-Identifier: GPL-3.0

use crate::primitives::{H256, RuntimeVersion};

/// Extrinsic format version 4, with the signed bit set.
pub const SIGNED_MARKER: u8 = 0x84;
/// Extrinsic format version 4, unsigned.
pub const UNSIGNED_MARKER: u8 = 0x04;

/// Data mixed into the signing payload that is not part of the extrinsic itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtrinsicAdditional {
	pub spec_version: u32,
	pub tx_version: u32,
	pub genesis_hash: H256,
	/// Hash of the block the era is counted from; the genesis hash for immortal eras.
	pub mortality_checkpoint: H256,
	/// Format marker written in front of the signed extrinsic.
	pub marker: u8,
}

impl ExtrinsicAdditional {
	/// Additional data of a signed v4 extrinsic.
	///
	/// The checkpoint defaults to `genesis_hash`.
	pub fn new(version: RuntimeVersion, genesis_hash: H256, checkpoint: Option<H256>) -> Self {
		Self {
			spec_version: version.spec_version,
			tx_version: version.transaction_version,
			genesis_hash,
			mortality_checkpoint: checkpoint.unwrap_or(genesis_hash),
			marker: SIGNED_MARKER,
		}
	}

	/// Append `spec_version ++ tx_version ++ genesis_hash ++ mortality_checkpoint` to `out`.
	pub fn encode_to(&self, out: &mut Vec<u8>) {
		out.extend_from_slice(&self.spec_version.to_le_bytes());
		out.extend_from_slice(&self.tx_version.to_le_bytes());
		out.extend_from_slice(self.genesis_hash.as_bytes());
		out.extend_from_slice(self.mortality_checkpoint.as_bytes());
	}
}
