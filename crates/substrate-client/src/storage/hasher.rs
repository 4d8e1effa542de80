// SPDX-License-Identifier: GPL-3.0

use sp_core::{blake2_128, blake2_256, twox_64, twox_128, twox_256};

/// Hasher applied to a storage map key before it is appended to the item prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageHasher {
	Blake2_128,
	Blake2_256,
	/// `blake2_128(key) ++ key`.
	Blake2_128Concat,
	Twox128,
	Twox256,
	/// `twox_64(key) ++ key`.
	Twox64Concat,
	/// The key itself.
	Identity,
}

impl StorageHasher {
	/// Hash an encoded key.
	pub fn hash(&self, key: &[u8]) -> Vec<u8> {
		match self {
			StorageHasher::Blake2_128 => blake2_128(key).to_vec(),
			StorageHasher::Blake2_256 => blake2_256(key).to_vec(),
			StorageHasher::Blake2_128Concat => [blake2_128(key).as_slice(), key].concat(),
			StorageHasher::Twox128 => twox_128(key).to_vec(),
			StorageHasher::Twox256 => twox_256(key).to_vec(),
			StorageHasher::Twox64Concat => [twox_64(key).as_slice(), key].concat(),
			StorageHasher::Identity => key.to_vec(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn twox_128_of_pallet_prefix() {
		assert_eq!(hex::encode(StorageHasher::Twox128.hash(b"System")), "26aa394eea5630e07c48ae0c9558cef7");
		assert_eq!(hex::encode(StorageHasher::Twox128.hash(b"Number")), "02a5c1b19ab7a04f536c519aca4983ac");
	}

	#[test]
	fn concat_hashers_append_the_key() {
		let key = [7u8; 32];
		let hashed = StorageHasher::Blake2_128Concat.hash(&key);
		assert_eq!(hashed.len(), 48);
		assert_eq!(&hashed[..16], blake2_128(&key).as_slice());
		assert_eq!(&hashed[16..], key.as_slice());

		let hashed = StorageHasher::Twox64Concat.hash(&5u32.to_le_bytes());
		assert_eq!(hashed.len(), 12);
		assert_eq!(&hashed[8..], &[5, 0, 0, 0]);
		assert_eq!(StorageHasher::Identity.hash(&[1, 2]), vec![1, 2]);
	}

	#[test]
	fn fixed_size_hashers() {
		assert_eq!(StorageHasher::Blake2_128.hash(b"x").len(), 16);
		assert_eq!(StorageHasher::Blake2_256.hash(b"x").len(), 32);
		assert_eq!(StorageHasher::Twox256.hash(b"x").len(), 32);
	}
}
