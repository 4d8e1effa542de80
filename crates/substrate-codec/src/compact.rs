// SPDX-License-Identifier: GPL-3.0

//! Compact (variable-length) unsigned integers.
//!
//! The two low bits of the first byte select the mode:
//!
//! | mode   | range             | bytes                          |
//! |--------|-------------------|--------------------------------|
//! | `0b00` | `0..2^6`          | 1                              |
//! | `0b01` | `2^6..2^14`       | 2                              |
//! | `0b10` | `2^14..2^30`      | 4                              |
//! | `0b11` | `2^30..`          | 1 + n, upper six bits = n - 4  |

use crate::{Error, Reader};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::{fmt, marker::PhantomData};

/// Newtype name the SCALE encoder and decoder recognise as "encode the inner integer compactly".
///
/// Other serde formats see a plain newtype around a `u128`.
pub const COMPACT_TOKEN: &str = "$substrate_codec::Compact";

const MODE_0_MAX: u128 = (1 << 6) - 1;
const MODE_1_MAX: u128 = (1 << 14) - 1;
const MODE_2_MAX: u128 = (1 << 30) - 1;

/// Compactly encoded unsigned integer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Compact<T>(pub T);

/// Unsigned integers that can be wrapped in [`Compact`].
pub trait CompactInt: Copy + Into<u128> + TryFrom<u128> {
	/// Type name used in error messages.
	const NAME: &'static str;
}

macro_rules! compact_int {
	($($ty:ty),*) => {
		$(impl CompactInt for $ty {
			const NAME: &'static str = stringify!($ty);
		})*
	};
}

compact_int!(u8, u16, u32, u64, u128);

impl<T> From<T> for Compact<T> {
	fn from(value: T) -> Self {
		Compact(value)
	}
}

/// Number of bytes `value` occupies once compactly encoded.
pub fn encoded_len(value: u128) -> usize {
	match value {
		0..=MODE_0_MAX => 1,
		0..=MODE_1_MAX => 2,
		0..=MODE_2_MAX => 4,
		_ => 1 + significant_bytes(value),
	}
}

/// Append the compact encoding of `value` to `out`.
pub fn encode(value: u128, out: &mut Vec<u8>) {
	match value {
		0..=MODE_0_MAX => out.push((value as u8) << 2),
		0..=MODE_1_MAX => out.extend_from_slice(&(((value as u16) << 2) | 0b01).to_le_bytes()),
		0..=MODE_2_MAX => out.extend_from_slice(&(((value as u32) << 2) | 0b10).to_le_bytes()),
		_ => {
			let len = significant_bytes(value);
			out.push((((len - 4) as u8) << 2) | 0b11);
			out.extend_from_slice(&value.to_le_bytes()[..len]);
		},
	}
}

/// Read a compact integer from the cursor.
///
/// Non-canonical encodings (a value that fits in a smaller mode, or a big-integer payload with a
/// zero most significant byte) are rejected.
pub fn decode(reader: &mut Reader<'_>) -> Result<u128, Error> {
	let position = reader.position();
	let first = reader.read_u8("compact integer")?;
	let invalid = || Error::InvalidCompact { position };
	match first & 0b11 {
		0b00 => Ok(u128::from(first >> 2)),
		0b01 => {
			let second = reader.read_u8("compact integer")?;
			let value = u128::from(u16::from_le_bytes([first, second]) >> 2);
			if value <= MODE_0_MAX { Err(invalid()) } else { Ok(value) }
		},
		0b10 => {
			let [b1, b2, b3] = reader.read_array::<3>("compact integer")?;
			let value = u128::from(u32::from_le_bytes([first, b1, b2, b3]) >> 2);
			if value <= MODE_1_MAX { Err(invalid()) } else { Ok(value) }
		},
		_ => {
			let len = usize::from(first >> 2) + 4;
			if len > 16 {
				return Err(invalid());
			}
			let payload = reader.read_bytes(len, "compact integer")?;
			if payload[len - 1] == 0 {
				return Err(invalid());
			}
			let mut buffer = [0u8; 16];
			buffer[..len].copy_from_slice(payload);
			let value = u128::from_le_bytes(buffer);
			if value <= MODE_2_MAX { Err(invalid()) } else { Ok(value) }
		},
	}
}

fn significant_bytes(value: u128) -> usize {
	16 - (value.leading_zeros() / 8) as usize
}

impl<T: CompactInt> Serialize for Compact<T> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let value: u128 = self.0.into();
		serializer.serialize_newtype_struct(COMPACT_TOKEN, &value)
	}
}

impl<'de, T: CompactInt> Deserialize<'de> for Compact<T> {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		deserializer.deserialize_newtype_struct(COMPACT_TOKEN, CompactVisitor(PhantomData))
	}
}

struct CompactVisitor<T>(PhantomData<T>);

impl<'de, T: CompactInt> de::Visitor<'de> for CompactVisitor<T> {
	type Value = Compact<T>;

	fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "a compact {}", T::NAME)
	}

	fn visit_newtype_struct<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
		let value = u128::deserialize(deserializer)?;
		T::try_from(value).map(Compact).map_err(|_| {
			de::Error::custom(format_args!("compact value {value} does not fit into {}", T::NAME))
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn encoded(value: u128) -> Vec<u8> {
		let mut out = Vec::new();
		encode(value, &mut out);
		out
	}

	#[test]
	fn mode_boundaries() {
		assert_eq!(encoded(63), vec![0xfc]);
		assert_eq!(encoded(64), vec![0x01, 0x01]);
		assert_eq!(encoded(MODE_1_MAX).len(), 2);
		assert_eq!(encoded(MODE_1_MAX + 1), vec![0x02, 0x00, 0x01, 0x00]);
		assert_eq!(encoded(MODE_2_MAX).len(), 4);
		assert_eq!(encoded(MODE_2_MAX + 1), vec![0x03, 0x00, 0x00, 0x00, 0x40]);
		assert_eq!(encoded(u128::MAX).len(), 17);
	}

	#[test]
	fn encoded_len_matches_encoding() {
		for value in [0, 1, 63, 64, 16_383, 16_384, MODE_2_MAX, MODE_2_MAX + 1, u64::MAX.into(), u128::MAX]
		{
			assert_eq!(encoded_len(value), encoded(value).len(), "length of {value}");
		}
	}

	#[test]
	fn decode_reads_every_mode() -> Result<(), Error> {
		for value in [0, 42, 64, 1_000, 16_384, 1 << 29, 1 << 30, u64::MAX.into(), u128::MAX] {
			let bytes = encoded(value);
			let mut reader = Reader::new(&bytes);
			assert_eq!(decode(&mut reader)?, value);
			assert!(reader.is_empty());
		}
		Ok(())
	}

	#[test]
	fn decode_rejects_non_canonical_forms() {
		// 1 in mode 1.
		let mut reader = Reader::new(&[0x05, 0x00]);
		assert_eq!(decode(&mut reader), Err(Error::InvalidCompact { position: 0 }));
		// 64 in mode 2.
		let mut reader = Reader::new(&[0x02, 0x01, 0x00, 0x00]);
		assert_eq!(decode(&mut reader), Err(Error::InvalidCompact { position: 0 }));
		// Big integer with a zero top byte.
		let mut reader = Reader::new(&[0x07, 0x00, 0x00, 0x00, 0x40, 0x00]);
		assert_eq!(decode(&mut reader), Err(Error::InvalidCompact { position: 0 }));
		// More payload bytes than fit in a u128.
		let mut reader = Reader::new(&[0x37]);
		assert_eq!(decode(&mut reader), Err(Error::InvalidCompact { position: 0 }));
	}

	#[test]
	fn decode_truncated_fails() {
		let mut reader = Reader::new(&[0x02, 0x00]);
		assert!(matches!(decode(&mut reader), Err(Error::UnexpectedEof { position: 1, .. })));
	}
}
