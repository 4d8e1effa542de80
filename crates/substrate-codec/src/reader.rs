// SPDX-License-Identifier: GPL-3.0

//! Byte cursor shared by every decoding container.

use crate::Error;

/// Forward-only cursor over an input buffer.
///
/// All containers created while decoding a value advance the same cursor, so the position always
/// reflects how much of the input has been consumed.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
	bytes: &'a [u8],
	position: usize,
}

impl<'a> Reader<'a> {
	/// Create a cursor at the start of `bytes`.
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, position: 0 }
	}

	/// Number of bytes consumed so far.
	pub fn position(&self) -> usize {
		self.position
	}

	/// Number of bytes left to read.
	pub fn remaining(&self) -> usize {
		self.bytes.len() - self.position
	}

	/// Whether the whole input has been consumed.
	pub fn is_empty(&self) -> bool {
		self.remaining() == 0
	}

	/// Read exactly `len` bytes.
	///
	/// # Arguments
	/// * `len` - Number of bytes to read.
	/// * `expected` - Shape being decoded, reported if the input is too short.
	pub fn read_bytes(&mut self, len: usize, expected: &'static str) -> Result<&'a [u8], Error> {
		let remaining = self.remaining();
		if remaining < len {
			return Err(Error::UnexpectedEof {
				position: self.position,
				needed: len - remaining,
				expected,
			});
		}
		let bytes = &self.bytes[self.position..self.position + len];
		self.position += len;
		Ok(bytes)
	}

	/// Read a single byte.
	pub fn read_u8(&mut self, expected: &'static str) -> Result<u8, Error> {
		Ok(self.read_bytes(1, expected)?[0])
	}

	/// Read a fixed-size array of bytes.
	pub fn read_array<const N: usize>(&mut self, expected: &'static str) -> Result<[u8; N], Error> {
		let mut array = [0u8; N];
		array.copy_from_slice(self.read_bytes(N, expected)?);
		Ok(array)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_advance_position() -> Result<(), Error> {
		let mut reader = Reader::new(&[1, 2, 3, 4]);
		assert_eq!(reader.read_u8("u8")?, 1);
		assert_eq!(reader.read_array::<2>("pair")?, [2, 3]);
		assert_eq!(reader.position(), 3);
		assert_eq!(reader.remaining(), 1);
		assert!(!reader.is_empty());
		Ok(())
	}

	#[test]
	fn read_past_end_fails() {
		let mut reader = Reader::new(&[1, 2]);
		assert_eq!(
			reader.read_bytes(4, "u32"),
			Err(Error::UnexpectedEof { position: 0, needed: 2, expected: "u32" })
		);
		// A failed read does not move the cursor.
		assert_eq!(reader.position(), 0);
	}
}
