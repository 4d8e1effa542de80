// SPDX-License-Identifier: GPL-3.0

//! Codec error types.

use std::fmt::Display;
use thiserror::Error;

/// Errors that can occur while encoding or decoding SCALE data.
///
/// Decoding failures carry the cursor position at which the failure was detected so callers can
/// point at the offending bytes.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
	/// The input ended while a fixed number of bytes was still required.
	#[error("Unexpected end of input at byte {position}: {needed} more byte(s) needed for {expected}")]
	UnexpectedEof {
		/// Cursor position at which the read was attempted.
		position: usize,
		/// Number of bytes missing.
		needed: usize,
		/// Shape that was being decoded.
		expected: &'static str,
	},
	/// The compact integer tag or payload is invalid or non-canonical.
	#[error("Invalid compact integer at byte {position}")]
	InvalidCompact {
		/// Position of the compact tag byte.
		position: usize,
	},
	/// A boolean byte other than `0x00` or `0x01`.
	#[error("Invalid boolean byte {byte:#04x} at byte {position}")]
	InvalidBool {
		/// Position of the offending byte.
		position: usize,
		/// The byte that was read.
		byte: u8,
	},
	/// A discriminant that matches none of the declared alternatives.
	#[error("Unknown discriminant {index} for `{name}` at byte {position}")]
	UnknownVariant {
		/// Position of the discriminant byte.
		position: usize,
		/// The discriminant that was read.
		index: u8,
		/// Name of the enum being decoded.
		name: String,
	},
	/// String bytes that are not valid UTF-8.
	#[error("Invalid UTF-8 string at byte {position}")]
	InvalidUtf8 {
		/// Position of the first string byte.
		position: usize,
	},
	/// A read past the declared bound of an unkeyed container.
	#[error("Read past the end of a container of {count} element(s) at byte {position}")]
	OutOfBounds {
		/// Cursor position at which the read was attempted.
		position: usize,
		/// Declared number of elements.
		count: usize,
	},
	/// A field or variant without a counterpart in the layout it is matched against.
	#[error("`{name}` has no counterpart in the type layout")]
	UnmatchedField {
		/// Name of the field or variant that could not be matched.
		name: String,
	},
	/// Bytes left over once the value was fully decoded.
	#[error("{remaining} trailing byte(s) left at byte {position}")]
	TrailingBytes {
		/// Position where decoding stopped.
		position: usize,
		/// Number of unconsumed bytes.
		remaining: usize,
	},
	/// The requested shape cannot be represented in SCALE.
	#[error("Unsupported by the SCALE format: {0}")]
	Unsupported(&'static str),
	/// Error raised by a `Serialize`/`Deserialize` implementation.
	#[error("{0}")]
	Message(String),
}

impl serde::de::Error for Error {
	fn custom<T: Display>(msg: T) -> Self {
		Error::Message(msg.to_string())
	}
}

impl serde::ser::Error for Error {
	fn custom<T: Display>(msg: T) -> Self {
		Error::Message(msg.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn error_display_unexpected_eof() {
		let err = Error::UnexpectedEof { position: 3, needed: 5, expected: "u64" };
		assert_eq!(err.to_string(), "Unexpected end of input at byte 3: 5 more byte(s) needed for u64");
	}

	#[test]
	fn error_display_unknown_variant() {
		let err = Error::UnknownVariant { position: 0, index: 7, name: "Call".into() };
		assert_eq!(err.to_string(), "Unknown discriminant 7 for `Call` at byte 0");
	}

	#[test]
	fn error_display_invalid_bool() {
		let err = Error::InvalidBool { position: 1, byte: 2 };
		assert_eq!(err.to_string(), "Invalid boolean byte 0x02 at byte 1");
	}
}
