// SPDX-License-Identifier: GPL-3.0

//! SCALE decoding through the serde container protocol.
//!
//! The [`Decoder`] itself is the single-value container. Nested structure is read through
//! [`Unkeyed`] (tuples, arrays, sequences), [`Keyed`] (structs) and [`Enum`] (tagged unions), all of
//! which advance the decoder's shared [`Reader`].

use crate::{
	Error, NamingPolicy, Reader, compact,
	compact::COMPACT_TOKEN,
	layout::{EMPTY, Layouts, TypeLayout, order_fields},
};
use serde::de::{
	self, DeserializeSeed, Deserialize, IntoDeserializer, Visitor,
	value::{StrDeserializer, U32Deserializer, U128Deserializer},
};

/// Decode a value from `bytes`, requiring the whole input to be consumed.
pub fn from_bytes<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<T, Error> {
	from_bytes_with(bytes, &EMPTY, NamingPolicy::default())
}

/// Decode a value from `bytes` using metadata layout hints.
///
/// # Arguments
/// * `bytes` - The encoded value.
/// * `layouts` - Wire order of fields and variant discriminants.
/// * `policy` - Rule used to match Rust names against layout names.
pub fn from_bytes_with<'de, T: Deserialize<'de>>(
	bytes: &'de [u8],
	layouts: &Layouts,
	policy: NamingPolicy,
) -> Result<T, Error> {
	let mut decoder = Decoder::with_layouts(bytes, layouts, policy);
	let value = T::deserialize(&mut decoder)?;
	decoder.end()?;
	Ok(value)
}

/// Single-value decoding container over a shared byte cursor.
pub struct Decoder<'de, 'l> {
	reader: Reader<'de>,
	layouts: &'l Layouts,
	policy: NamingPolicy,
	root_pending: bool,
}

impl<'de> Decoder<'de, 'static> {
	/// Decoder without layout hints.
	pub fn new(bytes: &'de [u8]) -> Self {
		Decoder::with_layouts(bytes, &EMPTY, NamingPolicy::default())
	}
}

impl<'de, 'l> Decoder<'de, 'l> {
	/// Decoder that consults `layouts` for struct field order and enum discriminants.
	pub fn with_layouts(bytes: &'de [u8], layouts: &'l Layouts, policy: NamingPolicy) -> Self {
		Self { reader: Reader::new(bytes), layouts, policy, root_pending: true }
	}

	/// Current cursor position.
	pub fn position(&self) -> usize {
		self.reader.position()
	}

	/// Number of bytes not consumed yet.
	pub fn remaining(&self) -> usize {
		self.reader.remaining()
	}

	/// Fail if any input is left.
	pub fn end(&self) -> Result<(), Error> {
		if self.reader.is_empty() {
			Ok(())
		} else {
			Err(Error::TrailingBytes { position: self.position(), remaining: self.remaining() })
		}
	}

	/// Decode the next value.
	pub fn decode<T: Deserialize<'de>>(&mut self) -> Result<T, Error> {
		T::deserialize(&mut *self)
	}

	/// Decode a presence flag, then the value only if the flag is set.
	pub fn decode_if_present<T: Deserialize<'de>>(&mut self) -> Result<Option<T>, Error> {
		let present: bool = self.decode()?;
		if present { self.decode().map(Some) } else { Ok(None) }
	}

	/// Read a boolean byte.
	pub fn read_bool(&mut self) -> Result<bool, Error> {
		let position = self.position();
		match self.reader.read_u8("bool")? {
			0 => Ok(false),
			1 => Ok(true),
			byte => Err(Error::InvalidBool { position, byte }),
		}
	}

	/// Read a compact integer.
	pub fn read_compact(&mut self) -> Result<u128, Error> {
		compact::decode(&mut self.reader)
	}

	/// Read a compact length prefix.
	pub fn read_length(&mut self) -> Result<usize, Error> {
		let position = self.position();
		let length = self.read_compact()?;
		usize::try_from(length).map_err(|_| Error::InvalidCompact { position })
	}

	/// Read `len` raw bytes.
	pub fn read_bytes(&mut self, len: usize) -> Result<&'de [u8], Error> {
		self.reader.read_bytes(len, "bytes")
	}

	/// Open an unkeyed container with a known element count, or with `None` for a container
	/// whose count still has to be established.
	pub fn unkeyed(&mut self, count: Option<usize>) -> Unkeyed<'_, 'de, 'l> {
		Unkeyed { decoder: self, count, index: 0 }
	}

	/// Open the unkeyed container of a dynamic sequence, reading its length prefix first.
	pub fn sequence(&mut self) -> Result<Unkeyed<'_, 'de, 'l>, Error> {
		let mut container = self.unkeyed(None);
		container.establish_count()?;
		Ok(container)
	}

	fn read_str(&mut self) -> Result<&'de str, Error> {
		let len = self.read_length()?;
		let position = self.position();
		let bytes = self.reader.read_bytes(len, "string")?;
		std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8 { position })
	}

	fn take_layout(&mut self, name: &str) -> Option<&'l TypeLayout> {
		let layouts = self.layouts;
		if std::mem::take(&mut self.root_pending) {
			if let Some(root) = layouts.root() {
				return Some(root);
			}
		}
		layouts.get(name, self.policy)
	}
}

macro_rules! deserialize_int {
	($($method:ident => $visit:ident, $ty:ty;)*) => {
		$(fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
			let bytes = self.reader.read_array(stringify!($ty))?;
			visitor.$visit(<$ty>::from_le_bytes(bytes))
		})*
	};
}

impl<'de, 'l> de::Deserializer<'de> for &mut Decoder<'de, 'l> {
	type Error = Error;

	fn deserialize_any<V: Visitor<'de>>(self, _: V) -> Result<V::Value, Error> {
		Err(Error::Unsupported("decoding without a declared shape"))
	}

	fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
		visitor.visit_bool(self.read_bool()?)
	}

	deserialize_int! {
		deserialize_u8 => visit_u8, u8;
		deserialize_u16 => visit_u16, u16;
		deserialize_u32 => visit_u32, u32;
		deserialize_u64 => visit_u64, u64;
		deserialize_u128 => visit_u128, u128;
		deserialize_i8 => visit_i8, i8;
		deserialize_i16 => visit_i16, i16;
		deserialize_i32 => visit_i32, i32;
		deserialize_i64 => visit_i64, i64;
		deserialize_i128 => visit_i128, i128;
	}

	fn deserialize_f32<V: Visitor<'de>>(self, _: V) -> Result<V::Value, Error> {
		Err(Error::Unsupported("floating point numbers"))
	}

	fn deserialize_f64<V: Visitor<'de>>(self, _: V) -> Result<V::Value, Error> {
		Err(Error::Unsupported("floating point numbers"))
	}

	fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
		let position = self.position();
		let code = u32::from_le_bytes(self.reader.read_array("char")?);
		let c = char::from_u32(code)
			.ok_or_else(|| Error::Message(format!("invalid char {code:#x} at byte {position}")))?;
		visitor.visit_char(c)
	}

	fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
		visitor.visit_borrowed_str(self.read_str()?)
	}

	fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
		self.deserialize_str(visitor)
	}

	fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
		let len = self.read_length()?;
		visitor.visit_borrowed_bytes(self.read_bytes(len)?)
	}

	fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
		self.deserialize_bytes(visitor)
	}

	fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
		let present: bool = self.decode()?;
		if present { visitor.visit_some(self) } else { visitor.visit_none() }
	}

	fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
		visitor.visit_unit()
	}

	fn deserialize_unit_struct<V: Visitor<'de>>(
		self,
		_: &'static str,
		visitor: V,
	) -> Result<V::Value, Error> {
		visitor.visit_unit()
	}

	fn deserialize_newtype_struct<V: Visitor<'de>>(
		self,
		name: &'static str,
		visitor: V,
	) -> Result<V::Value, Error> {
		if name == COMPACT_TOKEN {
			let value = self.read_compact()?;
			visitor.visit_newtype_struct(U128Deserializer::<Error>::new(value))
		} else {
			visitor.visit_newtype_struct(self)
		}
	}

	fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
		self.root_pending = false;
		visitor.visit_seq(self.sequence()?)
	}

	fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, Error> {
		self.root_pending = false;
		visitor.visit_seq(self.unkeyed(Some(len)))
	}

	fn deserialize_tuple_struct<V: Visitor<'de>>(
		self,
		_: &'static str,
		len: usize,
		visitor: V,
	) -> Result<V::Value, Error> {
		self.root_pending = false;
		visitor.visit_seq(self.unkeyed(Some(len)))
	}

	fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
		self.root_pending = false;
		let count = self.read_length()?;
		visitor.visit_map(Entries { decoder: self, count, index: 0 })
	}

	fn deserialize_struct<V: Visitor<'de>>(
		self,
		name: &'static str,
		fields: &'static [&'static str],
		visitor: V,
	) -> Result<V::Value, Error> {
		let order = match self.take_layout(name) {
			Some(TypeLayout::Struct(wire)) => order_fields(wire, fields, self.policy)?,
			_ => fields.to_vec(),
		};
		visitor.visit_map(Keyed { decoder: self, fields: order, index: 0 })
	}

	fn deserialize_enum<V: Visitor<'de>>(
		self,
		name: &'static str,
		variants: &'static [&'static str],
		visitor: V,
	) -> Result<V::Value, Error> {
		let layout = self.take_layout(name);
		let position = self.position();
		let index = self.reader.read_u8("enum discriminant")?;
		let unknown = || Error::UnknownVariant { position, index, name: name.to_string() };

		let (variant, fields) = match layout {
			Some(layout) if matches!(layout, TypeLayout::Enum(_)) => {
				let declared = layout.variant_by_index(index).ok_or_else(unknown)?;
				let variant = variants
					.iter()
					.position(|v| self.policy.equals(v, &declared.name))
					.ok_or_else(|| Error::UnmatchedField { name: declared.name.clone() })?;
				(variant, Some(declared.fields.as_slice()))
			},
			_ => {
				let variant = usize::from(index);
				if variant >= variants.len() {
					return Err(unknown());
				}
				(variant, None)
			},
		};
		log::trace!(target: "substrate_codec", "decoding {name}::{} at byte {position}", variants[variant]);
		visitor.visit_enum(Enum { decoder: self, variant: variant as u32, fields })
	}

	fn deserialize_identifier<V: Visitor<'de>>(self, _: V) -> Result<V::Value, Error> {
		Err(Error::Unsupported("identifiers outside of a keyed container"))
	}

	fn deserialize_ignored_any<V: Visitor<'de>>(self, _: V) -> Result<V::Value, Error> {
		Err(Error::Unsupported("skipping values without a declared shape"))
	}

	fn is_human_readable(&self) -> bool {
		false
	}
}

/// Sequential container: tuples, fixed-size arrays and dynamic sequences.
///
/// The container is at its end once `index == count`. While the count is unknown it is
/// conservatively treated as exhausted.
pub struct Unkeyed<'a, 'de, 'l> {
	decoder: &'a mut Decoder<'de, 'l>,
	count: Option<usize>,
	index: usize,
}

impl<'a, 'de, 'l> Unkeyed<'a, 'de, 'l> {
	/// Declared number of elements, once known.
	pub fn count(&self) -> Option<usize> {
		self.count
	}

	/// Whether every declared element has been read.
	pub fn is_at_end(&self) -> bool {
		self.count.is_none_or(|count| count == self.index)
	}

	/// Read the compact length prefix that declares the element count.
	pub fn establish_count(&mut self) -> Result<usize, Error> {
		let count = self.decoder.read_length()?;
		self.count = Some(count);
		self.index = 0;
		Ok(count)
	}

	/// Decode the next element.
	pub fn decode<T: Deserialize<'de>>(&mut self) -> Result<T, Error> {
		self.next_with(|decoder| decoder.decode())
	}

	/// Decode the next element with `f`, failing if the container is exhausted.
	pub fn next_with<R>(
		&mut self,
		f: impl FnOnce(&mut Decoder<'de, 'l>) -> Result<R, Error>,
	) -> Result<R, Error> {
		if self.is_at_end() {
			return Err(Error::OutOfBounds {
				position: self.decoder.position(),
				count: self.count.unwrap_or(0),
			});
		}
		self.index += 1;
		f(&mut *self.decoder)
	}
}

impl<'de> de::SeqAccess<'de> for Unkeyed<'_, 'de, '_> {
	type Error = Error;

	fn next_element_seed<T: DeserializeSeed<'de>>(
		&mut self,
		seed: T,
	) -> Result<Option<T::Value>, Error> {
		if self.is_at_end() {
			return Ok(None);
		}
		self.next_with(|decoder| seed.deserialize(decoder)).map(Some)
	}

	fn size_hint(&self) -> Option<usize> {
		self.count.map(|count| count - self.index)
	}
}

/// Keyed container: yields the caller's field identifiers in wire order.
pub struct Keyed<'a, 'de, 'l> {
	decoder: &'a mut Decoder<'de, 'l>,
	fields: Vec<&'static str>,
	index: usize,
}

impl<'de> de::MapAccess<'de> for Keyed<'_, 'de, '_> {
	type Error = Error;

	fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, Error> {
		match self.fields.get(self.index) {
			Some(&field) => {
				let key: StrDeserializer<'_, Error> = field.into_deserializer();
				seed.deserialize(key).map(Some)
			},
			None => Ok(None),
		}
	}

	fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Error> {
		self.index += 1;
		seed.deserialize(&mut *self.decoder)
	}

	fn size_hint(&self) -> Option<usize> {
		Some(self.fields.len() - self.index)
	}
}

/// Length-prefixed key/value pairs.
struct Entries<'a, 'de, 'l> {
	decoder: &'a mut Decoder<'de, 'l>,
	count: usize,
	index: usize,
}

impl<'de> de::MapAccess<'de> for Entries<'_, 'de, '_> {
	type Error = Error;

	fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, Error> {
		if self.index == self.count {
			return Ok(None);
		}
		self.index += 1;
		seed.deserialize(&mut *self.decoder).map(Some)
	}

	fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Error> {
		seed.deserialize(&mut *self.decoder)
	}

	fn size_hint(&self) -> Option<usize> {
		Some(self.count - self.index)
	}
}

/// Tagged union container positioned after its discriminant.
pub struct Enum<'a, 'de, 'l> {
	decoder: &'a mut Decoder<'de, 'l>,
	variant: u32,
	fields: Option<&'l [String]>,
}

impl<'a, 'de, 'l> de::EnumAccess<'de> for Enum<'a, 'de, 'l> {
	type Error = Error;
	type Variant = Self;

	fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self), Error> {
		let value = seed.deserialize(U32Deserializer::<Error>::new(self.variant))?;
		Ok((value, self))
	}
}

impl<'de> de::VariantAccess<'de> for Enum<'_, 'de, '_> {
	type Error = Error;

	fn unit_variant(self) -> Result<(), Error> {
		Ok(())
	}

	fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, Error> {
		seed.deserialize(self.decoder)
	}

	fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, Error> {
		visitor.visit_seq(self.decoder.unkeyed(Some(len)))
	}

	fn struct_variant<V: Visitor<'de>>(
		self,
		fields: &'static [&'static str],
		visitor: V,
	) -> Result<V::Value, Error> {
		let order = match self.fields {
			Some(wire) if !wire.is_empty() => order_fields(wire, fields, self.decoder.policy)?,
			_ => fields.to_vec(),
		};
		visitor.visit_map(Keyed { decoder: self.decoder, fields: order, index: 0 })
	}
}
