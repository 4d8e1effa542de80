// SPDX-License-Identifier: GPL-3.0

//! SCALE encoding through serde.

use crate::{
	Error, NamingPolicy, compact,
	compact::COMPACT_TOKEN,
	layout::{EMPTY, Layouts, TypeLayout, VariantLayout},
};
use serde::{Serialize, ser};

/// Encode `value` into a new buffer.
pub fn to_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
	to_bytes_with(value, &EMPTY, NamingPolicy::default())
}

/// Encode `value` using metadata layout hints.
///
/// Struct fields are written in the layout's wire order and enum discriminants come from the
/// layout, so a Rust type only has to agree with the chain on names.
pub fn to_bytes_with<T: Serialize + ?Sized>(
	value: &T,
	layouts: &Layouts,
	policy: NamingPolicy,
) -> Result<Vec<u8>, Error> {
	let mut encoder = Encoder::with_layouts(layouts, policy);
	value.serialize(&mut encoder)?;
	Ok(encoder.into_inner())
}

/// Serializer writing the SCALE encoding into an owned buffer.
pub struct Encoder<'l> {
	out: Vec<u8>,
	layouts: &'l Layouts,
	policy: NamingPolicy,
	root_pending: bool,
	compact_next: bool,
}

impl Encoder<'static> {
	/// Encoder without layout hints.
	pub fn new() -> Self {
		Encoder::with_layouts(&EMPTY, NamingPolicy::default())
	}
}

impl Default for Encoder<'static> {
	fn default() -> Self {
		Self::new()
	}
}

impl<'l> Encoder<'l> {
	/// Encoder that consults `layouts` for struct field order and enum discriminants.
	pub fn with_layouts(layouts: &'l Layouts, policy: NamingPolicy) -> Self {
		Self { out: Vec::new(), layouts, policy, root_pending: true, compact_next: false }
	}

	/// Bytes written so far.
	pub fn as_bytes(&self) -> &[u8] {
		&self.out
	}

	/// Consume the encoder, returning the written bytes.
	pub fn into_inner(self) -> Vec<u8> {
		self.out
	}

	fn nested(&self) -> Encoder<'l> {
		Encoder {
			out: Vec::new(),
			layouts: self.layouts,
			policy: self.policy,
			root_pending: false,
			compact_next: false,
		}
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

	fn write_length(&mut self, len: usize) {
		compact::encode(len as u128, &mut self.out);
	}

	/// Write the discriminant of `variant`, returning its declared layout when there is one.
	fn write_variant(
		&mut self,
		name: &'static str,
		position: u32,
		variant: &'static str,
	) -> Result<Option<&'l VariantLayout>, Error> {
		match self.take_layout(name) {
			Some(layout) if matches!(layout, TypeLayout::Enum(_)) => {
				let declared = layout
					.variant_by_name(variant, self.policy)
					.ok_or_else(|| Error::UnmatchedField { name: variant.to_string() })?;
				self.out.push(declared.index);
				Ok(Some(declared))
			},
			_ => {
				let index = u8::try_from(position)
					.map_err(|_| Error::Message(format!("`{name}` has more than 256 variants")))?;
				self.out.push(index);
				Ok(None)
			},
		}
	}

	fn write_unsigned(&mut self, value: u128, bytes: &[u8]) {
		if std::mem::take(&mut self.compact_next) {
			compact::encode(value, &mut self.out);
		} else {
			self.out.extend_from_slice(bytes);
		}
	}

	fn write_signed(&mut self, bytes: &[u8]) -> Result<(), Error> {
		if self.compact_next {
			return Err(Error::Unsupported("compact signed integers"));
		}
		self.out.extend_from_slice(bytes);
		Ok(())
	}
}

macro_rules! serialize_unsigned {
	($($method:ident => $ty:ty;)*) => {
		$(fn $method(self, value: $ty) -> Result<(), Error> {
			self.write_unsigned(u128::from(value), &value.to_le_bytes());
			Ok(())
		})*
	};
}

macro_rules! serialize_signed {
	($($method:ident => $ty:ty;)*) => {
		$(fn $method(self, value: $ty) -> Result<(), Error> {
			self.write_signed(&value.to_le_bytes())
		})*
	};
}

impl<'a, 'l> ser::Serializer for &'a mut Encoder<'l> {
	type Ok = ();
	type Error = Error;
	type SerializeSeq = Self;
	type SerializeTuple = Self;
	type SerializeTupleStruct = Self;
	type SerializeTupleVariant = Self;
	type SerializeMap = Self;
	type SerializeStruct = Fields<'a, 'l>;
	type SerializeStructVariant = Fields<'a, 'l>;

	fn serialize_bool(self, value: bool) -> Result<(), Error> {
		self.out.push(u8::from(value));
		Ok(())
	}

	serialize_unsigned! {
		serialize_u8 => u8;
		serialize_u16 => u16;
		serialize_u32 => u32;
		serialize_u64 => u64;
		serialize_u128 => u128;
	}

	serialize_signed! {
		serialize_i8 => i8;
		serialize_i16 => i16;
		serialize_i32 => i32;
		serialize_i64 => i64;
		serialize_i128 => i128;
	}

	fn serialize_f32(self, _: f32) -> Result<(), Error> {
		Err(Error::Unsupported("floating point numbers"))
	}

	fn serialize_f64(self, _: f64) -> Result<(), Error> {
		Err(Error::Unsupported("floating point numbers"))
	}

	fn serialize_char(self, value: char) -> Result<(), Error> {
		self.out.extend_from_slice(&u32::from(value).to_le_bytes());
		Ok(())
	}

	fn serialize_str(self, value: &str) -> Result<(), Error> {
		self.serialize_bytes(value.as_bytes())
	}

	fn serialize_bytes(self, value: &[u8]) -> Result<(), Error> {
		self.write_length(value.len());
		self.out.extend_from_slice(value);
		Ok(())
	}

	fn serialize_none(self) -> Result<(), Error> {
		self.out.push(0);
		Ok(())
	}

	fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), Error> {
		self.out.push(1);
		value.serialize(self)
	}

	fn serialize_unit(self) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_unit_struct(self, _: &'static str) -> Result<(), Error> {
		Ok(())
	}

	fn serialize_unit_variant(
		self,
		name: &'static str,
		index: u32,
		variant: &'static str,
	) -> Result<(), Error> {
		self.write_variant(name, index, variant).map(|_| ())
	}

	fn serialize_newtype_struct<T: Serialize + ?Sized>(
		self,
		name: &'static str,
		value: &T,
	) -> Result<(), Error> {
		if name == COMPACT_TOKEN {
			self.compact_next = true;
		}
		value.serialize(&mut *self)?;
		if std::mem::take(&mut self.compact_next) {
			return Err(Error::Unsupported("compact encoding of a non-integer value"));
		}
		Ok(())
	}

	fn serialize_newtype_variant<T: Serialize + ?Sized>(
		self,
		name: &'static str,
		index: u32,
		variant: &'static str,
		value: &T,
	) -> Result<(), Error> {
		self.write_variant(name, index, variant)?;
		value.serialize(self)
	}

	fn serialize_seq(self, len: Option<usize>) -> Result<Self, Error> {
		let len = len.ok_or(Error::Unsupported("sequences of unknown length"))?;
		self.root_pending = false;
		self.write_length(len);
		Ok(self)
	}

	fn serialize_tuple(self, _: usize) -> Result<Self, Error> {
		self.root_pending = false;
		Ok(self)
	}

	fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<Self, Error> {
		self.root_pending = false;
		Ok(self)
	}

	fn serialize_tuple_variant(
		self,
		name: &'static str,
		index: u32,
		variant: &'static str,
		_: usize,
	) -> Result<Self, Error> {
		self.write_variant(name, index, variant)?;
		Ok(self)
	}

	fn serialize_map(self, len: Option<usize>) -> Result<Self, Error> {
		let len = len.ok_or(Error::Unsupported("maps of unknown length"))?;
		self.root_pending = false;
		self.write_length(len);
		Ok(self)
	}

	fn serialize_struct(self, name: &'static str, _: usize) -> Result<Fields<'a, 'l>, Error> {
		let order = match self.take_layout(name) {
			Some(TypeLayout::Struct(wire)) => Some(wire.as_slice()),
			_ => None,
		};
		Ok(Fields::new(self, order))
	}

	fn serialize_struct_variant(
		self,
		name: &'static str,
		index: u32,
		variant: &'static str,
		_: usize,
	) -> Result<Fields<'a, 'l>, Error> {
		let declared = self.write_variant(name, index, variant)?;
		let order = declared.map(|v| v.fields.as_slice()).filter(|fields| !fields.is_empty());
		Ok(Fields::new(self, order))
	}

	fn is_human_readable(&self) -> bool {
		false
	}
}

impl ser::SerializeSeq for &mut Encoder<'_> {
	type Ok = ();
	type Error = Error;

	fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
		value.serialize(&mut **self)
	}

	fn end(self) -> Result<(), Error> {
		Ok(())
	}
}

impl ser::SerializeTuple for &mut Encoder<'_> {
	type Ok = ();
	type Error = Error;

	fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
		value.serialize(&mut **self)
	}

	fn end(self) -> Result<(), Error> {
		Ok(())
	}
}

impl ser::SerializeTupleStruct for &mut Encoder<'_> {
	type Ok = ();
	type Error = Error;

	fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
		value.serialize(&mut **self)
	}

	fn end(self) -> Result<(), Error> {
		Ok(())
	}
}

impl ser::SerializeTupleVariant for &mut Encoder<'_> {
	type Ok = ();
	type Error = Error;

	fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
		value.serialize(&mut **self)
	}

	fn end(self) -> Result<(), Error> {
		Ok(())
	}
}

impl ser::SerializeMap for &mut Encoder<'_> {
	type Ok = ();
	type Error = Error;

	fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), Error> {
		key.serialize(&mut **self)
	}

	fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
		value.serialize(&mut **self)
	}

	fn end(self) -> Result<(), Error> {
		Ok(())
	}
}

/// Struct field writer.
///
/// Without a layout fields go straight to the output. With a layout each field is encoded into
/// its own buffer and the buffers are emitted in wire order once the struct ends.
pub struct Fields<'a, 'l> {
	encoder: &'a mut Encoder<'l>,
	order: Option<&'l [String]>,
	buffered: Vec<(&'static str, Vec<u8>)>,
}

impl<'a, 'l> Fields<'a, 'l> {
	fn new(encoder: &'a mut Encoder<'l>, order: Option<&'l [String]>) -> Self {
		Self { encoder, order, buffered: Vec::new() }
	}

	fn write<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), Error> {
		if self.order.is_none() {
			return value.serialize(&mut *self.encoder);
		}
		let mut nested = self.encoder.nested();
		value.serialize(&mut nested)?;
		self.buffered.push((key, nested.into_inner()));
		Ok(())
	}

	fn finish(self) -> Result<(), Error> {
		let Some(order) = self.order else { return Ok(()) };
		let policy = self.encoder.policy;
		let mut buffered = self.buffered;
		for name in order {
			let position = buffered
				.iter()
				.position(|(key, _)| policy.equals(key, name))
				.ok_or_else(|| Error::UnmatchedField { name: name.clone() })?;
			let (_, bytes) = buffered.swap_remove(position);
			self.encoder.out.extend_from_slice(&bytes);
		}
		match buffered.first() {
			Some((key, _)) => Err(Error::UnmatchedField { name: key.to_string() }),
			None => Ok(()),
		}
	}
}

impl ser::SerializeStruct for Fields<'_, '_> {
	type Ok = ();
	type Error = Error;

	fn serialize_field<T: Serialize + ?Sized>(
		&mut self,
		key: &'static str,
		value: &T,
	) -> Result<(), Error> {
		self.write(key, value)
	}

	fn end(self) -> Result<(), Error> {
		self.finish()
	}
}

impl ser::SerializeStructVariant for Fields<'_, '_> {
	type Ok = ();
	type Error = Error;

	fn serialize_field<T: Serialize + ?Sized>(
		&mut self,
		key: &'static str,
		value: &T,
	) -> Result<(), Error> {
		self.write(key, value)
	}

	fn end(self) -> Result<(), Error> {
		self.finish()
	}
}
