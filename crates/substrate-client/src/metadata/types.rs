// SPDX-License-Identifier: GPL-3.0

//! Runtime type definitions.

/// Index of a type in the [`super::TypeRegistry`].
pub type TypeId = u32;

/// A type declared by the runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeType {
	/// Position of the type in the registry.
	pub id: TypeId,
	/// Fully qualified path, e.g. `["pallet_balances", "pallet", "Call"]`. Empty for anonymous
	/// types such as tuples and sequences.
	pub path: Vec<String>,
	/// Shape of the type.
	pub def: RuntimeTypeDef,
}

impl RuntimeType {
	/// Create a type without a path.
	pub fn new(id: TypeId, def: RuntimeTypeDef) -> Self {
		Self { id, path: Vec::new(), def }
	}

	/// Set the path of the type.
	pub fn with_path<S: Into<String>>(mut self, path: impl IntoIterator<Item = S>) -> Self {
		self.path = path.into_iter().map(Into::into).collect();
		self
	}

	/// Last segment of the path, if the type is named.
	pub fn name(&self) -> Option<&str> {
		self.path.last().map(String::as_str)
	}
}

/// Shape of a runtime type. Child types are referenced by id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuntimeTypeDef {
	Primitive(Primitive),
	/// Struct with named fields, tuple struct with unnamed fields, or unit struct.
	Composite(Vec<Field>),
	Tuple(Vec<TypeId>),
	/// Length-prefixed sequence.
	Sequence(TypeId),
	/// Fixed length array.
	Array { len: u32, element: TypeId },
	/// Tagged union.
	Variant(Vec<Variant>),
	/// Compactly encoded integer.
	Compact(TypeId),
	/// Bit vector stored in words of `store`.
	BitSequence { store: TypeId, order: TypeId },
}

/// Primitive runtime types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
	Bool,
	Char,
	Str,
	U8,
	U16,
	U32,
	U64,
	U128,
	U256,
	I8,
	I16,
	I32,
	I64,
	I128,
	I256,
}

impl Primitive {
	/// Encoded width of fixed-size primitives, `None` for `Str`.
	pub fn width(&self) -> Option<usize> {
		use Primitive::*;
		match self {
			Bool | U8 | I8 => Some(1),
			U16 | I16 => Some(2),
			Char | U32 | I32 => Some(4),
			U64 | I64 => Some(8),
			U128 | I128 => Some(16),
			U256 | I256 => Some(32),
			Str => None,
		}
	}
}

/// Field of a composite type or variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
	/// Field name, `None` for tuple-like fields.
	pub name: Option<String>,
	/// Type of the field.
	pub ty: TypeId,
}

impl Field {
	/// Named field.
	pub fn named(name: impl Into<String>, ty: TypeId) -> Self {
		Self { name: Some(name.into()), ty }
	}

	/// Unnamed field.
	pub fn unnamed(ty: TypeId) -> Self {
		Self { name: None, ty }
	}
}

/// One alternative of a [`RuntimeTypeDef::Variant`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variant {
	/// Variant name.
	pub name: String,
	/// Discriminant written on the wire.
	pub index: u8,
	/// Variant payload.
	pub fields: Vec<Field>,
}

impl Variant {
	/// Create a variant.
	pub fn new(name: impl Into<String>, index: u8, fields: Vec<Field>) -> Self {
		Self { name: name.into(), index, fields }
	}
}

/// Names of `fields` when every field is named.
pub(crate) fn field_names(fields: &[Field]) -> Option<Vec<String>> {
	if fields.is_empty() {
		return None;
	}
	fields.iter().map(|f| f.name.clone()).collect()
}
