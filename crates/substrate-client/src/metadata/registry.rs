// SPDX-License-Identifier: GPL-3.0

//! Validated arena of runtime types.

use super::types::{Field, Primitive, RuntimeType, RuntimeTypeDef, TypeId, field_names};
use crate::error::MetadataError;
use std::{
	collections::{BTreeMap, HashSet},
	sync::OnceLock,
};
use substrate_codec::{Error as CodecError, Layouts, Reader, TypeLayout, VariantLayout, compact};

/// Registry of every type declared by the runtime, indexed by [`TypeId`].
///
/// The registry is validated once on construction: ids are dense and in order, every referenced
/// id exists and no type contains itself by value. Anything reachable from a registry type is
/// therefore guaranteed to have a finite encoding.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
	types: Vec<RuntimeType>,
	layouts: Vec<OnceLock<Layouts>>,
}

impl PartialEq for TypeRegistry {
	fn eq(&self, other: &Self) -> bool {
		self.types == other.types
	}
}

impl Eq for TypeRegistry {}

impl TypeRegistry {
	/// Validate `types` and build the registry.
	pub fn new(types: Vec<RuntimeType>) -> Result<Self, MetadataError> {
		for (position, ty) in types.iter().enumerate() {
			if ty.id as usize != position {
				return Err(MetadataError::UnorderedTypeId { position, id: ty.id });
			}
		}
		for ty in &types {
			if let Some(id) = references(&ty.def).find(|id| *id as usize >= types.len()) {
				return Err(MetadataError::UnknownTypeId { referenced_by: ty.id.to_string(), id });
			}
		}
		check_acyclic(&types)?;

		let layouts = types.iter().map(|_| OnceLock::new()).collect();
		Ok(Self { types, layouts })
	}

	/// Number of registered types.
	pub fn len(&self) -> usize {
		self.types.len()
	}

	/// Whether the registry holds no types.
	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}

	/// Whether `id` is registered.
	pub fn contains(&self, id: TypeId) -> bool {
		(id as usize) < self.types.len()
	}

	/// The type with the given id.
	pub fn resolve(&self, id: TypeId) -> Option<&RuntimeType> {
		self.types.get(id as usize)
	}

	/// All registered types in id order.
	pub fn types(&self) -> &[RuntimeType] {
		&self.types
	}

	/// Layout hints for encoding or decoding a value of type `id`.
	///
	/// The root layout describes `id` itself; named layouts describe every named struct or enum
	/// reachable from it. Names declared by several different types are left out. The hints are
	/// computed on first use and kept for the lifetime of the registry.
	pub fn layouts(&self, id: TypeId) -> Option<&Layouts> {
		let cell = self.layouts.get(id as usize)?;
		Some(cell.get_or_init(|| self.build_layouts(id)))
	}

	/// Layout hints for a value standing for `fields`, such as the arguments of a call.
	///
	/// The root layout is the field order when every field is named. Named layouts are gathered
	/// from the field types; the first field declaring a name wins.
	pub fn fields_layouts(&self, fields: &[Field]) -> Layouts {
		let mut layouts = Layouts::new();
		if let Some(names) = field_names(fields) {
			layouts = layouts.with_root(TypeLayout::Struct(names));
		}
		for field in fields {
			if let Some(field_layouts) = self.layouts(field.ty) {
				layouts.merge(field_layouts);
			}
		}
		layouts
	}

	fn build_layouts(&self, id: TypeId) -> Layouts {
		let mut layouts = Layouts::new();
		if let Some(root) = self.resolve(id).and_then(|ty| layout_of(&ty.def)) {
			layouts = layouts.with_root(root);
		}

		let mut named: BTreeMap<&str, Option<TypeLayout>> = BTreeMap::new();
		let mut seen = HashSet::new();
		let mut pending = vec![id];
		while let Some(next) = pending.pop() {
			if !seen.insert(next) {
				continue;
			}
			let Some(ty) = self.resolve(next) else { continue };
			pending.extend(references(&ty.def));
			let (Some(name), Some(layout)) = (ty.name(), layout_of(&ty.def)) else { continue };
			named
				.entry(name)
				.and_modify(|existing| {
					if existing.as_ref() != Some(&layout) {
						*existing = None;
					}
				})
				.or_insert_with(|| Some(layout.clone()));
		}
		for (name, layout) in named {
			match layout {
				Some(layout) => layouts.insert(name, layout),
				None => log::trace!(target: "substrate_client", "type name `{name}` is ambiguous, no layout hint"),
			}
		}
		layouts
	}

	/// Advance `reader` past one encoded value of type `id`.
	///
	/// Used to check that bytes produced by the encoder really have the shape the runtime declares.
	pub fn skip(&self, id: TypeId, reader: &mut Reader<'_>) -> Result<(), CodecError> {
		let ty = self
			.resolve(id)
			.ok_or_else(|| CodecError::Message(format!("type {id} is not registered")))?;
		match &ty.def {
			RuntimeTypeDef::Primitive(primitive) => skip_primitive(*primitive, reader),
			RuntimeTypeDef::Composite(fields) =>
				fields.iter().try_for_each(|field| self.skip(field.ty, reader)),
			RuntimeTypeDef::Tuple(elements) => elements.iter().try_for_each(|ty| self.skip(*ty, reader)),
			RuntimeTypeDef::Sequence(element) => {
				let len = read_length(reader)?;
				if matches!(self.resolve(*element).map(|ty| &ty.def), Some(RuntimeTypeDef::Primitive(Primitive::U8)))
				{
					return reader.read_bytes(len, "byte sequence").map(|_| ());
				}
				self.skip_repeated(*element, len, reader)
			},
			RuntimeTypeDef::Array { len, element } => self.skip_repeated(*element, *len as usize, reader),
			RuntimeTypeDef::Variant(variants) => {
				let position = reader.position();
				let index = reader.read_u8("variant discriminant")?;
				let variant = variants.iter().find(|v| v.index == index).ok_or_else(|| {
					CodecError::UnknownVariant {
						position,
						index,
						name: ty.name().unwrap_or("variant").to_string(),
					}
				})?;
				variant.fields.iter().try_for_each(|field| self.skip(field.ty, reader))
			},
			RuntimeTypeDef::Compact(_) => compact::decode(reader).map(|_| ()),
			RuntimeTypeDef::BitSequence { store, .. } => {
				let width = match self.resolve(*store).map(|ty| &ty.def) {
					Some(RuntimeTypeDef::Primitive(
						p @ (Primitive::U8 | Primitive::U16 | Primitive::U32 | Primitive::U64),
					)) => p.width().unwrap_or(1),
					_ => return Err(CodecError::Unsupported("bit sequence store type")),
				};
				let bits = read_length(reader)?;
				let words = bits.div_ceil(width * 8);
				reader.read_bytes(words * width, "bit sequence").map(|_| ())
			},
		}
	}

	/// Skip `count` values of type `element`.
	///
	/// Every type that can encode to a non-empty value always does, so when the first element
	/// takes no bytes the remaining ones take none either. Otherwise each element consumes input
	/// and the loop ends at the end of `reader` whatever `count` claims.
	fn skip_repeated(&self, element: TypeId, count: usize, reader: &mut Reader<'_>) -> Result<(), CodecError> {
		if count == 0 {
			return Ok(());
		}
		let start = reader.position();
		self.skip(element, reader)?;
		if reader.position() == start {
			return Ok(());
		}
		(1..count).try_for_each(|_| self.skip(element, reader))
	}

	/// Check that `bytes` hold exactly one value of type `id`.
	pub fn check(&self, id: TypeId, bytes: &[u8]) -> Result<(), CodecError> {
		self.check_all(std::iter::once(id), bytes)
	}

	/// Check that `bytes` hold exactly one value of every field type, in order.
	pub fn check_fields(&self, fields: &[Field], bytes: &[u8]) -> Result<(), CodecError> {
		self.check_all(fields.iter().map(|field| field.ty), bytes)
	}

	fn check_all(&self, ids: impl IntoIterator<Item = TypeId>, bytes: &[u8]) -> Result<(), CodecError> {
		let mut reader = Reader::new(bytes);
		for id in ids {
			self.skip(id, &mut reader)?;
		}
		if reader.is_empty() {
			Ok(())
		} else {
			Err(CodecError::TrailingBytes { position: reader.position(), remaining: reader.remaining() })
		}
	}
}

/// Metadata view of `def` as seen by the codec.
fn layout_of(def: &RuntimeTypeDef) -> Option<TypeLayout> {
	match def {
		RuntimeTypeDef::Composite(fields) => field_names(fields).map(TypeLayout::Struct),
		RuntimeTypeDef::Variant(variants) => Some(TypeLayout::Enum(
			variants
				.iter()
				.map(|v| VariantLayout {
					index: v.index,
					name: v.name.clone(),
					fields: field_names(&v.fields).unwrap_or_default(),
				})
				.collect(),
		)),
		_ => None,
	}
}

/// Every type id referenced by `def`.
fn references(def: &RuntimeTypeDef) -> Box<dyn Iterator<Item = TypeId> + '_> {
	match def {
		RuntimeTypeDef::Primitive(_) => Box::new(std::iter::empty()),
		RuntimeTypeDef::Composite(fields) => Box::new(fields.iter().map(|f| f.ty)),
		RuntimeTypeDef::Tuple(elements) => Box::new(elements.iter().copied()),
		RuntimeTypeDef::Sequence(element) |
		RuntimeTypeDef::Array { element, .. } |
		RuntimeTypeDef::Compact(element) => Box::new(std::iter::once(*element)),
		RuntimeTypeDef::Variant(variants) =>
			Box::new(variants.iter().flat_map(|v| v.fields.iter().map(|f| f.ty))),
		RuntimeTypeDef::BitSequence { store, order } => Box::new([*store, *order].into_iter()),
	}
}

/// Type ids contained by value, i.e. without a length prefix or discriminant in between.
fn by_value(def: &RuntimeTypeDef) -> Box<dyn Iterator<Item = TypeId> + '_> {
	match def {
		RuntimeTypeDef::Composite(_) |
		RuntimeTypeDef::Tuple(_) |
		RuntimeTypeDef::Array { .. } |
		RuntimeTypeDef::Compact(_) => references(def),
		RuntimeTypeDef::Primitive(_) |
		RuntimeTypeDef::Sequence(_) |
		RuntimeTypeDef::Variant(_) |
		RuntimeTypeDef::BitSequence { .. } => Box::new(std::iter::empty()),
	}
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
	New,
	InProgress,
	Done,
}

fn check_acyclic(types: &[RuntimeType]) -> Result<(), MetadataError> {
	fn visit(id: TypeId, types: &[RuntimeType], state: &mut [Visit]) -> Result<(), MetadataError> {
		match state[id as usize] {
			Visit::Done => return Ok(()),
			Visit::InProgress => return Err(MetadataError::RecursiveType(id)),
			Visit::New => {},
		}
		state[id as usize] = Visit::InProgress;
		for child in by_value(&types[id as usize].def) {
			visit(child, types, state)?;
		}
		state[id as usize] = Visit::Done;
		Ok(())
	}

	let mut state = vec![Visit::New; types.len()];
	(0..types.len() as TypeId).try_for_each(|id| visit(id, types, &mut state))
}

fn read_length(reader: &mut Reader<'_>) -> Result<usize, CodecError> {
	let position = reader.position();
	let len = compact::decode(reader)?;
	usize::try_from(len).map_err(|_| CodecError::InvalidCompact { position })
}

fn skip_primitive(primitive: Primitive, reader: &mut Reader<'_>) -> Result<(), CodecError> {
	match primitive {
		Primitive::Bool => {
			let position = reader.position();
			match reader.read_u8("bool")? {
				0 | 1 => Ok(()),
				byte => Err(CodecError::InvalidBool { position, byte }),
			}
		},
		Primitive::Str => {
			let len = read_length(reader)?;
			let position = reader.position();
			let bytes = reader.read_bytes(len, "string")?;
			std::str::from_utf8(bytes).map(|_| ()).map_err(|_| CodecError::InvalidUtf8 { position })
		},
		fixed => reader.read_bytes(fixed.width().unwrap_or_default(), "primitive").map(|_| ()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::metadata::{Field, Variant};
	use scale::{Compact, Encode};

	fn registry(defs: Vec<RuntimeTypeDef>) -> Result<TypeRegistry, MetadataError> {
		TypeRegistry::new(
			defs.into_iter().enumerate().map(|(id, def)| RuntimeType::new(id as TypeId, def)).collect(),
		)
	}

	#[test]
	fn rejects_unordered_ids() {
		let types = vec![RuntimeType::new(1, RuntimeTypeDef::Primitive(Primitive::U8))];
		assert_eq!(TypeRegistry::new(types), Err(MetadataError::UnorderedTypeId { position: 0, id: 1 }));
	}

	#[test]
	fn rejects_unknown_references() {
		assert_eq!(
			registry(vec![RuntimeTypeDef::Sequence(4)]),
			Err(MetadataError::UnknownTypeId { referenced_by: "0".into(), id: 4 })
		);
	}

	#[test]
	fn rejects_types_containing_themselves_by_value() {
		let result = registry(vec![
			RuntimeTypeDef::Composite(vec![Field::named("next", 1)]),
			RuntimeTypeDef::Tuple(vec![0]),
		]);
		assert!(matches!(result, Err(MetadataError::RecursiveType(_))));
	}

	#[test]
	fn recursion_through_sequences_and_variants_is_allowed() {
		let result = registry(vec![
			// struct Tree { children: Vec<Tree>, parent: Option<Tree> }
			RuntimeTypeDef::Composite(vec![Field::named("children", 1), Field::named("parent", 2)]),
			RuntimeTypeDef::Sequence(0),
			RuntimeTypeDef::Variant(vec![
				Variant::new("None", 0, vec![]),
				Variant::new("Some", 1, vec![Field::unnamed(0)]),
			]),
		]);
		assert!(result.is_ok());
	}

	#[test]
	fn layouts_describe_root_and_named_children() -> anyhow::Result<()> {
		let types = vec![
			RuntimeType::new(0, RuntimeTypeDef::Primitive(Primitive::U32)),
			RuntimeType::new(1, RuntimeTypeDef::Composite(vec![Field::named("free", 0)]))
				.with_path(["pallet_balances", "AccountData"]),
			RuntimeType::new(
				2,
				RuntimeTypeDef::Composite(vec![Field::named("nonce", 0), Field::named("data", 1)]),
			)
			.with_path(["frame_system", "AccountInfo"]),
		];
		let registry = TypeRegistry::new(types)?;
		let layouts = registry.layouts(2).ok_or_else(|| anyhow::anyhow!("no layouts"))?;
		assert_eq!(
			layouts.root(),
			Some(&TypeLayout::Struct(vec!["nonce".into(), "data".into()]))
		);
		assert_eq!(
			layouts.get("AccountData", substrate_codec::NamingPolicy::Exact),
			Some(&TypeLayout::Struct(vec!["free".into()]))
		);
		assert!(std::ptr::eq(layouts, registry.layouts(2).ok_or_else(|| anyhow::anyhow!("no layouts"))?));
		assert!(registry.layouts(3).is_none());
		Ok(())
	}

	#[test]
	fn ambiguous_names_get_no_layout() -> anyhow::Result<()> {
		let types = vec![
			RuntimeType::new(0, RuntimeTypeDef::Primitive(Primitive::U8)),
			RuntimeType::new(1, RuntimeTypeDef::Variant(vec![Variant::new("remark", 0, vec![])]))
				.with_path(["frame_system", "pallet", "Call"]),
			RuntimeType::new(2, RuntimeTypeDef::Variant(vec![Variant::new("transfer", 0, vec![])]))
				.with_path(["pallet_balances", "pallet", "Call"]),
			RuntimeType::new(3, RuntimeTypeDef::Tuple(vec![1, 2])),
		];
		let registry = TypeRegistry::new(types)?;
		let layouts = registry.layouts(3).ok_or_else(|| anyhow::anyhow!("no layouts"))?;
		assert!(layouts.get("Call", substrate_codec::NamingPolicy::Exact).is_none());
		assert!(layouts.root().is_none());
		Ok(())
	}

	#[test]
	fn check_accepts_matching_bytes() -> anyhow::Result<()> {
		let registry = registry(vec![
			RuntimeTypeDef::Primitive(Primitive::U8),
			RuntimeTypeDef::Sequence(0),
			RuntimeTypeDef::Primitive(Primitive::U128),
			RuntimeTypeDef::Compact(2),
			RuntimeTypeDef::Variant(vec![
				Variant::new("Raw", 2, vec![Field::unnamed(1)]),
				Variant::new("Index", 1, vec![Field::unnamed(3)]),
			]),
			RuntimeTypeDef::Composite(vec![Field::named("dest", 4), Field::named("value", 3)]),
			RuntimeTypeDef::Primitive(Primitive::Str),
			RuntimeTypeDef::Tuple(vec![6, 0]),
		])?;

		let mut call = vec![2u8];
		call.extend(vec![1u8, 2, 3].encode());
		call.extend(Compact(10u128).encode());
		registry.check(5, &call)?;
		registry.check(7, &("hi", 1u8).encode())?;
		Ok(())
	}

	#[test]
	fn fields_layouts_combine_root_and_field_types() -> anyhow::Result<()> {
		let types = vec![
			RuntimeType::new(0, RuntimeTypeDef::Primitive(Primitive::U8)),
			RuntimeType::new(
				1,
				RuntimeTypeDef::Variant(vec![
					Variant::new("Id", 0, vec![Field::unnamed(0)]),
					Variant::new("Raw", 2, vec![Field::unnamed(0)]),
				]),
			)
			.with_path(["sp_runtime", "multiaddress", "MultiAddress"]),
		];
		let registry = TypeRegistry::new(types)?;
		let fields = [Field::named("dest", 1), Field::named("value", 0)];
		let layouts = registry.fields_layouts(&fields);
		assert_eq!(layouts.root(), Some(&TypeLayout::Struct(vec!["dest".into(), "value".into()])));
		assert!(layouts.get("MultiAddress", substrate_codec::NamingPolicy::Exact).is_some());

		let unnamed = registry.fields_layouts(&[Field::unnamed(0)]);
		assert!(unnamed.root().is_none());

		registry.check_fields(&fields, &[2, 9, 1])?;
		assert!(matches!(registry.check_fields(&fields, &[2, 9]), Err(CodecError::UnexpectedEof { .. })));
		assert!(matches!(
			registry.check_fields(&fields, &[0, 1, 2, 3]),
			Err(CodecError::TrailingBytes { position: 3, remaining: 1 })
		));
		Ok(())
	}

	#[test]
	fn check_reports_mismatches() -> anyhow::Result<()> {
		let registry = registry(vec![
			RuntimeTypeDef::Primitive(Primitive::U32),
			RuntimeTypeDef::Variant(vec![Variant::new("A", 0, vec![Field::unnamed(0)])]),
			RuntimeTypeDef::Primitive(Primitive::Bool),
		])?;
		assert!(matches!(registry.check(0, &[1, 2]), Err(CodecError::UnexpectedEof { .. })));
		assert!(matches!(registry.check(0, &[1, 2, 3, 4, 5]), Err(CodecError::TrailingBytes { .. })));
		assert!(matches!(
			registry.check(1, &[3, 0, 0, 0, 0]),
			Err(CodecError::UnknownVariant { index: 3, .. })
		));
		assert_eq!(registry.check(2, &[2]), Err(CodecError::InvalidBool { position: 0, byte: 2 }));
		Ok(())
	}

	#[test]
	fn huge_sequence_lengths_end_at_the_input() -> anyhow::Result<()> {
		let registry = registry(vec![
			RuntimeTypeDef::Primitive(Primitive::U32),
			RuntimeTypeDef::Sequence(0),
			RuntimeTypeDef::Tuple(vec![]),
			RuntimeTypeDef::Sequence(2),
			RuntimeTypeDef::Array { len: u32::MAX, element: 2 },
		])?;
		// Four-byte compact length of 2^30 - 1 elements.
		let huge = [0xfe, 0xff, 0xff, 0xff];

		let mut bytes = huge.to_vec();
		bytes.extend(7u32.encode());
		assert!(matches!(registry.check(1, &bytes), Err(CodecError::UnexpectedEof { .. })));

		// Elements that encode to nothing take no time to skip, whatever their count.
		registry.check(3, &huge)?;
		registry.check(4, &[])?;
		Ok(())
	}

	#[test]
	fn check_skips_bit_sequences_by_store_width() -> anyhow::Result<()> {
		let registry = registry(vec![
			RuntimeTypeDef::Primitive(Primitive::U16),
			RuntimeTypeDef::Composite(vec![]),
			RuntimeTypeDef::BitSequence { store: 0, order: 1 },
		])?;
		// 17 bits in u16 words: two words, four bytes.
		let mut bytes = Compact(17u32).encode();
		bytes.extend([0xff, 0xff, 0x01, 0x00]);
		registry.check(2, &bytes)?;
		Ok(())
	}
}
