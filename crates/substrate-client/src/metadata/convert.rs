// SPDX-License-Identifier: GPL-3.0

//! Conversion from the metadata decoded by subxt into the client model.

use super::{
	Field, Primitive, RuntimeMetadata, RuntimeModule, RuntimeModuleConstant, RuntimeModuleStorage,
	RuntimeModuleStorageItem, RuntimeType, RuntimeTypeDef, TypeId, TypeRegistry, Variant,
};
use crate::{error::MetadataError, storage::StorageHasher};
use scale_info::{PortableRegistry, TypeDef, TypeDefPrimitive, form::PortableForm};
use subxt::{
	Metadata,
	ext::codec::Decode,
	metadata::types::{StorageEntryModifier, StorageEntryType, StorageHasher as MetadataHasher},
};

impl TryFrom<&[u8]> for RuntimeMetadata {
	type Error = MetadataError;

	fn try_from(mut bytes: &[u8]) -> Result<Self, Self::Error> {
		let metadata =
			Metadata::decode(&mut bytes).map_err(|e| MetadataError::DecodeError(e.to_string()))?;
		Self::try_from(&metadata)
	}
}

impl TryFrom<&Metadata> for RuntimeMetadata {
	type Error = MetadataError;

	fn try_from(metadata: &Metadata) -> Result<Self, Self::Error> {
		let portable = metadata.types();
		let types = TypeRegistry::new(convert_types(portable))?;

		let modules = metadata
			.pallets()
			.map(|pallet| {
				let constants = pallet
					.constants()
					.map(|constant| RuntimeModuleConstant {
						name: constant.name().to_string(),
						ty: constant.ty(),
						value: constant.value().to_vec(),
					})
					.collect();

				let storage = pallet.storage().map(|storage| {
					let mut items = Vec::new();
					for entry in storage.entries() {
						let mut item = match entry.entry_type() {
							StorageEntryType::Plain(value_ty) =>
								RuntimeModuleStorageItem::plain(entry.name(), *value_ty),
							StorageEntryType::Map { hashers, key_ty, value_ty } => {
								let key_types = split_key(portable, *key_ty, hashers.len());
								RuntimeModuleStorageItem {
									name: entry.name().to_string(),
									hashers: hashers.iter().map(convert_hasher).collect(),
									key_types,
									value_type: *value_ty,
									default: None,
								}
							},
						};
						if matches!(entry.modifier(), StorageEntryModifier::Default) {
							item.default = Some(entry.default_bytes().to_vec());
						}
						items.push(item);
					}
					RuntimeModuleStorage { prefix: storage.prefix().to_string(), items }
				});

				RuntimeModule {
					name: pallet.name().to_string(),
					index: pallet.index(),
					call_type: pallet.call_ty_id(),
					constants,
					storage,
				}
			})
			.collect();

		let metadata = RuntimeMetadata::new(types, modules)?;
		log::debug!(
			target: "substrate_client",
			"converted metadata with {} types and {} modules",
			metadata.types().len(),
			metadata.modules().len()
		);
		Ok(metadata)
	}
}

/// Key types of a map with `hashers` hashers.
///
/// Maps with several keys declare a single tuple key type, one element per hasher.
fn split_key(registry: &PortableRegistry, key_ty: TypeId, hashers: usize) -> Vec<TypeId> {
	if hashers <= 1 {
		return vec![key_ty];
	}
	match registry.resolve(key_ty).map(|ty| &ty.type_def) {
		Some(TypeDef::Tuple(tuple)) if tuple.fields.len() == hashers =>
			tuple.fields.iter().map(|f| f.id).collect(),
		_ => vec![key_ty],
	}
}

fn convert_hasher(hasher: &MetadataHasher) -> StorageHasher {
	match hasher {
		MetadataHasher::Blake2_128 => StorageHasher::Blake2_128,
		MetadataHasher::Blake2_256 => StorageHasher::Blake2_256,
		MetadataHasher::Blake2_128Concat => StorageHasher::Blake2_128Concat,
		MetadataHasher::Twox128 => StorageHasher::Twox128,
		MetadataHasher::Twox256 => StorageHasher::Twox256,
		MetadataHasher::Twox64Concat => StorageHasher::Twox64Concat,
		MetadataHasher::Identity => StorageHasher::Identity,
	}
}

pub(super) fn convert_types(registry: &PortableRegistry) -> Vec<RuntimeType> {
	registry
		.types
		.iter()
		.map(|portable| RuntimeType {
			id: portable.id,
			path: portable.ty.path.segments.clone(),
			def: convert_def(&portable.ty.type_def),
		})
		.collect()
}

fn convert_fields(fields: &[scale_info::Field<PortableForm>]) -> Vec<Field> {
	fields.iter().map(|f| Field { name: f.name.clone(), ty: f.ty.id }).collect()
}

fn convert_def(def: &TypeDef<PortableForm>) -> RuntimeTypeDef {
	match def {
		TypeDef::Composite(composite) => RuntimeTypeDef::Composite(convert_fields(&composite.fields)),
		TypeDef::Variant(variant) => RuntimeTypeDef::Variant(
			variant
				.variants
				.iter()
				.map(|v| Variant { name: v.name.clone(), index: v.index, fields: convert_fields(&v.fields) })
				.collect(),
		),
		TypeDef::Sequence(sequence) => RuntimeTypeDef::Sequence(sequence.type_param.id),
		TypeDef::Array(array) =>
			RuntimeTypeDef::Array { len: array.len, element: array.type_param.id },
		TypeDef::Tuple(tuple) => RuntimeTypeDef::Tuple(tuple.fields.iter().map(|f| f.id).collect()),
		TypeDef::Primitive(primitive) => RuntimeTypeDef::Primitive(match primitive {
			TypeDefPrimitive::Bool => Primitive::Bool,
			TypeDefPrimitive::Char => Primitive::Char,
			TypeDefPrimitive::Str => Primitive::Str,
			TypeDefPrimitive::U8 => Primitive::U8,
			TypeDefPrimitive::U16 => Primitive::U16,
			TypeDefPrimitive::U32 => Primitive::U32,
			TypeDefPrimitive::U64 => Primitive::U64,
			TypeDefPrimitive::U128 => Primitive::U128,
			TypeDefPrimitive::U256 => Primitive::U256,
			TypeDefPrimitive::I8 => Primitive::I8,
			TypeDefPrimitive::I16 => Primitive::I16,
			TypeDefPrimitive::I32 => Primitive::I32,
			TypeDefPrimitive::I64 => Primitive::I64,
			TypeDefPrimitive::I128 => Primitive::I128,
			TypeDefPrimitive::I256 => Primitive::I256,
		}),
		TypeDef::Compact(compact) => RuntimeTypeDef::Compact(compact.type_param.id),
		TypeDef::BitSequence(bits) => RuntimeTypeDef::BitSequence {
			store: bits.bit_store_type.id,
			order: bits.bit_order_type.id,
		},
	}
}
