// SPDX-License-Identifier: GPL-3.0

//! In-memory model of the runtime metadata.
//!
//! The model holds only what the services need: the type registry plus, for every module, its
//! index, call type, constants and storage items. [`RuntimeMetadata`] is built from the metadata
//! the node returns (see the `convert` module) and validated once, so every type id it refers to
//! is known to resolve to a finitely encodable type.

mod convert;
mod registry;
mod types;

pub use registry::TypeRegistry;
pub use types::{Field, Primitive, RuntimeType, RuntimeTypeDef, TypeId, Variant};

use crate::{error::MetadataError, storage::StorageHasher};

/// Decoded runtime metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeMetadata {
	types: TypeRegistry,
	modules: Vec<RuntimeModule>,
}

impl RuntimeMetadata {
	/// Build metadata from a validated registry and the runtime's modules.
	///
	/// Fails when a module refers to a type that is not registered, or when a storage item
	/// declares a different number of hashers and key types.
	pub fn new(types: TypeRegistry, modules: Vec<RuntimeModule>) -> Result<Self, MetadataError> {
		for module in &modules {
			let known = |id: TypeId, item: &str| {
				if types.contains(id) {
					Ok(())
				} else {
					Err(MetadataError::UnknownTypeId {
						referenced_by: format!("{}.{item}", module.name),
						id,
					})
				}
			};
			if let Some(call_type) = module.call_type {
				known(call_type, "calls")?;
			}
			for constant in &module.constants {
				known(constant.ty, &constant.name)?;
			}
			for item in module.storage.iter().flat_map(|storage| &storage.items) {
				if item.hashers.len() != item.key_types.len() {
					return Err(MetadataError::HasherCountMismatch {
						module: module.name.clone(),
						item: item.name.clone(),
						hashers: item.hashers.len(),
						keys: item.key_types.len(),
					});
				}
				known(item.value_type, &item.name)?;
				for key in &item.key_types {
					known(*key, &item.name)?;
				}
			}
		}
		Ok(Self { types, modules })
	}

	/// The type registry.
	pub fn types(&self) -> &TypeRegistry {
		&self.types
	}

	/// Modules in declaration order.
	pub fn modules(&self) -> &[RuntimeModule] {
		&self.modules
	}
}

/// A runtime module (pallet).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeModule {
	/// Module name, e.g. `Balances`.
	pub name: String,
	/// Module index, the first byte of every call into the module.
	pub index: u8,
	/// Variant type enumerating the module's calls.
	pub call_type: Option<TypeId>,
	pub constants: Vec<RuntimeModuleConstant>,
	pub storage: Option<RuntimeModuleStorage>,
}

impl RuntimeModule {
	/// Module without calls, constants or storage.
	pub fn new(name: impl Into<String>, index: u8) -> Self {
		Self { name: name.into(), index, call_type: None, constants: Vec::new(), storage: None }
	}

	/// Set the call type.
	pub fn with_calls(mut self, call_type: TypeId) -> Self {
		self.call_type = Some(call_type);
		self
	}

	/// Add a constant.
	pub fn with_constant(mut self, name: impl Into<String>, ty: TypeId, value: Vec<u8>) -> Self {
		self.constants.push(RuntimeModuleConstant { name: name.into(), ty, value });
		self
	}

	/// Set the storage section.
	pub fn with_storage(mut self, storage: RuntimeModuleStorage) -> Self {
		self.storage = Some(storage);
		self
	}
}

/// A constant declared by a module, with its SCALE encoded value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeModuleConstant {
	pub name: String,
	pub ty: TypeId,
	pub value: Vec<u8>,
}

/// Storage section of a module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeModuleStorage {
	/// Prefix hashed into every key of the module, usually the module name.
	pub prefix: String,
	pub items: Vec<RuntimeModuleStorageItem>,
}

/// A storage value or map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeModuleStorageItem {
	pub name: String,
	/// One hasher per key, empty for plain values.
	pub hashers: Vec<StorageHasher>,
	/// One type per key, empty for plain values.
	pub key_types: Vec<TypeId>,
	pub value_type: TypeId,
	/// Encoded value returned when the key is not set, for items declared with a default.
	pub default: Option<Vec<u8>>,
}

impl RuntimeModuleStorageItem {
	/// Plain storage value.
	pub fn plain(name: impl Into<String>, value_type: TypeId) -> Self {
		Self { name: name.into(), hashers: vec![], key_types: vec![], value_type, default: None }
	}

	/// Storage map keyed by `keys`.
	pub fn map(
		name: impl Into<String>,
		keys: impl IntoIterator<Item = (StorageHasher, TypeId)>,
		value_type: TypeId,
	) -> Self {
		let (hashers, key_types) = keys.into_iter().unzip();
		Self { name: name.into(), hashers, key_types, value_type, default: None }
	}

	/// Set the default value bytes.
	pub fn with_default(mut self, default: Vec<u8>) -> Self {
		self.default = Some(default);
		self
	}
}
