// SPDX-License-Identifier: GPL-3.0

//! Name based lookup of modules, calls, constants and storage items.

use crate::metadata::{
	RuntimeMetadata, RuntimeModule, RuntimeModuleConstant, RuntimeModuleStorage,
	RuntimeModuleStorageItem, RuntimeType, RuntimeTypeDef, TypeId, Variant,
};
use std::{collections::HashMap, sync::Arc};
use substrate_codec::{Layouts, NamingPolicy};

/// A call resolved to its module and call variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeCall<'a> {
	pub module: &'a RuntimeModule,
	pub variant: &'a Variant,
}

/// A storage item resolved to its module storage section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageItemRef<'a> {
	pub module: &'a RuntimeModule,
	pub storage: &'a RuntimeModuleStorage,
	pub item: &'a RuntimeModuleStorageItem,
}

/// Positions of a module's items, keyed by normalized name.
#[derive(Debug, Default)]
struct ModuleIndex {
	calls: HashMap<String, usize>,
	constants: HashMap<String, usize>,
	storage: HashMap<String, usize>,
}

/// Read-only index over one session's runtime metadata.
///
/// Every name index is built on construction; afterwards lookups never allocate beyond
/// normalizing the queried name, and repeated lookups return references to the same metadata
/// entries. When several entries normalize to the same name, the first one declared wins.
#[derive(Debug)]
pub struct Lookup {
	metadata: Arc<RuntimeMetadata>,
	policy: NamingPolicy,
	modules: HashMap<String, usize>,
	indices: Vec<ModuleIndex>,
}

impl Lookup {
	/// Index `metadata` with names compared under `policy`.
	pub fn new(metadata: Arc<RuntimeMetadata>, policy: NamingPolicy) -> Self {
		let modules = index_names(policy, metadata.modules().iter().map(|m| m.name.as_str()));
		let indices = metadata
			.modules()
			.iter()
			.map(|module| {
				let calls = match call_variants(&metadata, module) {
					Some(variants) => index_names(policy, variants.iter().map(|v| v.name.as_str())),
					None => HashMap::new(),
				};
				let constants = index_names(policy, module.constants.iter().map(|c| c.name.as_str()));
				let storage = match &module.storage {
					Some(storage) => index_names(policy, storage.items.iter().map(|i| i.name.as_str())),
					None => HashMap::new(),
				};
				ModuleIndex { calls, constants, storage }
			})
			.collect();

		log::debug!(
			target: "substrate_client",
			"indexed {} modules with naming policy {policy:?}",
			metadata.modules().len()
		);
		Self { metadata, policy, modules, indices }
	}

	/// The indexed metadata.
	pub fn metadata(&self) -> &Arc<RuntimeMetadata> {
		&self.metadata
	}

	/// Policy names are compared under.
	pub fn policy(&self) -> NamingPolicy {
		self.policy
	}

	fn module_position(&self, name: &str) -> Option<usize> {
		self.modules.get(&*self.policy.normalize(name)).copied()
	}

	/// The module called `name`.
	pub fn module(&self, name: &str) -> Option<&RuntimeModule> {
		self.metadata.modules().get(self.module_position(name)?)
	}

	/// The call `call` of module `module`.
	///
	/// `None` when the module is absent, declares no calls, its call type is not a variant or
	/// has no alternative called `call`.
	pub fn find_call(&self, module: &str, call: &str) -> Option<RuntimeCall<'_>> {
		let position = self.module_position(module)?;
		let runtime_module = &self.metadata.modules()[position];
		let variant_position = *self.indices[position].calls.get(&*self.policy.normalize(call))?;
		let variant = call_variants(&self.metadata, runtime_module)?.get(variant_position)?;
		Some(RuntimeCall { module: runtime_module, variant })
	}

	/// The constant `constant` of module `module`.
	pub fn find_constant(&self, module: &str, constant: &str) -> Option<&RuntimeModuleConstant> {
		let position = self.module_position(module)?;
		let constant_position =
			*self.indices[position].constants.get(&*self.policy.normalize(constant))?;
		self.metadata.modules()[position].constants.get(constant_position)
	}

	/// The storage item `item` of module `module`.
	pub fn find_storage_item(&self, module: &str, item: &str) -> Option<StorageItemRef<'_>> {
		let position = self.module_position(module)?;
		let item_position = *self.indices[position].storage.get(&*self.policy.normalize(item))?;
		let runtime_module = &self.metadata.modules()[position];
		let storage = runtime_module.storage.as_ref()?;
		let item = storage.items.get(item_position)?;
		Some(StorageItemRef { module: runtime_module, storage, item })
	}

	/// The type with the given id.
	pub fn find_type(&self, id: TypeId) -> Option<&RuntimeType> {
		self.metadata.types().resolve(id)
	}

	/// Layout hints for values of type `id`.
	pub fn layouts(&self, id: TypeId) -> Option<&Layouts> {
		self.metadata.types().layouts(id)
	}
}

fn index_names<'a>(policy: NamingPolicy, names: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
	let mut index = HashMap::new();
	for (position, name) in names.enumerate() {
		index.entry(policy.normalize(name).into_owned()).or_insert(position);
	}
	index
}

fn call_variants<'a>(metadata: &'a RuntimeMetadata, module: &RuntimeModule) -> Option<&'a [Variant]> {
	match &metadata.types().resolve(module.call_type?)?.def {
		RuntimeTypeDef::Variant(variants) => Some(variants),
		_ => None,
	}
}
