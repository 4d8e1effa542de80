// SPDX-License-Identifier: GPL-3.0

use crate::{client::ClientInner, error::ConstantsError, lookup::Lookup, metadata::RuntimeModuleConstant};
use serde::de::DeserializeOwned;
use std::sync::Weak;
use substrate_codec::Layouts;

/// A constant with the name of the module declaring it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoundConstant {
	/// Module name as declared in metadata.
	pub module: String,
	pub constant: RuntimeModuleConstant,
}

/// Reads module constants from the runtime metadata.
///
/// Constants are part of the metadata, so no request other than the session's metadata load is
/// issued. Every operation returns `Ok(None)` when the constant does not exist or the client has
/// been dropped.
#[derive(Clone)]
pub struct ConstantsService {
	client: Weak<ClientInner>,
}

impl ConstantsService {
	pub(crate) fn new(client: Weak<ClientInner>) -> Self {
		Self { client }
	}

	/// Find the constant `constant` of module `module`.
	pub async fn find(
		&self,
		module: &str,
		constant: &str,
	) -> Result<Option<FoundConstant>, ConstantsError> {
		let Some(client) = self.client.upgrade() else { return Ok(None) };
		let lookup = client.lookup().await?;
		let (Some(declaring), Some(found)) = (lookup.module(module), lookup.find_constant(module, constant))
		else {
			return Ok(None);
		};
		Ok(Some(FoundConstant { module: declaring.name.clone(), constant: found.clone() }))
	}

	/// Fetch the constant `constant` of module `module` decoded as `T`.
	///
	/// # Arguments
	/// * `module` - Module declaring the constant, e.g. `Babe`.
	/// * `constant` - Constant name, e.g. `EpochDuration`.
	pub async fn fetch<T: DeserializeOwned>(
		&self,
		module: &str,
		constant: &str,
	) -> Result<Option<T>, ConstantsError> {
		let Some(client) = self.client.upgrade() else { return Ok(None) };
		let lookup = client.lookup().await?;
		let Some(found) = lookup.find_constant(module, constant) else {
			log::debug!(target: "substrate_client", "constant {module}.{constant} not found");
			return Ok(None);
		};
		let module = lookup.module(module).map_or(module, |m| m.name.as_str());
		decode_constant(Some(&lookup), module, found).map(Some)
	}

	/// Decode the value of a constant previously returned by [`Self::find`].
	///
	/// Layout hints of the session's metadata are used once it is loaded.
	pub fn decode<T: DeserializeOwned>(&self, found: &FoundConstant) -> Result<Option<T>, ConstantsError> {
		let Some(client) = self.client.upgrade() else { return Ok(None) };
		let lookup = client.loaded_lookup();
		decode_constant(lookup.map(|l| &**l), &found.module, &found.constant).map(Some)
	}
}

fn decode_constant<T: DeserializeOwned>(
	lookup: Option<&Lookup>,
	module: &str,
	constant: &RuntimeModuleConstant,
) -> Result<T, ConstantsError> {
	let empty = Layouts::new();
	let (layouts, policy) = match lookup {
		Some(lookup) => (lookup.layouts(constant.ty).unwrap_or(&empty), lookup.policy()),
		None => (&empty, Default::default()),
	};
	substrate_codec::from_bytes_with(&constant.value, layouts, policy).map_err(|source| {
		ConstantsError::FetchingFailure { module: module.to_string(), constant: constant.name.clone(), source }
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		SubstrateClient,
		metadata::{Primitive, RuntimeMetadata, RuntimeModule, RuntimeType, RuntimeTypeDef, TypeRegistry},
		testing::{MockRpc, runtime_metadata},
	};
	use anyhow::Result;
	use std::sync::Arc;
	use substrate_codec::NamingPolicy;

	fn client() -> Result<SubstrateClient> {
		Ok(SubstrateClient::new(Arc::new(MockRpc::new(runtime_metadata()?)), NamingPolicy::Normalized))
	}

	#[tokio::test]
	async fn fetches_epoch_duration() -> Result<()> {
		let client = client()?;
		let epoch: Option<u64> = client.constants().fetch("Babe", "EpochDuration").await?;
		assert_eq!(epoch, Some(600));
		let prefix: Option<u16> = client.constants().fetch("system", "ss58_prefix").await?;
		assert_eq!(prefix, Some(42));
		Ok(())
	}

	#[tokio::test]
	async fn absent_constant_is_no_result() -> Result<()> {
		let client = client()?;
		assert_eq!(client.constants().fetch::<u64>("Babe", "SlotDuration").await?, None);
		assert_eq!(client.constants().fetch::<u64>("Aura", "EpochDuration").await?, None);
		Ok(())
	}

	#[tokio::test]
	async fn undecodable_constant_is_a_failure() -> Result<()> {
		let client = client()?;
		let result = client.constants().fetch::<u128>("Babe", "EpochDuration").await;
		assert!(
			matches!(
				result,
				Err(ConstantsError::FetchingFailure { ref module, ref constant, .. })
					if module == "Babe" && constant == "EpochDuration"
			),
			"{result:?}"
		);
		Ok(())
	}

	#[tokio::test]
	async fn decodes_found_constants() -> Result<()> {
		let client = client()?;
		let constant = client
			.constants()
			.find("System", "BlockHashCount")
			.await?
			.ok_or_else(|| anyhow::anyhow!("constant not found"))?;
		assert_eq!(client.constants().decode::<u32>(&constant)?, Some(4096));

		let error = client.constants().decode::<bool>(&constant);
		assert!(matches!(error, Err(ConstantsError::FetchingFailure { ref module, .. }) if module == "System"));
		Ok(())
	}

	#[tokio::test]
	async fn identical_constants_keep_their_module() -> Result<()> {
		let types = TypeRegistry::new(vec![RuntimeType::new(0, RuntimeTypeDef::Primitive(Primitive::U32))])?;
		let limit = 7u32.to_le_bytes().to_vec();
		let modules = vec![
			RuntimeModule::new("Alpha", 0).with_constant("Limit", 0, limit.clone()),
			RuntimeModule::new("Beta", 1).with_constant("Limit", 0, limit),
		];
		let client = SubstrateClient::new(
			Arc::new(MockRpc::new(RuntimeMetadata::new(types, modules)?)),
			NamingPolicy::Normalized,
		);

		let found = client
			.constants()
			.find("beta", "limit")
			.await?
			.ok_or_else(|| anyhow::anyhow!("constant not found"))?;
		assert_eq!(found.module, "Beta");
		assert_eq!(client.constants().decode::<u32>(&found)?, Some(7));
		let error = client.constants().decode::<bool>(&found);
		assert!(
			matches!(error, Err(ConstantsError::FetchingFailure { ref module, .. }) if module == "Beta"),
			"{error:?}"
		);
		Ok(())
	}
}
