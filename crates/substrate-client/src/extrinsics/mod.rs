// SPDX-License-Identifier: GPL-3.0

//! Construction of unsigned and signed extrinsics.
//!
//! Building an extrinsic resolves the call by name, encodes the caller's argument value against
//! the call's declared fields and, for signed extrinsics, gathers the chain facts the signature
//! commits to before handing the signing payload to a [`SignatureEngine`].
//!
//! The three signing facts (runtime version, genesis hash and account nonce) are fetched
//! concurrently and joined: the first failure aborts the others and the whole operation, so a
//! signed payload is never produced from partial data.

mod additional;
mod call;
mod era;
mod payload;
mod signer;

pub use additional::{ExtrinsicAdditional, SIGNED_MARKER, UNSIGNED_MARKER};
pub use call::{Call, EncodedCall};
pub use era::{Era, MortalEra};
pub use payload::{Payload, SignedExtra, SignedPayload, UnsignedPayload, signing_payload};
pub use signer::{SignatureEngine, SignatureKind, create_signer};

use crate::{
	client::ClientInner,
	error::{ExtrinsicError, RpcClientError, SigningFact},
	lookup::Lookup,
	primitives::{AccountId, Balance, H256, Index, RuntimeVersion},
};
use serde::Serialize;
use std::sync::Weak;

/// Options of a signed extrinsic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SignedParams {
	/// Tip paid to the block author.
	pub tip: Balance,
	/// Validity window. Immortal by default.
	pub era: Era,
	/// Hash of the block a mortal era is counted from. Defaults to the genesis hash, and is
	/// required for mortal eras.
	pub checkpoint: Option<H256>,
}

/// Builds extrinsics against the runtime the client is connected to.
///
/// Every operation returns `Ok(None)` when the call does not exist or the client has been dropped.
#[derive(Clone)]
pub struct ExtrinsicsService {
	client: Weak<ClientInner>,
}

impl ExtrinsicsService {
	pub(crate) fn new(client: Weak<ClientInner>) -> Self {
		Self { client }
	}

	/// Build an unsigned extrinsic calling `module.call` with `value` as arguments.
	///
	/// No request other than the session's metadata load is issued.
	pub async fn make_unsigned<T: Serialize + ?Sized>(
		&self,
		module: &str,
		call: &str,
		value: &T,
	) -> Result<Option<Payload>, ExtrinsicError> {
		let Some(client) = self.client.upgrade() else { return Ok(None) };
		let lookup = client.lookup().await?;
		let Some(call) = encode_call(&lookup, module, call, value)? else { return Ok(None) };
		log::debug!(target: "substrate_client", "built unsigned {}.{}", call.module, call.call);
		Ok(Some(UnsignedPayload { call }.into()))
	}

	/// Build an unsigned extrinsic for `call`.
	pub async fn make_unsigned_call<T: Serialize>(
		&self,
		call: &Call<T>,
	) -> Result<Option<Payload>, ExtrinsicError> {
		self.make_unsigned(&call.module, &call.name, &call.value).await
	}

	/// Build an immortal extrinsic signed by `account` with `engine`.
	///
	/// The runtime version, genesis hash and nonce of `account` are fetched from the node.
	pub async fn make_signed<T: Serialize + ?Sized>(
		&self,
		module: &str,
		call: &str,
		value: &T,
		tip: Balance,
		account: &AccountId,
		engine: &dyn SignatureEngine,
	) -> Result<Option<Payload>, ExtrinsicError> {
		let params = SignedParams { tip, ..Default::default() };
		self.signed(module, call, value, account, None, params, engine).await
	}

	/// Like [`Self::make_signed`] with a caller supplied nonce, which is not fetched.
	#[allow(clippy::too_many_arguments)]
	pub async fn make_signed_with_nonce<T: Serialize + ?Sized>(
		&self,
		module: &str,
		call: &str,
		value: &T,
		nonce: Index,
		tip: Balance,
		account: &AccountId,
		engine: &dyn SignatureEngine,
	) -> Result<Option<Payload>, ExtrinsicError> {
		let params = SignedParams { tip, ..Default::default() };
		self.signed(module, call, value, account, Some(nonce), params, engine).await
	}

	/// Build a signed extrinsic with explicit tip, era and checkpoint.
	pub async fn make_signed_with<T: Serialize + ?Sized>(
		&self,
		module: &str,
		call: &str,
		value: &T,
		account: &AccountId,
		params: SignedParams,
		engine: &dyn SignatureEngine,
	) -> Result<Option<Payload>, ExtrinsicError> {
		self.signed(module, call, value, account, None, params, engine).await
	}

	#[allow(clippy::too_many_arguments)]
	async fn signed<T: Serialize + ?Sized>(
		&self,
		module: &str,
		call: &str,
		value: &T,
		account: &AccountId,
		nonce: Option<Index>,
		params: SignedParams,
		engine: &dyn SignatureEngine,
	) -> Result<Option<Payload>, ExtrinsicError> {
		let Some(client) = self.client.upgrade() else { return Ok(None) };
		let lookup = client.lookup().await?;
		let Some(call) = encode_call(&lookup, module, call, value)? else { return Ok(None) };
		if !params.era.is_immortal() && params.checkpoint.is_none() {
			return Err(ExtrinsicError::MissingCheckpoint);
		}

		let facts = SigningFacts::fetch(&client, account, nonce).await?;
		log::debug!(
			target: "substrate_client",
			"signing {}.{} for {account}: spec {}, tx {}, nonce {}",
			call.module,
			call.call,
			facts.version.spec_version,
			facts.version.transaction_version,
			facts.nonce
		);

		let additional = ExtrinsicAdditional::new(facts.version, facts.genesis_hash, params.checkpoint);
		let extra = SignedExtra { era: params.era, nonce: facts.nonce, tip: params.tip };
		let payload = SignedPayload::sign(call, *account, extra, additional, engine)?;
		Ok(Some(payload.into()))
	}
}

/// Chain facts a signature commits to.
struct SigningFacts {
	version: RuntimeVersion,
	genesis_hash: H256,
	nonce: Index,
}

impl SigningFacts {
	/// Fetch the facts concurrently, failing as soon as one fetch fails.
	///
	/// A known nonce is used as is.
	async fn fetch(
		client: &ClientInner,
		account: &AccountId,
		known_nonce: Option<Index>,
	) -> Result<Self, ExtrinsicError> {
		let rpc = &client.rpc;
		let version = async {
			rpc.runtime_version().await.map_err(fact_error(SigningFact::RuntimeVersion))
		};
		let genesis_hash = async {
			rpc.block_hash(0)
				.await
				.map_err(fact_error(SigningFact::GenesisHash))?
				.ok_or(ExtrinsicError::MissingSigningFact(SigningFact::GenesisHash))
		};
		let nonce = async {
			if let Some(nonce) = known_nonce {
				return Ok(nonce);
			}
			rpc.account_info(account)
				.await
				.map_err(fact_error(SigningFact::AccountNonce))?
				.map(|info| info.nonce)
				.ok_or(ExtrinsicError::MissingSigningFact(SigningFact::AccountNonce))
		};

		let (version, genesis_hash, nonce) = tokio::try_join!(version, genesis_hash, nonce)?;
		Ok(Self { version, genesis_hash, nonce })
	}
}

fn fact_error(fact: SigningFact) -> impl FnOnce(RpcClientError) -> ExtrinsicError {
	move |source| ExtrinsicError::SigningFact { fact, source }
}

/// Resolve `module.call` and encode `value` as its arguments.
fn encode_call<T: Serialize + ?Sized>(
	lookup: &Lookup,
	module: &str,
	call: &str,
	value: &T,
) -> Result<Option<EncodedCall>, ExtrinsicError> {
	let Some(found) = lookup.find_call(module, call) else {
		log::debug!(target: "substrate_client", "call {module}.{call} not found");
		return Ok(None);
	};
	let registry = lookup.metadata().types();
	let fields = &found.variant.fields;

	let layouts = registry.fields_layouts(fields);
	let args = substrate_codec::to_bytes_with(value, &layouts, lookup.policy()).map_err(|source| {
		ExtrinsicError::Encode {
			module: found.module.name.clone(),
			call: found.variant.name.clone(),
			source,
		}
	})?;
	registry.check_fields(fields, &args).map_err(|source| ExtrinsicError::ArgumentsMismatch {
		module: found.module.name.clone(),
		call: found.variant.name.clone(),
		source,
	})?;

	Ok(Some(EncodedCall {
		module: found.module.name.clone(),
		call: found.variant.name.clone(),
		module_index: found.module.index,
		call_index: found.variant.index,
		args,
	}))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		AccountInfo, SubstrateClient,
		testing::{ALICE, BOB, MockMethod, MockRpc, runtime_metadata},
	};
	use anyhow::Result;
	use std::sync::Arc;
	use substrate_codec::{Compact, NamingPolicy};

	#[derive(Serialize)]
	enum MultiAddress {
		Id(AccountId),
		Raw(Vec<u8>),
	}

	#[derive(Serialize)]
	struct Transfer {
		value: Compact<u128>,
		dest: MultiAddress,
	}

	fn transfer() -> Transfer {
		Transfer { value: Compact(1_000), dest: MultiAddress::Id(AccountId([7; 32])) }
	}

	fn setup() -> Result<(Arc<MockRpc>, SubstrateClient)> {
		let rpc = Arc::new(MockRpc::new(runtime_metadata()?));
		rpc.insert_account(AccountId(ALICE), AccountInfo { nonce: 3, ..Default::default() });
		let client = SubstrateClient::new(rpc.clone(), NamingPolicy::Normalized);
		Ok((rpc, client))
	}

	#[tokio::test]
	async fn unsigned_call_uses_metadata_indices_and_field_order() -> Result<()> {
		let (rpc, client) = setup()?;
		let payload = client
			.extrinsics()
			.make_unsigned("Balances", "transferKeepAlive", &transfer())
			.await?
			.ok_or_else(|| anyhow::anyhow!("call not found"))?;

		let mut expected = vec![5u8, 3, 0];
		expected.extend([7u8; 32]);
		expected.extend([0xa1, 0x0f]);
		assert_eq!(payload.call().encode(), expected);
		assert!(matches!(payload, Payload::Unsigned(_)));
		// Only the metadata was fetched.
		assert_eq!(rpc.total_calls(), 1);
		Ok(())
	}

	#[tokio::test]
	async fn enum_arguments_use_declared_discriminants() -> Result<()> {
		let (_, client) = setup()?;
		let value = Transfer { value: Compact(1), dest: MultiAddress::Raw(vec![0xab]) };
		let payload = client
			.extrinsics()
			.make_unsigned_call(&Call::new("balances", "transfer_allow_death", value))
			.await?
			.ok_or_else(|| anyhow::anyhow!("call not found"))?;
		assert_eq!(payload.call().encode(), vec![5, 0, 2, 0x04, 0xab, 0x04]);
		Ok(())
	}

	#[tokio::test]
	async fn arguments_not_matching_fields_are_rejected() -> Result<()> {
		let (_, client) = setup()?;
		let result = client.extrinsics().make_unsigned("System", "remark", &(1u8, 2u8)).await;
		assert!(
			matches!(result, Err(ExtrinsicError::ArgumentsMismatch { ref call, .. }) if call == "remark"),
			"{result:?}"
		);
		Ok(())
	}

	#[tokio::test]
	async fn signed_call_fetches_facts_once_each() -> Result<()> {
		let (rpc, client) = setup()?;
		let keypair = create_signer("//Alice")?;
		let payload = client
			.extrinsics()
			.make_signed("Balances", "transfer_keep_alive", &transfer(), 0, &AccountId(ALICE), &keypair)
			.await?
			.ok_or_else(|| anyhow::anyhow!("call not found"))?;

		let Payload::Signed(signed) = payload else { anyhow::bail!("expected a signed payload") };
		assert_eq!(signed.extra().nonce, 3);
		assert_eq!(signed.additional().genesis_hash, rpc.genesis_hash());
		assert_eq!(signed.additional().mortality_checkpoint, rpc.genesis_hash());
		for method in [MockMethod::RuntimeVersion, MockMethod::BlockHash, MockMethod::AccountInfo] {
			assert_eq!(rpc.calls(method), 1, "{method:?}");
		}
		Ok(())
	}

	#[tokio::test]
	async fn known_nonce_is_not_fetched() -> Result<()> {
		let (rpc, client) = setup()?;
		let keypair = create_signer("//Alice")?;
		let payload = client
			.extrinsics()
			.make_signed_with_nonce("System", "remark", &(vec![1u8, 2],), 9, 0, &AccountId(ALICE), &keypair)
			.await?;
		assert!(matches!(payload, Some(Payload::Signed(ref signed)) if signed.extra().nonce == 9));
		assert_eq!(rpc.calls(MockMethod::AccountInfo), 0);
		Ok(())
	}

	#[tokio::test]
	async fn mortal_era_requires_checkpoint() -> Result<()> {
		let (rpc, client) = setup()?;
		let keypair = create_signer("//Alice")?;
		let params = SignedParams { era: Era::mortal(64, 100), ..Default::default() };
		let result = client
			.extrinsics()
			.make_signed_with("System", "remark", &(vec![0u8],), &AccountId(ALICE), params, &keypair)
			.await;
		assert_eq!(result, Err(ExtrinsicError::MissingCheckpoint));
		assert_eq!(rpc.calls(MockMethod::RuntimeVersion), 0);

		let checkpoint = H256::repeat_byte(0x42);
		let params = SignedParams { checkpoint: Some(checkpoint), ..params };
		let payload = client
			.extrinsics()
			.make_signed_with("System", "remark", &(vec![0u8],), &AccountId(ALICE), params, &keypair)
			.await?;
		assert!(matches!(
			payload,
			Some(Payload::Signed(ref signed)) if signed.additional().mortality_checkpoint == checkpoint
		));
		Ok(())
	}

	#[tokio::test]
	async fn unknown_account_has_no_nonce() -> Result<()> {
		let (_, client) = setup()?;
		let keypair = create_signer("//Bob")?;
		let result = client
			.extrinsics()
			.make_signed("System", "remark", &(vec![0u8],), 0, &AccountId(BOB), &keypair)
			.await;
		assert_eq!(result, Err(ExtrinsicError::MissingSigningFact(SigningFact::AccountNonce)));
		Ok(())
	}

	#[tokio::test]
	async fn nonce_is_read_from_custom_account_data() -> Result<()> {
		let (rpc, client) = setup()?;
		// nonce 11 and reference counters, followed by account data that is not four balances.
		let mut value: Vec<u8> = [11u32, 0, 1, 0].iter().flat_map(|n| n.to_le_bytes()).collect();
		value.extend([0x01, 0x02, 0x03]);
		rpc.insert_storage(crate::account_storage_key(&AccountId(BOB)), value);

		let keypair = create_signer("//Bob")?;
		let payload = client
			.extrinsics()
			.make_signed("System", "remark", &(vec![0u8],), 0, &AccountId(BOB), &keypair)
			.await?;
		assert!(matches!(payload, Some(Payload::Signed(ref signed)) if signed.extra().nonce == 11));
		Ok(())
	}

	#[tokio::test]
	async fn failing_fact_aborts_signing() -> Result<()> {
		let (rpc, client) = setup()?;
		rpc.fail(MockMethod::RuntimeVersion);
		let keypair = create_signer("//Alice")?;
		let result = client
			.extrinsics()
			.make_signed("System", "remark", &(vec![0u8],), 0, &AccountId(ALICE), &keypair)
			.await;
		assert!(matches!(
			result,
			Err(ExtrinsicError::SigningFact { fact: SigningFact::RuntimeVersion, .. })
		));
		Ok(())
	}
}
