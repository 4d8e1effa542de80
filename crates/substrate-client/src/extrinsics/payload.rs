// SPDX-License-Identifier: GPL-3.0

use super::{
	additional::{ExtrinsicAdditional, UNSIGNED_MARKER},
	call::EncodedCall,
	era::Era,
	signer::{SignatureEngine, SignatureKind},
};
use crate::{
	error::SignatureError,
	primitives::{AccountId, Balance, Index},
};
use sp_core::blake2_256;
use substrate_codec::compact;

/// Signing payloads longer than this are signed through their `blake2_256` digest.
const MAX_UNHASHED_SIGNING_PAYLOAD: usize = 256;

/// `MultiAddress::Id` discriminant.
const ADDRESS_ID: u8 = 0x00;

/// An extrinsic ready to be submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
	Unsigned(UnsignedPayload),
	Signed(SignedPayload),
}

impl Payload {
	/// The call carried by the extrinsic.
	pub fn call(&self) -> &EncodedCall {
		match self {
			Payload::Unsigned(payload) => &payload.call,
			Payload::Signed(payload) => &payload.call,
		}
	}

	/// Length-prefixed extrinsic bytes.
	pub fn encode(&self) -> Vec<u8> {
		match self {
			Payload::Unsigned(payload) => payload.encode(),
			Payload::Signed(payload) => payload.encode(),
		}
	}

	/// Extrinsic bytes as `0x`-prefixed hex, the form `author_submitExtrinsic` takes.
	pub fn to_hex(&self) -> String {
		format!("0x{}", hex::encode(self.encode()))
	}
}

/// An extrinsic without signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedPayload {
	pub call: EncodedCall,
}

impl UnsignedPayload {
	/// `compact(len) ++ 0x04 ++ call`.
	pub fn encode(&self) -> Vec<u8> {
		let mut body = vec![UNSIGNED_MARKER];
		self.call.encode_to(&mut body);
		length_prefixed(body)
	}
}

impl From<UnsignedPayload> for Payload {
	fn from(payload: UnsignedPayload) -> Self {
		Payload::Unsigned(payload)
	}
}

/// Signer-visible extras of a signed extrinsic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SignedExtra {
	pub era: Era,
	pub nonce: Index,
	pub tip: Balance,
}

impl SignedExtra {
	/// Append `era ++ compact(nonce) ++ compact(tip)` to `out`.
	pub fn encode_to(&self, out: &mut Vec<u8>) {
		self.era.encode_to(out);
		compact::encode(self.nonce.into(), out);
		compact::encode(self.tip, out);
	}
}

/// A signed extrinsic.
///
/// Only produced by [`SignedPayload::sign`], so a value of this type always carries a signature
/// over its own call, extras and additional data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedPayload {
	call: EncodedCall,
	signer: AccountId,
	extra: SignedExtra,
	additional: ExtrinsicAdditional,
	signature_kind: SignatureKind,
	signature: Vec<u8>,
}

impl SignedPayload {
	/// Sign `call` on behalf of `signer` with `engine`.
	///
	/// Fails when the engine fails or returns a signature of the wrong length for its kind.
	pub fn sign(
		call: EncodedCall,
		signer: AccountId,
		extra: SignedExtra,
		additional: ExtrinsicAdditional,
		engine: &dyn SignatureEngine,
	) -> Result<Self, SignatureError> {
		let message = signing_payload(&call, &extra, &additional);
		let signature_kind = engine.signature_kind();
		let signature = engine.sign(&message)?;
		if signature.len() != signature_kind.signature_len() {
			return Err(SignatureError::InvalidSignatureLength {
				expected: signature_kind.signature_len(),
				found: signature.len(),
			});
		}
		Ok(Self { call, signer, extra, additional, signature_kind, signature })
	}

	pub fn call(&self) -> &EncodedCall {
		&self.call
	}

	pub fn signer(&self) -> &AccountId {
		&self.signer
	}

	pub fn extra(&self) -> &SignedExtra {
		&self.extra
	}

	pub fn additional(&self) -> &ExtrinsicAdditional {
		&self.additional
	}

	pub fn signature_kind(&self) -> SignatureKind {
		self.signature_kind
	}

	pub fn signature(&self) -> &[u8] {
		&self.signature
	}

	/// The bytes the signature was produced over.
	pub fn signing_payload(&self) -> Vec<u8> {
		signing_payload(&self.call, &self.extra, &self.additional)
	}

	/// `compact(len) ++ marker ++ MultiAddress::Id(signer) ++ MultiSignature ++ extra ++ call`.
	pub fn encode(&self) -> Vec<u8> {
		let mut body = Vec::with_capacity(2 + 32 + 1 + self.signature.len() + 16 + 2 + self.call.args.len());
		body.push(self.additional.marker);
		body.push(ADDRESS_ID);
		body.extend_from_slice(self.signer.as_bytes());
		body.push(self.signature_kind.tag());
		body.extend_from_slice(&self.signature);
		self.extra.encode_to(&mut body);
		self.call.encode_to(&mut body);
		length_prefixed(body)
	}
}

impl From<SignedPayload> for Payload {
	fn from(payload: SignedPayload) -> Self {
		Payload::Signed(payload)
	}
}

/// Bytes a signature engine signs over.
///
/// The format is: call ++ extra ++ spec_version ++ tx_version ++ genesis_hash ++ checkpoint,
/// replaced by its `blake2_256` digest when longer than 256 bytes.
pub fn signing_payload(call: &EncodedCall, extra: &SignedExtra, additional: &ExtrinsicAdditional) -> Vec<u8> {
	let mut out = call.encode();
	extra.encode_to(&mut out);
	additional.encode_to(&mut out);
	if out.len() > MAX_UNHASHED_SIGNING_PAYLOAD {
		blake2_256(&out).to_vec()
	} else {
		out
	}
}

fn length_prefixed(body: Vec<u8>) -> Vec<u8> {
	let mut out = Vec::with_capacity(compact::encoded_len(body.len() as u128) + body.len());
	compact::encode(body.len() as u128, &mut out);
	out.extend(body);
	out
}
