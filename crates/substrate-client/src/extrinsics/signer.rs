// SPDX-License-Identifier: GPL-3.0

use crate::error::SignatureError;
use std::str::FromStr;
use subxt_signer::{SecretUri, sr25519::Keypair};

/// Signature scheme, tagged as in the runtime's `MultiSignature`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignatureKind {
	Ed25519,
	Sr25519,
	Ecdsa,
}

impl SignatureKind {
	/// `MultiSignature` discriminant.
	pub fn tag(&self) -> u8 {
		match self {
			SignatureKind::Ed25519 => 0,
			SignatureKind::Sr25519 => 1,
			SignatureKind::Ecdsa => 2,
		}
	}

	/// Length of a signature of this kind.
	pub fn signature_len(&self) -> usize {
		match self {
			SignatureKind::Ed25519 | SignatureKind::Sr25519 => 64,
			SignatureKind::Ecdsa => 65,
		}
	}
}

/// Produces signatures over signing payloads.
///
/// The engine owns its key material; the extrinsics pipeline only hands it the bytes to sign.
pub trait SignatureEngine: Send + Sync {
	/// Scheme of the signatures this engine produces.
	fn signature_kind(&self) -> SignatureKind;

	/// Sign `payload`.
	fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignatureError>;
}

impl SignatureEngine for Keypair {
	fn signature_kind(&self) -> SignatureKind {
		SignatureKind::Sr25519
	}

	fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignatureError> {
		Ok(Keypair::sign(self, payload).0.to_vec())
	}
}

/// Create a keypair from a secret URI.
///
/// # Arguments
/// `suri` - Secret URI string used to generate the `Keypair`, e.g. `//Alice`.
pub fn create_signer(suri: &str) -> Result<Keypair, SignatureError> {
	let uri = SecretUri::from_str(suri).map_err(|e| SignatureError::ParseSecretURI(e.to_string()))?;
	Keypair::from_uri(&uri).map_err(|e| SignatureError::KeyPairCreation(e.to_string()))
}
