// SPDX-License-Identifier: GPL-3.0

/// A call into a runtime module, named the way the caller knows it.
///
/// `value` holds the call arguments. A struct is matched against the call's declared fields by
/// name; a tuple is encoded positionally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call<T> {
	/// Module (pallet) declaring the call, e.g. `Balances`.
	pub module: String,
	/// Call name, e.g. `transfer_keep_alive`.
	pub name: String,
	/// Call arguments.
	pub value: T,
}

impl<T> Call<T> {
	pub fn new(module: impl Into<String>, name: impl Into<String>, value: T) -> Self {
		Self { module: module.into(), name: name.into(), value }
	}
}

/// Discriminants and argument bytes of a resolved call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedCall {
	/// Module name as declared in metadata.
	pub module: String,
	/// Call name as declared in metadata.
	pub call: String,
	pub module_index: u8,
	pub call_index: u8,
	/// Encoded arguments.
	pub args: Vec<u8>,
}

impl EncodedCall {
	/// `module_index ++ call_index ++ args`.
	pub fn encode(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(2 + self.args.len());
		self.encode_to(&mut out);
		out
	}

	/// Append the call bytes to `out`.
	pub fn encode_to(&self, out: &mut Vec<u8>) {
		out.push(self.module_index);
		out.push(self.call_index);
		out.extend_from_slice(&self.args);
	}
}
