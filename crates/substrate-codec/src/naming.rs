// SPDX-License-Identifier: GPL-3.0

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Rule used to match caller-supplied names against metadata-declared names.
///
/// Two names are equal under a policy when their [`NamingPolicy::normalize`] forms are equal, so
/// name indices can be keyed by the normalized form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingPolicy {
	/// Names must be byte-for-byte identical.
	Exact,
	/// ASCII case is ignored.
	CaseInsensitive,
	/// ASCII case and the `_`, `-` and space separators are ignored, so `BlockHashCount`,
	/// `blockHashCount` and `block_hash_count` are all equal.
	#[default]
	Normalized,
}

impl NamingPolicy {
	/// Whether `caller` names the same item as `metadata`.
	pub fn equals(&self, caller: &str, metadata: &str) -> bool {
		match self {
			NamingPolicy::Exact => caller == metadata,
			NamingPolicy::CaseInsensitive => caller.eq_ignore_ascii_case(metadata),
			NamingPolicy::Normalized => self.normalize(caller) == self.normalize(metadata),
		}
	}

	/// Canonical form of `name` under this policy.
	pub fn normalize<'a>(&self, name: &'a str) -> Cow<'a, str> {
		match self {
			NamingPolicy::Exact => Cow::Borrowed(name),
			NamingPolicy::CaseInsensitive => Cow::Owned(name.to_ascii_lowercase()),
			NamingPolicy::Normalized => Cow::Owned(
				name.chars()
					.filter(|c| !matches!(c, '_' | '-' | ' '))
					.map(|c| c.to_ascii_lowercase())
					.collect(),
			),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn exact_policy_requires_identical_names() {
		assert!(NamingPolicy::Exact.equals("Babe", "Babe"));
		assert!(!NamingPolicy::Exact.equals("babe", "Babe"));
	}

	#[test]
	fn case_insensitive_policy_ignores_case_only() {
		let policy = NamingPolicy::CaseInsensitive;
		assert!(policy.equals("epochduration", "EpochDuration"));
		assert!(!policy.equals("epoch_duration", "EpochDuration"));
	}

	#[test]
	fn normalized_policy_ignores_case_and_separators() {
		let policy = NamingPolicy::Normalized;
		assert!(policy.equals("block_hash_count", "BlockHashCount"));
		assert!(policy.equals("transferAllowDeath", "transfer_allow_death"));
		assert!(!policy.equals("block_hash", "BlockHashCount"));
		assert_eq!(policy.normalize("Block_Hash-Count"), "blockhashcount");
	}

	#[test]
	fn normalize_agrees_with_equals() {
		for policy in [NamingPolicy::Exact, NamingPolicy::CaseInsensitive, NamingPolicy::Normalized] {
			for (a, b) in [("SS58Prefix", "ss58_prefix"), ("System", "system"), ("Account", "Account")] {
				assert_eq!(policy.equals(a, b), policy.normalize(a) == policy.normalize(b));
			}
		}
	}
}
