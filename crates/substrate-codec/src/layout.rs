// SPDX-License-Identifier: GPL-3.0

//! Wire layout hints.
//!
//! A Rust type describes its fields and variants in declaration order, while the chain describes
//! them in metadata order with metadata-assigned discriminants. Layout hints carry the metadata
//! view so the encoder and decoder can map between the two by name.

use crate::NamingPolicy;
use std::collections::BTreeMap;

/// Metadata view of a single struct or enum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeLayout {
	/// Field names in wire order.
	Struct(Vec<String>),
	/// Variants with their declared discriminants.
	Enum(Vec<VariantLayout>),
}

/// One alternative of an enum layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantLayout {
	/// Discriminant written on the wire.
	pub index: u8,
	/// Variant name as declared in metadata.
	pub name: String,
	/// Field names in wire order, for variants with named fields.
	pub fields: Vec<String>,
}

/// Set of layout hints used during a single encode or decode.
///
/// The root layout applies to the outermost value when it is a struct or an enum, whatever its
/// Rust name. It is dropped when the outermost value is a sequence, tuple or map.
/// Named layouts apply to every struct or enum whose Rust name matches under the active
/// [`NamingPolicy`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layouts {
	root: Option<TypeLayout>,
	named: BTreeMap<String, TypeLayout>,
}

pub(crate) static EMPTY: Layouts = Layouts::new();

impl Layouts {
	/// An empty set: declaration order everywhere.
	pub const fn new() -> Self {
		Self { root: None, named: BTreeMap::new() }
	}

	/// Set the layout of the outermost struct or enum.
	pub fn with_root(mut self, layout: TypeLayout) -> Self {
		self.root = Some(layout);
		self
	}

	/// Register the layout of the type called `name`.
	pub fn insert(&mut self, name: impl Into<String>, layout: TypeLayout) {
		self.named.insert(name.into(), layout);
	}

	/// Layout of the outermost struct or enum, if any.
	pub fn root(&self) -> Option<&TypeLayout> {
		self.root.as_ref()
	}

	/// Layout registered for `name` under `policy`.
	pub fn get(&self, name: &str, policy: NamingPolicy) -> Option<&TypeLayout> {
		self.named.get(name).or_else(|| {
			self.named
				.iter()
				.find(|(registered, _)| policy.equals(name, registered))
				.map(|(_, layout)| layout)
		})
	}

	/// Register the named layouts of `other` whose names are not registered yet.
	pub fn merge(&mut self, other: &Layouts) {
		for (name, layout) in &other.named {
			self.named.entry(name.clone()).or_insert_with(|| layout.clone());
		}
	}

	/// Whether no hint is registered at all.
	pub fn is_empty(&self) -> bool {
		self.root.is_none() && self.named.is_empty()
	}
}

impl TypeLayout {
	/// Variant declared with discriminant `index`.
	pub(crate) fn variant_by_index(&self, index: u8) -> Option<&VariantLayout> {
		match self {
			TypeLayout::Enum(variants) => variants.iter().find(|v| v.index == index),
			TypeLayout::Struct(_) => None,
		}
	}

	/// Variant whose name matches `name` under `policy`.
	pub(crate) fn variant_by_name(&self, name: &str, policy: NamingPolicy) -> Option<&VariantLayout> {
		match self {
			TypeLayout::Enum(variants) => variants.iter().find(|v| policy.equals(name, &v.name)),
			TypeLayout::Struct(_) => None,
		}
	}
}

/// Order the caller's `fields` by the wire order in `wire`.
///
/// Every wire field must match exactly one caller field under `policy`.
pub(crate) fn order_fields<'f>(
	wire: &[String],
	fields: &[&'f str],
	policy: NamingPolicy,
) -> Result<Vec<&'f str>, crate::Error> {
	wire.iter()
		.map(|name| {
			fields
				.iter()
				.copied()
				.find(|field| policy.equals(field, name))
				.ok_or_else(|| crate::Error::UnmatchedField { name: name.clone() })
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn named_layout_lookup_uses_policy() {
		let mut layouts = Layouts::new();
		layouts.insert("AccountInfo", TypeLayout::Struct(vec!["nonce".into()]));
		assert!(layouts.get("AccountInfo", NamingPolicy::Exact).is_some());
		assert!(layouts.get("account_info", NamingPolicy::Normalized).is_some());
		assert!(layouts.get("account_info", NamingPolicy::Exact).is_none());
	}

	#[test]
	fn merge_keeps_existing_names() {
		let mut layouts = Layouts::new().with_root(TypeLayout::Struct(vec!["dest".into()]));
		layouts.insert("Id", TypeLayout::Struct(vec!["a".into()]));
		let mut other = Layouts::new();
		other.insert("Id", TypeLayout::Struct(vec!["b".into()]));
		other.insert("Data", TypeLayout::Struct(vec!["c".into()]));
		layouts.merge(&other);
		assert_eq!(layouts.get("Id", NamingPolicy::Exact), Some(&TypeLayout::Struct(vec!["a".into()])));
		assert!(layouts.get("Data", NamingPolicy::Exact).is_some());
		assert!(layouts.root().is_some());
	}

	#[test]
	fn order_fields_follows_wire_order() -> Result<(), crate::Error> {
		let wire = vec!["free".to_string(), "reserved".to_string()];
		let ordered = order_fields(&wire, &["Reserved", "Free"], NamingPolicy::CaseInsensitive)?;
		assert_eq!(ordered, vec!["Free", "Reserved"]);
		Ok(())
	}

	#[test]
	fn order_fields_reports_unmatched_wire_field() {
		let wire = vec!["frozen".to_string()];
		assert_eq!(
			order_fields(&wire, &["free"], NamingPolicy::Normalized),
			Err(crate::Error::UnmatchedField { name: "frozen".into() })
		);
	}
}
